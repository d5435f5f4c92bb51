//! Lifecycle hooks: an ordered list of observers invoked around every
//! request. Hooks are assembled once at startup and passed through
//! [`crate::state::AppState`]; there is no global registry and no runtime
//! instantiation by name. Hooks observe requests, responses and error
//! responses for logging/auditing and cannot alter the engine's decision.

use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::{Method, StatusCode};
use log::{debug, warn};
use std::sync::Arc;

/// The request attributes handed to every hook.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
}

/// An observer of the request lifecycle. All methods default to no-ops so
/// a hook only implements the events it cares about.
pub trait LifecycleHook: Send + Sync {
    /// Invoked on every inbound request before routing
    fn on_request(&self, _request: &RequestInfo) {}

    /// Invoked on every outgoing response
    fn on_response(&self, _request: &RequestInfo, _status: StatusCode) {}

    /// Invoked additionally when the response is an error
    fn on_failure(&self, _request: &RequestInfo, _status: StatusCode) {}
}

/// The ordered hook chain. Hooks run in registration order for every
/// event.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    hooks: Arc<Vec<Arc<dyn LifecycleHook>>>,
}

impl LifecycleHooks {
    pub fn new(hooks: Vec<Arc<dyn LifecycleHook>>) -> Self {
        Self {
            hooks: Arc::new(hooks),
        }
    }

    /// The default chain: a request logger.
    pub fn standard() -> Self {
        Self::new(vec![Arc::new(RequestLogHook)])
    }

    pub(crate) fn notify_request(&self, request: &RequestInfo) {
        for hook in self.hooks.iter() {
            hook.on_request(request);
        }
    }

    pub(crate) fn notify_response(&self, request: &RequestInfo, status: StatusCode) {
        for hook in self.hooks.iter() {
            hook.on_response(request, status);
        }
    }

    pub(crate) fn notify_failure(&self, request: &RequestInfo, status: StatusCode) {
        for hook in self.hooks.iter() {
            hook.on_failure(request, status);
        }
    }
}

/// Built-in hook logging every request and flagging error responses.
pub struct RequestLogHook;

impl LifecycleHook for RequestLogHook {
    fn on_request(&self, request: &RequestInfo) {
        debug!("--> {} {}", request.method, request.path);
    }

    fn on_response(&self, request: &RequestInfo, status: StatusCode) {
        debug!("<-- {} {} {}", request.method, request.path, status);
    }

    fn on_failure(&self, request: &RequestInfo, status: StatusCode) {
        warn!(
            "request failed: {} {} -> {}",
            request.method, request.path, status
        );
    }
}

/// Axum middleware driving the hook chain around every routed request.
pub async fn lifecycle_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let info = RequestInfo {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
    };

    state.hooks.notify_request(&info);
    let response = next.run(request).await;
    state.hooks.notify_response(&info, response.status());
    if response.status().is_client_error() || response.status().is_server_error() {
        state.hooks.notify_failure(&info, response.status());
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        requests: AtomicUsize,
        responses: AtomicUsize,
        failures: AtomicUsize,
    }

    impl LifecycleHook for CountingHook {
        fn on_request(&self, _request: &RequestInfo) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn on_response(&self, _request: &RequestInfo, _status: StatusCode) {
            self.responses.fetch_add(1, Ordering::SeqCst);
        }

        fn on_failure(&self, _request: &RequestInfo, _status: StatusCode) {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Records the order hooks fire in, to pin down chain ordering.
    struct OrderedHook {
        id: usize,
        order: Arc<std::sync::Mutex<Vec<usize>>>,
    }

    impl LifecycleHook for OrderedHook {
        fn on_request(&self, _request: &RequestInfo) {
            self.order.lock().unwrap().push(self.id);
        }
    }

    fn test_request_info() -> RequestInfo {
        RequestInfo {
            method: Method::GET,
            path: "/oauth20/token/validate".to_string(),
        }
    }

    #[test]
    fn test_hooks_receive_all_events() {
        let hook = Arc::new(CountingHook::default());
        let hooks = LifecycleHooks::new(vec![hook.clone()]);
        let info = test_request_info();

        hooks.notify_request(&info);
        hooks.notify_response(&info, StatusCode::OK);
        hooks.notify_failure(&info, StatusCode::BAD_REQUEST);

        assert_eq!(hook.requests.load(Ordering::SeqCst), 1);
        assert_eq!(hook.responses.load(Ordering::SeqCst), 1);
        assert_eq!(hook.failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let hooks = LifecycleHooks::new(vec![
            Arc::new(OrderedHook {
                id: 1,
                order: order.clone(),
            }),
            Arc::new(OrderedHook {
                id: 2,
                order: order.clone(),
            }),
            Arc::new(OrderedHook {
                id: 3,
                order: order.clone(),
            }),
        ]);

        hooks.notify_request(&test_request_info());
        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
    }
}
