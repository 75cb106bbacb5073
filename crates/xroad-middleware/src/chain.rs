//! Ordered interceptor chain.

use std::sync::Arc;

use http::HeaderMap;
use tracing::trace;
use xroad_core::xml::Element;

use crate::interceptor::{BindingOptions, Interceptor};

/// A shareable interceptor.
pub type BoxedInterceptor = Arc<dyn Interceptor>;

/// Interceptors in registration order.
///
/// Egress runs first to last; ingress runs last to first, so the interceptor
/// closest to the wire sees responses first.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<BoxedInterceptor>,
}

impl InterceptorChain {
    /// An empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor.
    #[must_use]
    pub fn with(mut self, interceptor: impl Interceptor) -> Self {
        self.push(Arc::new(interceptor));
        self
    }

    /// Appends a shared interceptor.
    pub fn push(&mut self, interceptor: BoxedInterceptor) {
        self.interceptors.push(interceptor);
    }

    /// Number of registered interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptor names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Runs every egress hook.
    pub fn egress(&self, envelope: &mut Element, headers: &mut HeaderMap, binding: &mut BindingOptions) {
        for interceptor in &self.interceptors {
            trace!(interceptor = interceptor.name(), "egress");
            interceptor.egress(envelope, headers, binding);
        }
    }

    /// Runs every ingress hook in reverse order.
    pub fn ingress(&self, envelope: &mut Element, headers: &HeaderMap) {
        for interceptor in self.interceptors.iter().rev() {
            trace!(interceptor = interceptor.name(), "ingress");
            interceptor.ingress(envelope, headers);
        }
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("interceptors", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Interceptor for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        fn egress(&self, _envelope: &mut Element, _headers: &mut HeaderMap, _binding: &mut BindingOptions) {
            self.log.lock().push(format!("egress:{}", self.name));
        }

        fn ingress(&self, _envelope: &mut Element, _headers: &HeaderMap) {
            self.log.lock().push(format!("ingress:{}", self.name));
        }
    }

    struct Passive;

    impl Interceptor for Passive {
        fn name(&self) -> &'static str {
            "passive"
        }
    }

    #[test]
    fn test_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = InterceptorChain::new()
            .with(Recording { name: "a", log: log.clone() })
            .with(Recording { name: "b", log: log.clone() });

        let mut envelope = Element::new("Envelope");
        chain.egress(&mut envelope, &mut HeaderMap::new(), &mut BindingOptions::default());
        chain.ingress(&mut envelope, &HeaderMap::new());

        assert_eq!(*log.lock(), ["egress:a", "egress:b", "ingress:b", "ingress:a"]);
        assert_eq!(chain.names(), ["a", "b"]);
    }

    #[test]
    fn test_default_hooks_pass_through() {
        let chain = InterceptorChain::new().with(Passive);
        let mut envelope = Element::new("Envelope").with_child(Element::new("Body").with_text("x"));
        let before = envelope.clone();
        let mut binding = BindingOptions::with_address("http://a");

        chain.egress(&mut envelope, &mut HeaderMap::new(), &mut binding);
        chain.ingress(&mut envelope, &HeaderMap::new());

        assert_eq!(envelope, before);
        assert_eq!(binding.address.as_deref(), Some("http://a"));
    }
}
