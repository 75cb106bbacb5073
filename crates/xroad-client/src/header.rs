//! Per-client header state behind a lock.

use parking_lot::Mutex;
use serde_json::{Map, Value};
use xroad_core::{HeaderState, MemberIdentity};

/// The header state of one client instance.
///
/// Every call takes a snapshot, so concurrent requests on the same client
/// never see each other's minted ids. Setters and per-call overrides update
/// the shared state and apply to later calls.
#[derive(Debug)]
pub struct SharedHeader {
    client: MemberIdentity,
    service: MemberIdentity,
    state: Mutex<HeaderState>,
}

impl SharedHeader {
    /// Wraps an initial header state.
    pub fn new(state: HeaderState) -> Self {
        Self {
            client: state.client().clone(),
            service: state.service().clone(),
            state: Mutex::new(state),
        }
    }

    /// Client identity.
    pub fn client(&self) -> &MemberIdentity {
        &self.client
    }

    /// Service identity.
    pub fn service(&self) -> &MemberIdentity {
        &self.service
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> HeaderState {
        self.state.lock().clone()
    }

    /// Removes the override keys from `args`, applies them and returns the
    /// state to use for this call.
    pub fn prepare_call(&self, args: &mut Map<String, Value>) -> HeaderState {
        let mut state = self.state.lock();
        state.apply_overrides(args);
        state.clone()
    }

    /// Runs `f` on the locked state.
    pub fn update<R>(&self, f: impl FnOnce(&mut HeaderState) -> R) -> R {
        f(&mut self.state.lock())
    }
}
