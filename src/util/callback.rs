//! Callbacks fired by the session manager when background work settles.

use crate::session_manager::SessionError;
use parking_lot::Mutex;
use std::sync::Arc;

pub(crate) type OnConnectInner = Box<dyn FnMut(String, u64) + Send>;

/// The callback executed once a wallet session is established.
///
/// It receives the connected address and the chain id reported by the network.
///
/// # Usage
/// ```
/// use social_login_session::callback::OnConnect;
///
/// let on_connect = OnConnect::from(|address: String, chain_id: u64| {
///     // Update the UI
/// });
/// ```
#[derive(Clone)]
pub struct OnConnect(pub(crate) Arc<Mutex<OnConnectInner>>);

impl OnConnect {
    pub(crate) fn call(&self, address: String, chain_id: u64) {
        (self.0.lock())(address, chain_id);
    }
}

impl<F> From<F> for OnConnect
where
    F: FnMut(String, u64) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnConnect(Arc::new(Mutex::new(Box::new(f))))
    }
}

pub(crate) type OnErrorInner = Box<dyn FnMut(SessionError) + Send>;

/// The callback executed when a connection attempt nobody awaits fails,
/// e.g. one started by the auto-connect watchers.
///
/// # Usage
/// ```
/// use social_login_session::{callback::OnError, SessionError};
///
/// let on_error = OnError::from(|err: SessionError| {
///     // Report the failure
/// });
/// ```
#[derive(Clone)]
pub struct OnError(pub(crate) Arc<Mutex<OnErrorInner>>);

impl OnError {
    pub(crate) fn call(&self, error: SessionError) {
        (self.0.lock())(error);
    }
}

impl<F> From<F> for OnError
where
    F: FnMut(SessionError) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnError(Arc::new(Mutex::new(Box::new(f))))
    }
}
