//! The read-only view of the session handed to UI consumers.

use crate::{
    option::DEFAULT_CHAIN_ID,
    sdk::{RawProvider, WalletBackend},
    session::Session,
    session_manager::{ConnectOutcome, SessionError, SessionManager},
};
use futures::future::LocalBoxFuture;
use std::marker::PhantomData;

/// What consumers may do with a wallet session: connect, disconnect and read it.
pub trait SessionContext {
    /// The SDK's raw provider type.
    type Provider: Clone;
    /// The RPC-wrapping provider type.
    type Rpc: Clone;

    /// See [`SessionManager::connect`].
    fn connect(&self) -> LocalBoxFuture<'_, Result<ConnectOutcome, SessionError>>;

    /// See [`SessionManager::disconnect`].
    fn disconnect(&self) -> LocalBoxFuture<'_, Result<(), SessionError>>;

    /// Returns a snapshot of the session.
    fn session(&self) -> Session<Self::Provider, Self::Rpc>;
}

impl<B: WalletBackend> SessionContext for SessionManager<B> {
    type Provider = RawProvider<B>;
    type Rpc = B::Rpc;

    fn connect(&self) -> LocalBoxFuture<'_, Result<ConnectOutcome, SessionError>> {
        Box::pin(SessionManager::connect(self))
    }

    fn disconnect(&self) -> LocalBoxFuture<'_, Result<(), SessionError>> {
        Box::pin(SessionManager::disconnect(self))
    }

    fn session(&self) -> Session<RawProvider<B>, B::Rpc> {
        SessionManager::session(self)
    }
}

/// The session seen by consumers rendered before any [`SessionManager`] exists.
///
/// `connect` resolves to [`ConnectOutcome::Unavailable`], `disconnect` resolves to `Ok(())`,
/// and the session is disconnected on the default chain.
#[derive(Debug, Clone, Copy)]
pub struct DetachedSession<P, R> {
    chain_id: u64,
    _marker: PhantomData<fn() -> (P, R)>,
}

impl<P, R> DetachedSession<P, R> {
    /// A detached session reporting `chain_id`.
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            _marker: PhantomData,
        }
    }
}

impl<P, R> Default for DetachedSession<P, R> {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl<P: Clone, R: Clone> SessionContext for DetachedSession<P, R> {
    type Provider = P;
    type Rpc = R;

    fn connect(&self) -> LocalBoxFuture<'_, Result<ConnectOutcome, SessionError>> {
        Box::pin(async { Ok(ConnectOutcome::Unavailable) })
    }

    fn disconnect(&self) -> LocalBoxFuture<'_, Result<(), SessionError>> {
        Box::pin(async { Ok(()) })
    }

    fn session(&self) -> Session<P, R> {
        Session::disconnected(self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::mock::{MockBackend, MockProvider};

    async fn connect_and_read<C: SessionContext>(context: &C) -> (ConnectOutcome, String) {
        let outcome = context.connect().await.unwrap();
        (outcome, context.session().address)
    }

    #[tokio::test]
    async fn test_detached_session_defaults() {
        let detached = DetachedSession::<u32, ()>::default();

        let (outcome, address) = connect_and_read(&detached).await;

        assert_eq!(outcome, ConnectOutcome::Unavailable);
        assert_eq!(address, "");
        assert_eq!(detached.disconnect().await, Ok(()));
        let session = detached.session();
        assert_eq!(session.chain_id, DEFAULT_CHAIN_ID);
        assert!(!session.loading);
        assert!(session.raw_provider.is_none());
    }

    #[tokio::test]
    async fn test_manager_behind_context() {
        let backend = MockBackend::default();
        backend.state.login(MockProvider(9));
        let manager = SessionManager::new(backend.clone()).unwrap();
        manager.initialize().await.unwrap();

        let (outcome, address) = connect_and_read(&manager).await;

        // Initialization already promoted the session.
        assert_eq!(outcome, ConnectOutcome::AlreadyConnected);
        assert_eq!(address, "0xABC");
    }
}
