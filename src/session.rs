//! The session store: the current wallet connection and its busy flag.
//!
//! Transitions replace the whole [`Session`] record; consumers only ever see complete
//! snapshots, either by reading [`SessionStore::snapshot`] or by holding a receiver from
//! [`SessionStore::subscribe`].

use tokio::sync::watch;

/// A snapshot of the wallet connection.
///
/// `rpc_provider` is present if and only if `raw_provider` is present and `address` is
/// non-empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Session<P, R> {
    /// The SDK's low-level provider.
    pub raw_provider: Option<P>,
    /// The higher-level provider wrapping `raw_provider`.
    pub rpc_provider: Option<R>,
    /// The connected account, or an empty string.
    pub address: String,
    /// The active chain id, or the default chain id while disconnected.
    pub chain_id: u64,
    /// `true` while a connect or disconnect operation is in flight.
    pub loading: bool,
}

impl<P, R> Session<P, R> {
    /// A session with no wallet attached.
    pub fn disconnected(chain_id: u64) -> Self {
        Self {
            raw_provider: None,
            rpc_provider: None,
            address: String::new(),
            chain_id,
            loading: false,
        }
    }

    /// A fully connected session.
    pub fn connected(raw_provider: P, rpc_provider: R, address: String, chain_id: u64) -> Self {
        Self {
            raw_provider: Some(raw_provider),
            rpc_provider: Some(rpc_provider),
            address,
            chain_id,
            loading: false,
        }
    }

    /// Returns `true` if an account is connected.
    pub fn is_connected(&self) -> bool {
        !self.address.is_empty()
    }
}

/// Holds the current [`Session`] and publishes every change to subscribers.
#[derive(Debug)]
pub struct SessionStore<P, R> {
    sender: watch::Sender<Session<P, R>>,
    default_chain_id: u64,
}

impl<P: Clone, R: Clone> SessionStore<P, R> {
    /// Creates a store holding a disconnected session on `default_chain_id`.
    pub fn new(default_chain_id: u64) -> Self {
        let (sender, _) = watch::channel(Session::disconnected(default_chain_id));
        Self {
            sender,
            default_chain_id,
        }
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> Session<P, R> {
        self.sender.borrow().clone()
    }

    /// Returns a receiver that observes every published session.
    pub fn subscribe(&self) -> watch::Receiver<Session<P, R>> {
        self.sender.subscribe()
    }

    /// The chain id reported while disconnected.
    pub fn default_chain_id(&self) -> u64 {
        self.default_chain_id
    }

    /// Returns the connected address, or an empty string.
    pub fn address(&self) -> String {
        self.sender.borrow().address.clone()
    }

    /// Returns `true` if an account is connected.
    pub fn is_connected(&self) -> bool {
        self.sender.borrow().is_connected()
    }

    /// Returns the busy flag.
    pub fn loading(&self) -> bool {
        self.sender.borrow().loading
    }

    /// Replaces the whole session.
    pub fn replace(&self, session: Session<P, R>) {
        self.sender.send_replace(session);
    }

    /// Replaces the session with the disconnected defaults.
    pub fn reset(&self) {
        self.replace(Session::disconnected(self.default_chain_id));
    }

    /// Publishes a copy of the session with the busy flag set, only if the flag changed.
    pub fn set_loading(&self, loading: bool) {
        let mut session = self.snapshot();
        if session.loading == loading {
            return;
        }
        session.loading = loading;
        self.replace(session);
    }
}
