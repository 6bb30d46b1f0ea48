//! The connection controller.
//!
//! [`SessionManager`] owns the wallet SDK handle, drives its one-time initialization and
//! exposes [`connect`](SessionManager::connect) / [`disconnect`](SessionManager::disconnect).
//! Two watchers promote an idle session once the user completes login inside the widget:
//! [`watch_provider`](SessionManager::watch_provider), which reacts to a changed provider
//! reference, and a cancellable poll that retries every
//! [`poll_interval`](crate::SessionManagerOptions::poll_interval) until an address is present.

use crate::{
    option::{ConfigError, SessionManagerOptions},
    sdk::{RawProvider, RpcProvider, SdkError, WalletBackend, WalletSdk},
    session::{Session, SessionStore},
    util::sleep::{sleep, spawn_local},
};
use futures::{
    future::{AbortHandle, Abortable},
    lock::Mutex as FutureMutex,
};
use parking_lot::Mutex;
use std::{
    fmt,
    sync::{Arc, Weak},
    time::Duration,
};
use thiserror::Error;
use tokio::sync::watch;
#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// The error type for session operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The options handed to the manager are invalid.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The SDK handle could not be initialized. No handle is kept; the next
    /// [`SessionManager::connect`] builds a fresh one.
    #[error("Wallet SDK initialization failed: {0}")]
    Init(#[source] SdkError),
    /// A logout was requested without an initialized SDK session.
    #[error("Wallet SDK not initialized")]
    NotInitialized,
    /// The SDK or the wrapped provider failed mid-operation.
    #[error("Wallet SDK error: {0}")]
    Sdk(#[from] SdkError),
}

/// The logical state of the connection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No SDK handle yet.
    Uninitialized,
    /// SDK handle construction and remote initialization are in flight.
    Initializing,
    /// The SDK handle is ready and no account is connected.
    Idle,
    /// A connect is in flight.
    Connecting,
    /// An account is connected.
    Connected,
    /// A logout is in flight.
    Disconnecting,
}

/// What a call to [`SessionManager::connect`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// An account was already connected; nothing was touched.
    AlreadyConnected,
    /// The SDK has no provider yet, so the wallet widget was shown. The session is promoted
    /// later by the watchers once login completes.
    WalletShown,
    /// A session was established.
    Connected {
        /// The signer's address.
        address: String,
        /// The chain id reported by the network.
        chain_id: u64,
    },
    /// No session manager is available (see [`DetachedSession`](crate::DetachedSession)).
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Initializing,
    Connecting,
    Disconnecting,
}

pub(crate) struct SessionManagerInner<B: WalletBackend> {
    backend: B,
    options: SessionManagerOptions,
    store: SessionStore<RawProvider<B>, B::Rpc>,
    sdk: Mutex<Option<Arc<B::Sdk>>>,
    /// Serializes initialize, connect and disconnect.
    operation: FutureMutex<()>,
    in_flight: Mutex<Option<Operation>>,
    /// The provider reference the watchers saw last.
    last_provider: Mutex<Option<RawProvider<B>>>,
    poll: Mutex<Option<AbortHandle>>,
}

impl<B: WalletBackend> Drop for SessionManagerInner<B> {
    fn drop(&mut self) {
        if let Some(poll) = self.poll.get_mut().take() {
            poll.abort();
        }
    }
}

/// Marks an operation as in flight and clears the marker and the busy flag on every exit path.
struct OperationGuard<'a, B: WalletBackend> {
    inner: &'a SessionManagerInner<B>,
}

impl<B: WalletBackend> Drop for OperationGuard<'_, B> {
    fn drop(&mut self) {
        self.inner.in_flight.lock().take();
        self.inner.store.set_loading(false);
    }
}

/// The tool for managing the wallet session.
///
/// It is constructed once when the application boots and handed to every consumer; clones
/// share the same SDK handle and session.
pub struct SessionManager<B: WalletBackend>(Arc<SessionManagerInner<B>>);

impl<B: WalletBackend> Clone for SessionManager<B> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<B: WalletBackend> fmt::Debug for SessionManager<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("address", &self.address())
            .field("chain_id", &self.chain_id())
            .field("options", &self.0.options)
            .finish()
    }
}

impl<B: WalletBackend> SessionManager<B> {
    /// Creates a new [`SessionManager`] with default options.
    pub fn new(backend: B) -> Result<Self, SessionError> {
        Self::new_with_options(backend, SessionManagerOptions::default())
    }

    /// Creates a new [`SessionManager`] with the provided options.
    ///
    /// Nothing is started; call [`start`](Self::start) once the event loop is running.
    pub fn new_with_options(
        backend: B,
        options: SessionManagerOptions,
    ) -> Result<Self, SessionError> {
        options.validate()?;

        Ok(Self(Arc::new(SessionManagerInner {
            store: SessionStore::new(options.default_chain_id),
            backend,
            options,
            sdk: Mutex::new(None),
            operation: FutureMutex::new(()),
            in_flight: Mutex::new(None),
            last_provider: Mutex::new(None),
            poll: Mutex::new(None),
        })))
    }

    /// Starts the auto-connect poll and initializes the SDK handle.
    ///
    /// The poll keeps running even if initialization fails.
    pub async fn start(&self) -> Result<(), SessionError> {
        self.spawn_poll();
        self.initialize().await
    }

    /// Constructs and initializes the SDK handle unless one exists.
    ///
    /// A failed initialization is not retried here. Once the handle exists this returns `Ok`;
    /// a failed auto-connect attempt that follows is handed to the `on_error` callback.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        {
            let _operation = self.0.operation.lock().await;
            if self.sdk().is_some() {
                return Ok(());
            }

            let _guard = self.begin(Operation::Initializing, false);
            let sdk = self.create_sdk().await?;
            *self.0.sdk.lock() = Some(sdk);
        }

        if self.0.options.auto_connect {
            if let Err(e) = self.watch_provider().await {
                self.report(e);
            }
        }
        Ok(())
    }

    /// Initiates or resumes a connection.
    ///
    /// - Already connected: returns [`ConnectOutcome::AlreadyConnected`] without touching
    ///   the SDK.
    /// - The SDK exposes a provider: wraps it, queries the signer address and the chain id,
    ///   and commits a connected session.
    /// - The SDK has no provider yet: shows the wallet widget.
    /// - There is no SDK handle: builds and initializes one, then shows the widget.
    pub async fn connect(&self) -> Result<ConnectOutcome, SessionError> {
        if self.is_connected() {
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        let _operation = self.0.operation.lock().await;
        // Another connect may have finished while this one waited.
        if self.is_connected() {
            return Ok(ConnectOutcome::AlreadyConnected);
        }

        match self.sdk() {
            Some(sdk) => match sdk.provider() {
                Some(provider) => self.establish(&sdk, provider).await,
                None => {
                    sdk.show_wallet();
                    Ok(ConnectOutcome::WalletShown)
                }
            },
            None => {
                let _guard = self.begin(Operation::Initializing, true);
                let sdk = self.create_sdk().await?;
                sdk.show_wallet();
                *self.0.sdk.lock() = Some(sdk);
                Ok(ConnectOutcome::WalletShown)
            }
        }
    }

    /// Terminates the session: logs out of the SDK, resets the session to the disconnected
    /// defaults and hides the widget. The auto-connect poll is restarted afterwards.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        {
            let _operation = self.0.operation.lock().await;
            let sdk = match self.sdk() {
                Some(sdk) if sdk.has_auth_state() => sdk,
                _ => {
                    #[cfg(feature = "tracing")]
                    error!("Wallet SDK not initialized.");
                    return Err(SessionError::NotInitialized);
                }
            };

            let _guard = self.begin(Operation::Disconnecting, true);
            sdk.logout().await?;
            self.0.last_provider.lock().take();
            self.0.store.reset();
            sdk.hide_wallet();

            #[cfg(feature = "tracing")]
            info!("Wallet disconnected");
        }

        self.spawn_poll();
        Ok(())
    }

    /// Connects if the SDK's provider reference changed since it was last observed and no
    /// account is connected.
    ///
    /// Runs after initialization; call it as well whenever the embedding application learns
    /// that the widget's login state may have changed.
    pub async fn watch_provider(&self) -> Result<Option<ConnectOutcome>, SessionError> {
        let Some(sdk) = self.sdk() else {
            return Ok(None);
        };

        let current = sdk.provider();
        let changed = {
            let mut last = self.0.last_provider.lock();
            if *last == current {
                false
            } else {
                *last = current.clone();
                true
            }
        };

        if changed && current.is_some() && !self.is_connected() {
            return self.connect().await.map(Some);
        }
        Ok(None)
    }

    /// Stops the auto-connect poll. A later [`disconnect`](Self::disconnect) starts it again.
    pub fn shutdown(&self) {
        if let Some(poll) = self.0.poll.lock().take() {
            poll.abort();
        }
    }

    /// Returns the logical state of the controller.
    pub fn state(&self) -> ConnectionState {
        match *self.0.in_flight.lock() {
            Some(Operation::Initializing) => return ConnectionState::Initializing,
            Some(Operation::Connecting) => return ConnectionState::Connecting,
            Some(Operation::Disconnecting) => return ConnectionState::Disconnecting,
            None => {}
        }

        if self.sdk().is_none() {
            ConnectionState::Uninitialized
        } else if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Idle
        }
    }

    /// Returns a snapshot of the session.
    pub fn session(&self) -> Session<RawProvider<B>, B::Rpc> {
        self.0.store.snapshot()
    }

    /// Returns a receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session<RawProvider<B>, B::Rpc>> {
        self.0.store.subscribe()
    }

    /// Returns the connected address, or an empty string.
    pub fn address(&self) -> String {
        self.0.store.address()
    }

    /// Returns the active chain id, or the default chain id while disconnected.
    pub fn chain_id(&self) -> u64 {
        self.0.store.snapshot().chain_id
    }

    /// Returns `true` while a connect or disconnect is in flight.
    pub fn loading(&self) -> bool {
        self.0.store.loading()
    }

    /// Returns `true` if an account is connected.
    pub fn is_connected(&self) -> bool {
        self.0.store.is_connected()
    }

    /// Returns the SDK's raw provider of the connected session.
    pub fn raw_provider(&self) -> Option<RawProvider<B>> {
        self.0.store.snapshot().raw_provider
    }

    /// Returns the RPC-wrapping provider of the connected session.
    pub fn rpc_provider(&self) -> Option<B::Rpc> {
        self.0.store.snapshot().rpc_provider
    }

    /// Returns the SDK handle, if one has been initialized.
    pub fn sdk(&self) -> Option<Arc<B::Sdk>> {
        self.0.sdk.lock().clone()
    }

    /// Returns the options of this manager.
    pub fn options(&self) -> &SessionManagerOptions {
        &self.0.options
    }

    fn begin(&self, operation: Operation, loading: bool) -> OperationGuard<'_, B> {
        *self.0.in_flight.lock() = Some(operation);
        if loading {
            self.0.store.set_loading(true);
        }
        OperationGuard { inner: &self.0 }
    }

    async fn create_sdk(&self) -> Result<Arc<B::Sdk>, SessionError> {
        let sdk = self.0.backend.create_sdk();
        if let Err(e) = sdk.init(&self.0.options.sdk_config).await {
            #[cfg(feature = "tracing")]
            error!("Wallet SDK initialization failed: {}", e);
            return Err(SessionError::Init(e));
        }

        #[cfg(feature = "tracing")]
        debug!(
            "Wallet SDK initialized for chain {} ({})",
            self.0.options.sdk_config.chain_id_hex(),
            self.0.options.sdk_config.network
        );
        Ok(Arc::new(sdk))
    }

    /// Wraps the provider, queries the account and commits a connected session.
    async fn establish(
        &self,
        sdk: &B::Sdk,
        provider: RawProvider<B>,
    ) -> Result<ConnectOutcome, SessionError> {
        let _guard = self.begin(Operation::Connecting, true);

        let rpc = self.0.backend.wrap_provider(&provider);
        let address = rpc.signer_address().await?;
        if address.is_empty() {
            return Err(SdkError::Rpc("signer returned no address".to_string()).into());
        }
        let chain_id = rpc.chain_id().await?;

        *self.0.last_provider.lock() = Some(provider.clone());
        self.0.store.replace(Session::connected(
            provider,
            rpc,
            address.clone(),
            chain_id,
        ));
        // Login is complete, the widget has nothing left to show.
        sdk.hide_wallet();

        #[cfg(feature = "tracing")]
        info!("Wallet connected: {} on chain {}", address, chain_id);

        if let Some(on_connect) = &self.0.options.on_connect {
            on_connect.call(address.clone(), chain_id);
        }

        Ok(ConnectOutcome::Connected { address, chain_id })
    }

    /// Starts the auto-connect poll unless it is running or auto-connect is disabled.
    fn spawn_poll(&self) {
        if !self.0.options.auto_connect {
            return;
        }

        let mut poll = self.0.poll.lock();
        if poll.is_some() {
            return;
        }

        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        let task = Abortable::new(
            Self::poll_provider(Arc::downgrade(&self.0), self.0.options.poll_interval),
            abort_registration,
        );
        spawn_local(async {
            let _ = task.await;
        });
        *poll = Some(abort_handle);
    }

    /// Connects whenever the SDK exposes a provider, until an address is present or the
    /// manager is gone.
    async fn poll_provider(inner: Weak<SessionManagerInner<B>>, interval: Duration) {
        loop {
            sleep(interval).await;

            let Some(inner) = inner.upgrade() else {
                break;
            };
            let manager = SessionManager(inner);

            if manager.is_connected() {
                manager.0.poll.lock().take();
                break;
            }

            let has_provider = manager
                .sdk()
                .and_then(|sdk| sdk.provider())
                .is_some();
            if has_provider {
                if let Err(e) = manager.connect().await {
                    manager.report(e);
                }
            }
        }
    }

    /// Hands a failure nobody awaits to the log and the `on_error` callback.
    pub(crate) fn report(&self, error: SessionError) {
        #[cfg(feature = "tracing")]
        warn!("Background session operation failed: {}", error);
        if let Some(on_error) = &self.0.options.on_error {
            on_error.call(error);
        }
    }
}
