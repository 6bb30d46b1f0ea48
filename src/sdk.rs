//! The contract consumed from the embedded social-login wallet SDK.
//!
//! The SDK is an opaque capability: it is initialized once with an [`SdkInitConfig`], can show
//! or hide its wallet widget, and exposes a low-level provider once the user finished logging in
//! inside the widget. It offers no reliable "logged in" event, which is why the
//! [`SessionManager`](crate::SessionManager) watches [`WalletSdk::provider`] instead.

use crate::option::SdkInitConfig;
use futures::future::LocalBoxFuture;
use thiserror::Error;

#[cfg(all(feature = "wasm-js", target_family = "wasm"))]
pub mod wasm_js;

/// Futures returned by the SDK traits. The SDK lives on a single-threaded event loop, so these
/// are not required to be `Send`.
pub type SdkFuture<'a, T> = LocalBoxFuture<'a, T>;

/// The raw provider type exposed by a backend's SDK.
pub type RawProvider<B> = <<B as WalletBackend>::Sdk as WalletSdk>::Provider;

/// Errors reported by the wallet SDK or the RPC-wrapping provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// The remote initialization call rejected.
    #[error("Initialization failed: {0}")]
    Init(String),
    /// The logout call rejected.
    #[error("Logout failed: {0}")]
    Logout(String),
    /// A signer or network query against the provider failed.
    #[error("RPC request failed: {0}")]
    Rpc(String),
}

/// A handle to the embedded wallet SDK.
pub trait WalletSdk {
    /// The low-level request/response transport exposed after login.
    ///
    /// Equality must mean "same provider reference": the session manager connects again
    /// whenever the value it observes changes.
    type Provider: Clone + PartialEq + 'static;

    /// Initializes the SDK handle with the chain id, network tier and allow-list.
    fn init<'a>(&'a self, config: &'a SdkInitConfig) -> SdkFuture<'a, Result<(), SdkError>>;

    /// Makes the wallet widget visible.
    fn show_wallet(&self);

    /// Hides the wallet widget.
    fn hide_wallet(&self);

    /// Ends the SDK-side session.
    fn logout(&self) -> SdkFuture<'_, Result<(), SdkError>>;

    /// Returns the provider if the user has completed login inside the widget.
    fn provider(&self) -> Option<Self::Provider>;

    /// Returns `true` if the SDK holds the internal auth state a logout needs.
    fn has_auth_state(&self) -> bool;
}

/// A higher-level provider wrapping the SDK's raw provider.
pub trait RpcProvider: Clone + 'static {
    /// Queries the address of the provider's signer.
    fn signer_address(&self) -> SdkFuture<'_, Result<String, SdkError>>;

    /// Queries the chain id of the network the provider is connected to.
    fn chain_id(&self) -> SdkFuture<'_, Result<u64, SdkError>>;
}

/// The vendor stack behind a session: how SDK handles are built and how their raw providers
/// are wrapped.
pub trait WalletBackend: 'static {
    /// The SDK handle type.
    type Sdk: WalletSdk + 'static;
    /// The RPC-wrapping provider type.
    type Rpc: RpcProvider;

    /// Constructs a fresh, uninitialized SDK handle.
    fn create_sdk(&self) -> Self::Sdk;

    /// Wraps a raw provider for signer and network queries.
    fn wrap_provider(&self, provider: &RawProvider<Self>) -> Self::Rpc;
}

#[cfg(test)]
pub(crate) mod mock {
    //! A recording backend for tests.

    use super::*;
    use parking_lot::Mutex;
    use std::sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MockProvider(pub u32);

    #[derive(Debug)]
    pub struct MockState {
        pub sdks_created: AtomicUsize,
        pub init_calls: AtomicUsize,
        pub show_calls: AtomicUsize,
        pub hide_calls: AtomicUsize,
        pub logout_calls: AtomicUsize,
        pub address_queries: AtomicUsize,
        pub provider_reads: AtomicUsize,
        pub fail_init: AtomicBool,
        pub fail_rpc: AtomicBool,
        pub auth_state: AtomicBool,
        pub chain_id: AtomicU64,
        pub address: Mutex<String>,
        pub provider: Mutex<Option<MockProvider>>,
        pub last_config: Mutex<Option<SdkInitConfig>>,
    }

    impl Default for MockState {
        fn default() -> Self {
            Self {
                sdks_created: AtomicUsize::new(0),
                init_calls: AtomicUsize::new(0),
                show_calls: AtomicUsize::new(0),
                hide_calls: AtomicUsize::new(0),
                logout_calls: AtomicUsize::new(0),
                address_queries: AtomicUsize::new(0),
                provider_reads: AtomicUsize::new(0),
                fail_init: AtomicBool::new(false),
                fail_rpc: AtomicBool::new(false),
                auth_state: AtomicBool::new(true),
                chain_id: AtomicU64::new(137),
                address: Mutex::new("0xABC".to_string()),
                provider: Mutex::new(None),
                last_config: Mutex::new(None),
            }
        }
    }

    impl MockState {
        pub fn count(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }

        /// Simulates the user finishing login inside the widget.
        pub fn login(&self, provider: MockProvider) {
            *self.provider.lock() = Some(provider);
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct MockBackend {
        pub state: Arc<MockState>,
    }

    #[derive(Debug)]
    pub struct MockSdk {
        state: Arc<MockState>,
    }

    #[derive(Debug, Clone)]
    pub struct MockRpc {
        pub raw: MockProvider,
        state: Arc<MockState>,
    }

    impl WalletSdk for MockSdk {
        type Provider = MockProvider;

        fn init<'a>(&'a self, config: &'a SdkInitConfig) -> SdkFuture<'a, Result<(), SdkError>> {
            Box::pin(async move {
                self.state.init_calls.fetch_add(1, Ordering::SeqCst);
                *self.state.last_config.lock() = Some(config.clone());
                tokio::task::yield_now().await;
                if self.state.fail_init.load(Ordering::SeqCst) {
                    return Err(SdkError::Init("whitelist rejected".to_string()));
                }
                Ok(())
            })
        }

        fn show_wallet(&self) {
            self.state.show_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn hide_wallet(&self) {
            self.state.hide_calls.fetch_add(1, Ordering::SeqCst);
        }

        fn logout(&self) -> SdkFuture<'_, Result<(), SdkError>> {
            Box::pin(async move {
                self.state.logout_calls.fetch_add(1, Ordering::SeqCst);
                self.state.provider.lock().take();
                Ok(())
            })
        }

        fn provider(&self) -> Option<MockProvider> {
            self.state.provider_reads.fetch_add(1, Ordering::SeqCst);
            *self.state.provider.lock()
        }

        fn has_auth_state(&self) -> bool {
            self.state.auth_state.load(Ordering::SeqCst)
        }
    }

    impl RpcProvider for MockRpc {
        fn signer_address(&self) -> SdkFuture<'_, Result<String, SdkError>> {
            Box::pin(async move {
                self.state.address_queries.fetch_add(1, Ordering::SeqCst);
                tokio::task::yield_now().await;
                if self.state.fail_rpc.load(Ordering::SeqCst) {
                    return Err(SdkError::Rpc("signer unavailable".to_string()));
                }
                Ok(self.state.address.lock().clone())
            })
        }

        fn chain_id(&self) -> SdkFuture<'_, Result<u64, SdkError>> {
            Box::pin(async move { Ok(self.state.chain_id.load(Ordering::SeqCst)) })
        }
    }

    impl WalletBackend for MockBackend {
        type Sdk = MockSdk;
        type Rpc = MockRpc;

        fn create_sdk(&self) -> MockSdk {
            self.state.sdks_created.fetch_add(1, Ordering::SeqCst);
            MockSdk {
                state: self.state.clone(),
            }
        }

        fn wrap_provider(&self, provider: &MockProvider) -> MockRpc {
            MockRpc {
                raw: *provider,
                state: self.state.clone(),
            }
        }
    }
}
