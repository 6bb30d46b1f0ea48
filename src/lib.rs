//! Session management for dapp front-ends that embed a social-login wallet SDK.
//!
//! A single [`SessionManager`] owns the SDK handle, initializes it once, and turns a login
//! completed inside the wallet widget into a connected [`Session`]: the SDK's raw provider, an
//! RPC-wrapping provider, the signer address and the chain id. Consumers read the session
//! through [`SessionContext`] or subscribe to every change; [`AppBootstrap`] wires the manager
//! in before anything else and feeds its snapshots to the application's [`Updater`]s.
//!
//! The SDK itself is abstracted behind [`WalletBackend`]. With the `wasm-js` feature on a wasm
//! target, `sdk::wasm_js::JsBackend` binds the Biconomy `SocialLogin` widget and the ethers
//! `Web3Provider`.
//!
//! # Example
//! ```ignore
//! use social_login_session::{sdk::wasm_js::JsBackend, AppBootstrap, SessionManagerOptions};
//!
//! let app = AppBootstrap::new(JsBackend, SessionManagerOptions::default())?
//!     .launch()
//!     .await;
//!
//! // Shows the widget, or connects if the user already logged in.
//! app.manager().connect().await?;
//! ```

pub mod bootstrap;
pub mod context;
pub mod option;
pub mod sdk;
pub mod session;
pub mod session_manager;
mod util;

pub use util::callback;

pub use bootstrap::{App, AppBootstrap, Updater};
pub use context::{DetachedSession, SessionContext};
pub use option::{ChainId, ConfigError, NetworkTier, SdkInitConfig, SessionManagerOptions};
pub use sdk::{RpcProvider, SdkError, WalletBackend, WalletSdk};
pub use session::{Session, SessionStore};
pub use session_manager::{ConnectOutcome, ConnectionState, SessionError, SessionManager};
