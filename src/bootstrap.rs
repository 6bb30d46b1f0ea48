//! Application boot.
//!
//! The [`SessionManager`] is built before anything else so that wallet state is available to
//! every collaborator that follows. Collaborators that keep on-chain state in sync (multicall,
//! application, transaction watchers and the like) plug in as [`Updater`]s and are fed every
//! session snapshot in registration order.

use crate::{
    option::SessionManagerOptions,
    sdk::{RawProvider, WalletBackend},
    session::Session,
    session_manager::{SessionError, SessionManager},
    util::sleep::spawn_local,
};
use futures::future::{AbortHandle, Abortable};
#[cfg(feature = "tracing")]
use tracing::trace;

/// A collaborator that synchronizes its own state with the wallet session.
pub trait Updater<P, R> {
    /// A short name used in diagnostics.
    fn name(&self) -> &str;

    /// Called with the current session at launch and after every change.
    fn update(&mut self, session: &Session<P, R>);
}

type BoxedUpdater<B> = Box<dyn Updater<RawProvider<B>, <B as WalletBackend>::Rpc>>;

/// Builder for an [`App`].
pub struct AppBootstrap<B: WalletBackend> {
    manager: SessionManager<B>,
    updaters: Vec<BoxedUpdater<B>>,
}

impl<B: WalletBackend> AppBootstrap<B> {
    /// Constructs the session manager the application will share.
    pub fn new(backend: B, options: SessionManagerOptions) -> Result<Self, SessionError> {
        Ok(Self::with_manager(SessionManager::new_with_options(
            backend, options,
        )?))
    }

    /// Boots around an existing session manager.
    pub fn with_manager(manager: SessionManager<B>) -> Self {
        Self {
            manager,
            updaters: Vec::new(),
        }
    }

    /// Returns the session manager.
    pub fn manager(&self) -> &SessionManager<B> {
        &self.manager
    }

    /// Registers an updater. Updaters run in registration order.
    pub fn updater<U>(mut self, updater: U) -> Self
    where
        U: Updater<RawProvider<B>, B::Rpc> + 'static,
    {
        self.updaters.push(Box::new(updater));
        self
    }

    /// Starts the session manager and the updater driver.
    ///
    /// An initialization failure does not abort the launch: it is logged and handed to the
    /// `on_error` callback, and the next [`SessionManager::connect`] builds a fresh SDK handle.
    pub async fn launch(self) -> App<B> {
        #[cfg(all(feature = "wasm-js", target_family = "wasm"))]
        crate::sdk::wasm_js::disable_injected_auto_refresh();

        let Self { manager, updaters } = self;

        let driver = Self::spawn_driver(&manager, updaters);

        if let Err(e) = manager.start().await {
            manager.report(e);
        }

        App { manager, driver }
    }

    fn spawn_driver(
        manager: &SessionManager<B>,
        mut updaters: Vec<BoxedUpdater<B>>,
    ) -> AbortHandle {
        let mut receiver = manager.subscribe();
        let (abort_handle, abort_registration) = AbortHandle::new_pair();

        let driver = async move {
            loop {
                let session = receiver.borrow_and_update().clone();
                for updater in updaters.iter_mut() {
                    #[cfg(feature = "tracing")]
                    trace!("Running updater {}", updater.name());
                    updater.update(&session);
                }
                if receiver.changed().await.is_err() {
                    break;
                }
            }
        };

        let task = Abortable::new(driver, abort_registration);
        spawn_local(async {
            let _ = task.await;
        });
        abort_handle
    }
}

/// A launched application.
#[derive(Debug)]
pub struct App<B: WalletBackend> {
    manager: SessionManager<B>,
    driver: AbortHandle,
}

impl<B: WalletBackend> App<B> {
    /// Returns the session manager shared with every consumer.
    pub fn manager(&self) -> &SessionManager<B> {
        &self.manager
    }

    /// Stops the updater driver and the auto-connect poll.
    pub fn shutdown(&self) {
        self.driver.abort();
        self.manager.shutdown();
    }
}
