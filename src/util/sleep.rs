use std::time::Duration;

/// Sleep for the given duration without blocking the event loop.
pub async fn sleep(duration: Duration) {
    #[cfg(target_family = "wasm")]
    {
        gloo_timers::future::sleep(duration).await;
    }
    #[cfg(not(target_family = "wasm"))]
    {
        tokio::time::sleep(duration).await;
    }
}

/// Spawn a `!Send` task onto the current event loop.
///
/// On native targets this must be called from inside a [`tokio::task::LocalSet`].
pub fn spawn_local<F>(future: F)
where
    F: std::future::Future<Output = ()> + 'static,
{
    #[cfg(target_family = "wasm")]
    {
        wasm_bindgen_futures::spawn_local(future);
    }
    #[cfg(not(target_family = "wasm"))]
    {
        tokio::task::spawn_local(future);
    }
}
