use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{document_store::DocumentStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Keep a document store installed, toggling degraded mode when the backend
/// comes and goes.
///
/// Connection attempts back off exponentially; once connected the store is
/// health-polled and dropped again on failure, returning to the connect loop.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn DocumentStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.install_document_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                loop {
                    match store.health_check().await {
                        Ok(()) => {
                            state.update_degraded(false);
                            sleep(HEALTH_POLL_INTERVAL).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "storage health check failed; entering degraded mode");
                            state.clear_document_store().await;
                            break;
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::{config::AppConfig, dao::memory::MemoryStore, state::AppState,
        trivia::test_support::FakeSupplier};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn installs_the_store_after_initial_failures() {
        let state = AppState::new(AppConfig::default(), Arc::new(FakeSupplier::default()));
        let watcher = state.degraded_watcher();
        assert!(state.is_degraded().await);
        assert!(*watcher.borrow());

        let attempts = Arc::new(AtomicU32::new(0));
        let connect_attempts = attempts.clone();
        tokio::spawn(run(state.clone(), move || {
            let attempt = connect_attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(StorageError::unavailable(
                        "connection refused".into(),
                        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
                    ))
                } else {
                    Ok(Arc::new(MemoryStore::new()) as Arc<dyn DocumentStore>)
                }
            }
        }));

        // Two failures back off 1s then 2s before the third attempt lands.
        tokio::time::sleep(Duration::from_secs(4)).await;

        assert!(!state.is_degraded().await);
        assert!(!*watcher.borrow());
        assert!(attempts.load(Ordering::SeqCst) >= 3);
    }
}
