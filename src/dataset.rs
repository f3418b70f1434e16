use crate::error::LitefetchError;
use crate::loader::Loader;
use crate::session::{Session, TableMetadata};
use crate::shaper::QueryResult;
use crate::verbose::Timer;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// A remote dataset: the loader that fetches it, the session that holds
/// it, and the progress of the most recent load.
///
/// Reloading takes `&mut self`, so no query can overlap a handle swap.
pub struct Dataset {
    loader: Loader,
    session: Session,
    progress: watch::Sender<f64>,
}

impl Dataset {
    pub fn new(loader: Loader, session: Session) -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            loader,
            session,
            progress,
        }
    }

    /// Fetch `url` and install it as the active database.
    ///
    /// The previous database is released first, so on failure the dataset
    /// is left not ready.
    pub async fn load(&mut self, url: &str) -> Result<(), LitefetchError> {
        self.session.close();
        self.progress.send_replace(0.0);

        let timer = Timer::start();
        let progress = &self.progress;
        let fetched = self
            .loader
            .load(url, |percent| {
                progress.send_replace(percent);
            })
            .await;

        let result = fetched.and_then(|buffer| self.session.open(buffer));
        match &result {
            Ok(()) => info!(url, elapsed_ms = timer.elapsed_ms() as u64, "dataset loaded"),
            Err(e) => warn!(url, elapsed_ms = timer.elapsed_ms() as u64, error = %e, "dataset load failed"),
        }
        result
    }

    /// [`Dataset::load`] under an optional deadline in whole seconds.
    ///
    /// The previous database is released before the transfer starts, so a
    /// load that runs out of time leaves the dataset not ready.
    pub async fn load_within(
        &mut self,
        url: &str,
        timeout_secs: Option<u64>,
    ) -> Result<(), LitefetchError> {
        let result = with_deadline(timeout_secs, self.load(url)).await;
        if let Err(LitefetchError::Timeout { seconds }) = &result {
            warn!(url, seconds, "dataset load timed out");
        }
        result
    }

    /// Last reported load percentage, 0 before any load.
    pub fn loading_progress(&self) -> f64 {
        *self.progress.borrow()
    }

    /// Receive every progress update of subsequent loads.
    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    pub fn run_query(&self, query: &str) -> Result<QueryResult, LitefetchError> {
        self.session.execute(query)
    }

    pub fn table_metadata(&self) -> Result<Vec<TableMetadata>, LitefetchError> {
        self.session.schema()
    }

    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Impose a deadline on `fut`; `None` waits as long as it takes.
///
/// On expiry the future is dropped and `Timeout { seconds }` is returned.
pub async fn with_deadline<T, F>(timeout_secs: Option<u64>, fut: F) -> Result<T, LitefetchError>
where
    F: Future<Output = Result<T, LitefetchError>>,
{
    match timeout_secs {
        Some(seconds) => tokio::time::timeout(Duration::from_secs(seconds), fut)
            .await
            .map_err(|_| LitefetchError::Timeout { seconds })?,
        None => fut.await,
    }
}
