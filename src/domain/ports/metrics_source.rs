use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::sample::SampleSet;

#[derive(Error, Debug, Clone)]
pub enum CollectionError {
    #[error("failed to collect system metrics: {0}")]
    MetricsUnavailable(String),
    #[error("timed out after {0:?} while collecting data")]
    Timeout(Duration),
}

#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Sample CPU, memory and every mounted real volume.
    ///
    /// Entities that were enumerated but could not be read are reported in
    /// [`SampleSet::unavailable`] rather than failing the whole call.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError` if no metrics can be read at all.
    async fn sample_all(&self) -> Result<SampleSet, CollectionError>;
}
