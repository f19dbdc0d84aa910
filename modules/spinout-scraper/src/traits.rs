use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use spinout_common::Publication;

use crate::error::CollectionError;

/// Produces the current list of publications, re-read from the start on
/// every call. Cancellation stops paging early and returns what was collected.
#[async_trait]
pub trait PublicationSource: Send + Sync {
    async fn fetch_all(&self, cancel: &CancellationToken) -> Result<Vec<Publication>, CollectionError>;
}
