//! Document loader trait.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::Document;

/// Fetches a document and extracts its text.
///
/// Network, I/O, size, and parse failures are all reported as
/// [`FetchError`].
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Document, FetchError>;
}
