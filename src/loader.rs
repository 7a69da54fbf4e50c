//! Concrete [`DocumentLoader`]: fetches `http(s)://` URLs, `file://` URLs,
//! and bare filesystem paths, then extracts their text.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use docqa_core::{Document, DocumentLoader, FetchError};
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::LoaderConfig;
use crate::extract::{detect_content_type, extract_text};

/// Where a document reference points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Http(String),
    File(PathBuf),
}

impl Location {
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(FetchError::new(url, "empty document URL"));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Ok(Location::Http(trimmed.to_string()))
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            Ok(Location::File(PathBuf::from(path)))
        } else if trimmed.contains("://") {
            Err(FetchError::new(url, "unsupported URL scheme"))
        } else {
            Ok(Location::File(PathBuf::from(trimmed)))
        }
    }
}

pub struct HttpLoader {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpLoader {
    pub fn new(config: &LoaderConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    async fn fetch_http(&self, url: &str) -> Result<(Vec<u8>, Option<String>), FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::new(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(url, format!("HTTP {status}")));
        }
        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(too_large(url, len, self.max_bytes));
            }
        }
        let declared = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(piece) = stream.next().await {
            let piece = piece.map_err(|e| FetchError::new(url, e.to_string()))?;
            body.extend_from_slice(&piece);
            if body.len() as u64 > self.max_bytes {
                return Err(too_large(url, body.len() as u64, self.max_bytes));
            }
        }
        Ok((body, declared))
    }

    async fn fetch_file(&self, url: &str, path: &Path) -> Result<Vec<u8>, FetchError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|e| FetchError::new(url, e.to_string()))?;
        if meta.len() > self.max_bytes {
            return Err(too_large(url, meta.len(), self.max_bytes));
        }
        tokio::fs::read(path)
            .await
            .map_err(|e| FetchError::new(url, e.to_string()))
    }
}

fn too_large(url: &str, size: u64, max: u64) -> FetchError {
    FetchError::new(url, format!("document is {size} bytes, limit is {max}"))
}

#[async_trait]
impl DocumentLoader for HttpLoader {
    async fn load(&self, url: &str) -> Result<Document, FetchError> {
        let (bytes, declared) = match Location::parse(url)? {
            Location::Http(u) => self.fetch_http(&u).await?,
            Location::File(path) => (self.fetch_file(url, &path).await?, None),
        };
        debug!(url, bytes = bytes.len(), "fetched document");

        let content_type = detect_content_type(&bytes, declared.as_deref(), url);
        let text = extract_text(&bytes, &content_type)
            .map_err(|e| FetchError::new(url, e.to_string()))?;

        info!(url, %content_type, chars = text.chars().count(), "loaded document");
        Ok(Document::new(url, text).with_content_type(content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_locations() {
        assert_eq!(
            Location::parse("https://example.com/a.pdf").unwrap(),
            Location::Http("https://example.com/a.pdf".to_string())
        );
        assert_eq!(
            Location::parse("file:///tmp/a.txt").unwrap(),
            Location::File(PathBuf::from("/tmp/a.txt"))
        );
        assert_eq!(
            Location::parse("docs/a.txt").unwrap(),
            Location::File(PathBuf::from("docs/a.txt"))
        );
    }

    #[test]
    fn reject_unknown_scheme_and_empty() {
        assert!(Location::parse("ftp://example.com/a").is_err());
        assert!(Location::parse("  ").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_fetch_error() {
        let loader = HttpLoader::new(&LoaderConfig::default()).unwrap();
        let err = loader.load("/nonexistent/docqa/file.txt").await.unwrap_err();
        assert_eq!(err.source_url, "/nonexistent/docqa/file.txt");
    }
}
