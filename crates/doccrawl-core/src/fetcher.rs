//! HTTP validator probing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ETAG, HeaderMap, HeaderName, LAST_MODIFIED};
use tracing::debug;

use crate::detect::{DEFAULT_PROBE_TIMEOUT, ProbeResponse, ValidatorProbe};
use crate::{Error, Result};

/// `HEAD` requests for `ETag` and `Last-Modified`.
///
/// Redirects are followed. Every failure, including a timeout, yields an
/// empty [`ProbeResponse`].
#[derive(Debug, Clone)]
pub struct HttpValidatorProbe {
    client: Client,
}

impl HttpValidatorProbe {
    /// Probe with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_PROBE_TIMEOUT)
    }

    /// Probe with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("doccrawl/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client })
    }

    async fn head(&self, url: &str) -> Result<ProbeResponse> {
        let response = self.client.head(url).send().await?;
        let headers = response.headers();

        Ok(ProbeResponse {
            etag: header_value(headers, &ETAG),
            last_modified: header_value(headers, &LAST_MODIFIED),
            status: Some(response.status().as_u16()),
        })
    }
}

#[async_trait]
impl ValidatorProbe for HttpValidatorProbe {
    async fn probe(&self, url: &str) -> ProbeResponse {
        match self.head(url).await {
            Ok(response) => {
                debug!(
                    status = ?response.status,
                    etag = ?response.etag,
                    last_modified = ?response.last_modified,
                    "HEAD {url}"
                );
                response
            },
            Err(e) => {
                debug!("HEAD {url} failed: {e}");
                ProbeResponse::default()
            },
        }
    }
}

/// Non-empty, valid UTF-8 header value.
pub(crate) fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}
