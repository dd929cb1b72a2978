use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::RANGE};
use tracing::{debug, warn};

use crate::classify::{Classification, ConditionBucket, Gradient};

/// Used when no candidate image could be loaded.
pub const FALLBACK_IMAGE: &str = "default.jpg";

/// Answers whether an image with the given filename can be loaded.
#[async_trait]
pub trait ImageProbe: Send + Sync + Debug {
    async fn probe(&self, file: &str) -> bool;
}

/// Background chosen for a record: photo, color gradient and the bucket
/// that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub file: String,
    pub gradient: Gradient,
    pub bucket: ConditionBucket,
}

/// Looks for files under a local images directory.
#[derive(Debug, Clone)]
pub struct DirectoryProbe {
    root: PathBuf,
}

impl DirectoryProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ImageProbe for DirectoryProbe {
    async fn probe(&self, file: &str) -> bool {
        tokio::fs::metadata(self.root.join(file))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }
}

/// Checks `<base>/images/<file>` on a static file host.
///
/// Sends `HEAD` first. Hosts that reject it with 405 get a single-byte
/// ranged `GET` instead.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    base_url: String,
    http: Client,
}

impl HttpProbe {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn image_url(&self, file: &str) -> String {
        format!("{}/images/{}", self.base_url, file)
    }
}

#[async_trait]
impl ImageProbe for HttpProbe {
    async fn probe(&self, file: &str) -> bool {
        let url = self.image_url(file);

        let status = match self.http.head(&url).send().await {
            Ok(res) if res.status() == StatusCode::METHOD_NOT_ALLOWED => {
                debug!(file, "HEAD not allowed, retrying with ranged GET");
                self.http
                    .get(&url)
                    .header(RANGE, "bytes=0-0")
                    .send()
                    .await
                    .map(|res| res.status())
            }
            other => other.map(|res| res.status()),
        };

        match status {
            Ok(status) => status.is_success(),
            Err(err) => {
                debug!(file, error = %err, "image probe failed");
                false
            }
        }
    }
}

/// First candidate the probe accepts, trying them strictly in order.
///
/// Nothing after the first hit is probed. A probe that does not answer
/// within `timeout` counts as a miss. Falls back to [`FALLBACK_IMAGE`].
pub async fn resolve_background<P>(candidates: &[String], probe: &P, timeout: Duration) -> String
where
    P: ImageProbe + ?Sized,
{
    for file in candidates {
        match tokio::time::timeout(timeout, probe.probe(file)).await {
            Ok(true) => {
                debug!(file = %file, "background image resolved");
                return file.clone();
            }
            Ok(false) => {}
            Err(_) => debug!(file = %file, "image probe timed out"),
        }
    }

    warn!(
        tried = candidates.len(),
        "no matching background image found, using {FALLBACK_IMAGE}"
    );
    FALLBACK_IMAGE.to_string()
}

/// Resolve the image for a classification and pair it with its gradient.
pub async fn choose_background<P>(
    classification: &Classification,
    probe: &P,
    timeout: Duration,
) -> Background
where
    P: ImageProbe + ?Sized,
{
    let file = resolve_background(&classification.candidates, probe, timeout).await;

    Background {
        file,
        gradient: classification.gradient(),
        bucket: classification.bucket,
    }
}
