use crate::{
    errors::SourceError,
    locator::Locator,
    manifest::Manifest,
    registry::{DefaultRegistry, RegistryClientBuilder},
};

use reqwest::header::HeaderValue;
use std::time::Duration;

/// Registry clients look up manifests and download images
///
/// Each client holds the network settings (user agent, timeouts) and the
/// default registry. Clones share the same connection pool, so one client
/// can serve any number of concurrent acquisitions.
#[derive(Clone, Debug)]
pub struct RegistryClient {
    pub(super) req: reqwest::Client,
    pub(super) default_registry: DefaultRegistry,
    pub(super) manifest_timeout: Duration,
    pub(super) download_timeout: Option<Duration>,
}

impl RegistryClient {
    /// Construct a new registry client with default options
    pub fn new() -> Result<RegistryClient, SourceError> {
        RegistryClient::builder().build()
    }

    /// Construct a registry client with custom options, via
    /// [RegistryClientBuilder]
    pub fn builder() -> RegistryClientBuilder {
        RegistryClientBuilder::new()
    }

    pub(crate) fn from_parts(
        req: reqwest::Client,
        default_registry: DefaultRegistry,
        manifest_timeout: Duration,
        download_timeout: Option<Duration>,
    ) -> Self {
        RegistryClient {
            req,
            default_registry,
            manifest_timeout,
            download_timeout,
        }
    }

    /// Return the default `User-Agent` that we use if no other is set
    pub fn default_user_agent() -> HeaderValue {
        static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
        HeaderValue::from_static(USER_AGENT)
    }

    /// Return the default manifest request timeout
    pub fn default_manifest_timeout() -> Duration {
        Duration::from_secs(30)
    }

    /// The default registry this client resolves references against
    pub fn default_registry(&self) -> &DefaultRegistry {
        &self.default_registry
    }

    /// Parse a reference against this client's default registry
    pub fn parse(&self, reference: &str) -> Result<Locator, SourceError> {
        Locator::parse(reference, &self.default_registry)
    }

    /// Look up the manifest for an image
    ///
    /// Only images on the default registry can be looked up; other locators
    /// fail with [SourceError::UnsupportedRegistry] before any request is
    /// made. The request is bounded by the manifest timeout and never retried.
    pub async fn fetch_manifest(&self, locator: &Locator) -> Result<Manifest, SourceError> {
        let manifest_url = self.default_registry.manifest_url(locator)?;
        log::info!("{:?} <{}> requesting manifest...", locator, manifest_url);

        let response = self
            .req
            .get(manifest_url)
            .timeout(self.manifest_timeout)
            .send()
            .await
            .map_err(SourceError::from_request)?;
        log::debug!("response: {:?}", response);

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::RegistryStatus(status.to_string()));
        }

        let body = response.bytes().await.map_err(SourceError::from_request)?;
        log::trace!("raw json manifest, {}", String::from_utf8_lossy(&body));
        let manifest: Manifest = serde_json::from_slice(&body)?;
        log::debug!("manifest: {}", manifest.image);
        Ok(manifest)
    }
}
