//! The registry used when a reference names no registry of its own

use crate::{errors::SourceError, locator::Locator};
use url::Url;
use std::env;

static DEFAULT_NAME: &str = "singularity-hub.org/api/container/";
static DEFAULT_ENDPOINT: &str = "https://www.singularity-hub.org/api/container/";

/// Settings for the default registry server
///
/// The `name` is the registry path that [Locator::parse()] fills in for
/// references without a registry of their own. The `endpoint` is the base
/// URL that manifest requests for those references are sent to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DefaultRegistry {
    name: String,
    endpoint: Url,
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        DefaultRegistry::new()
    }
}

impl DefaultRegistry {
    /// Return the built-in defaults
    pub fn new() -> Self {
        DefaultRegistry {
            name: DEFAULT_NAME.to_owned(),
            endpoint: DEFAULT_ENDPOINT.parse().unwrap(),
        }
    }

    /// Built-in defaults, with the endpoint overridden by
    /// `$SHUB_REGISTRY_ENDPOINT` if it is set
    pub fn from_env() -> Result<Self, SourceError> {
        match env::var("SHUB_REGISTRY_ENDPOINT") {
            Ok(s) => {
                let endpoint = Url::parse(&s).map_err(|_| SourceError::InvalidEndpoint(s.clone()))?;
                log::debug!("default registry endpoint from environment, {}", endpoint);
                DefaultRegistry::new().endpoint(endpoint)
            }
            Err(_) => Ok(DefaultRegistry::new()),
        }
    }

    /// Built-in endpoint under a different registry name
    ///
    /// A trailing slash is added to the name if it is missing.
    pub fn with_name(name: &str) -> Self {
        let mut name = name.to_owned();
        if !name.ends_with('/') {
            name.push('/');
        }
        DefaultRegistry {
            name,
            ..DefaultRegistry::new()
        }
    }

    /// Replace the endpoint that manifest requests are sent to
    ///
    /// The endpoint is used as a base URL, so its path is given a trailing
    /// slash if it lacks one. URLs that can't be a base, like `data:` URLs,
    /// are rejected.
    pub fn endpoint(mut self, mut endpoint: Url) -> Result<Self, SourceError> {
        if endpoint.cannot_be_a_base() {
            return Err(SourceError::InvalidEndpoint(endpoint.to_string()));
        }
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        self.endpoint = endpoint;
        Ok(self)
    }

    /// Registry path used in place of a missing registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL for manifest requests
    pub fn endpoint_url(&self) -> &Url {
        &self.endpoint
    }

    /// Determine the manifest URL for a locator
    ///
    /// Only references on the default registry can be resolved, anything else
    /// fails with [SourceError::UnsupportedRegistry].
    ///
    /// The URL path is always the endpoint path followed by
    /// [Locator::http_path()]. Containers named `.` or `..` would be resolved
    /// away as dot segments, so they fail with [SourceError::InvalidReference].
    pub fn manifest_url(&self, locator: &Locator) -> Result<Url, SourceError> {
        if !locator.is_default_registry() {
            return Err(SourceError::UnsupportedRegistry(
                locator.registry_str().to_owned(),
            ));
        }
        let url = self
            .endpoint
            .join(locator.http_path())
            .map_err(|_| SourceError::InvalidReference(locator.reference()))?;
        let expected = format!("{}{}", self.endpoint.path(), locator.http_path());
        if url.path() != expected {
            return Err(SourceError::InvalidReference(locator.reference()));
        }
        Ok(url)
    }
}
