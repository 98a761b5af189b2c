use crate::{
    errors::SourceError,
    registry::{DefaultRegistry, RegistryClient},
};

use reqwest::{
    header::{HeaderMap, HeaderValue},
    Certificate, Client, ClientBuilder,
};
use std::{convert::TryInto, time::Duration};

/// Builder for configuring custom [RegistryClient] instances
pub struct RegistryClientBuilder {
    network: ClientBuilder,
    default_registry: Option<DefaultRegistry>,
    manifest_timeout: Duration,
    download_timeout: Option<Duration>,
}

impl Default for RegistryClientBuilder {
    fn default() -> Self {
        RegistryClientBuilder::new()
    }
}

impl RegistryClientBuilder {
    /// Start constructing a custom registry client
    pub fn new() -> Self {
        RegistryClientBuilder {
            network: Client::builder().user_agent(RegistryClient::default_user_agent()),
            default_registry: None,
            manifest_timeout: RegistryClient::default_manifest_timeout(),
            download_timeout: None,
        }
    }

    /// Set the timeout for manifest requests
    ///
    /// This covers the whole request, from connecting until the last byte of
    /// the manifest has been received. The default is 30 seconds.
    pub fn manifest_timeout(mut self, timeout: Duration) -> Self {
        self.manifest_timeout = timeout;
        self
    }

    /// Set a deadline for image downloads
    ///
    /// This timeout applies from the beginning of the download request until
    /// the last byte has been written. By default there is no timeout.
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = Some(timeout);
        self
    }

    /// Set a timeout for only the initial connect phase of each network request
    ///
    /// By default there is no timeout beyond those built into the networking
    /// stack.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.network = self.network.connect_timeout(timeout);
        self
    }

    /// Sets the `User-Agent` header used by this client
    ///
    /// By default, the value returned by
    /// [RegistryClient::default_user_agent()] is used, which identifies the
    /// version of `shub-conveyor` acting as a client.
    pub fn user_agent<V>(mut self, value: V) -> Self
    where
        V: TryInto<HeaderValue>,
        V::Error: Into<http::Error>,
    {
        self.network = self.network.user_agent(value);
        self
    }

    /// Set the default headers for every HTTP request
    pub fn default_request_headers(mut self, headers: HeaderMap) -> Self {
        self.network = self.network.default_headers(headers);
        self
    }

    /// Trust an additional root certificate
    pub fn add_root_certificate(mut self, certificate: Certificate) -> Self {
        self.network = self.network.add_root_certificate(certificate);
        self
    }

    /// Change the default registry server
    ///
    /// This registry is used for references that do not name a registry. The
    /// default value if unset comes from [DefaultRegistry::from_env()].
    pub fn registry(mut self, default_registry: &DefaultRegistry) -> Self {
        self.default_registry = Some(default_registry.clone());
        self
    }

    /// Construct a RegistryClient using the parameters from this Builder
    pub fn build(self) -> Result<RegistryClient, SourceError> {
        let default_registry = match self.default_registry {
            Some(registry) => registry,
            None => DefaultRegistry::from_env()?,
        };
        log::debug!(
            "using default registry {} at {}",
            default_registry.name(),
            default_registry.endpoint_url()
        );
        Ok(RegistryClient::from_parts(
            self.network.build()?,
            default_registry,
            self.manifest_timeout,
            self.download_timeout,
        ))
    }
}
