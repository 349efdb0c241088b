//! Package service handle shared by catalog and download operations

use crate::client::{NetClient, NetConfig, Transport};
use depot_config::Config;
use depot_errors::{ConfigError, Error};
use depot_events::{EventEmitter, EventSender};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Request};
use url::Url;

/// Header carrying the service API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Client of the remote package service
///
/// Generic over its [`Transport`] so tests can run it without a network.
#[derive(Debug, Clone)]
pub struct PackageService<T = NetClient> {
    transport: T,
    base_url: Url,
    api_key: String,
    event_sender: Option<EventSender>,
}

impl PackageService<NetClient> {
    /// Build a service client from the `[service]` and `[network]` sections
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let client = NetClient::new(NetConfig::from(&config.network))?;
        Ok(Self::new(
            client,
            config.base_url()?,
            config.service.api_key.clone(),
        ))
    }
}

impl<T: Transport> PackageService<T> {
    pub fn new(transport: T, base_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            transport,
            base_url,
            api_key: api_key.into(),
            event_sender: None,
        }
    }

    /// Report progress of every operation on `event_sender`
    #[must_use]
    pub fn with_events(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `{base}/packages/{product}`, plus `/download` when `download` is set
    pub(crate) fn endpoint(&self, product: &str, download: bool) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| ConfigError::InvalidValue {
                field: "service.base_url".to_string(),
                value: self.base_url.to_string(),
            })?;
            segments.pop_if_empty().push("packages").push(product);
            if download {
                segments.push("download");
            }
        }
        Ok(url)
    }

    /// Authenticated request for `url`
    pub(crate) fn request(&self, method: Method, url: Url) -> Result<Request, Error> {
        let mut request = Request::new(method, url);
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| ConfigError::InvalidValue {
                field: "service.api_key".to_string(),
                value: "<redacted>".to_string(),
            })?;
        request
            .headers_mut()
            .insert(HeaderName::from_static(API_KEY_HEADER), key);
        Ok(request)
    }

    pub(crate) async fn send(&self, request: Request) -> Result<reqwest::Response, reqwest::Error> {
        self.transport.execute(request).await
    }
}

impl<T> EventEmitter for PackageService<T> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base: &str) -> PackageService {
        PackageService::new(
            NetClient::with_defaults().unwrap(),
            Url::parse(base).unwrap(),
            "secret",
        )
    }

    #[test]
    fn test_endpoints() {
        let svc = service("http://localhost:8080");
        assert_eq!(
            svc.endpoint("editor", false).unwrap().as_str(),
            "http://localhost:8080/packages/editor"
        );
        assert_eq!(
            svc.endpoint("editor", true).unwrap().as_str(),
            "http://localhost:8080/packages/editor/download"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_encodes_product() {
        let svc = service("https://example.com/api/v1/");
        assert_eq!(
            svc.endpoint("my tool/x", false).unwrap().as_str(),
            "https://example.com/api/v1/packages/my%20tool%2Fx"
        );
    }

    #[test]
    fn test_request_carries_api_key() {
        let svc = service("http://localhost:8080");
        let url = svc.endpoint("editor", false).unwrap();
        let request = svc.request(Method::GET, url).unwrap();
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.headers()[API_KEY_HEADER], "secret");
    }

    #[test]
    fn test_invalid_api_key_is_config_error() {
        let svc = PackageService::new(
            NetClient::with_defaults().unwrap(),
            Url::parse("http://localhost").unwrap(),
            "bad\nkey",
        );
        let url = svc.endpoint("p", false).unwrap();
        let err = svc.request(Method::GET, url).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.service.base_url = "https://packages.example.com".to_string();
        config.service.api_key = "k".to_string();
        let svc = PackageService::from_config(&config).unwrap();
        assert_eq!(svc.base_url().as_str(), "https://packages.example.com/");
    }
}
