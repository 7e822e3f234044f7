//! HTTP implementation of [`ArtifactRegistry`].
//!
//! | Operation      | Request                                                              |
//! |----------------|----------------------------------------------------------------------|
//! | upload         | `POST   /v3/namespaces/{ns}/artifacts/{name}`                        |
//! | set_properties | `PUT    /v3/namespaces/{ns}/artifacts/{name}/versions/{v}/properties`|
//! | list           | `GET    /v3/namespaces/{ns}/artifacts`                               |
//! | delete         | `DELETE /v3/namespaces/{ns}/artifacts/{name}/versions/{v}`           |

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Url};
use tracing::{debug, info};

use crate::artifact::{ArtifactAddr, ArtifactPayload};
use crate::consts::{API_VERSION, HEADER_ARTIFACT_EXTENDS, HEADER_ARTIFACT_VERSION};

use super::{ArtifactRegistry, ArtifactSummary, RegistryError};

/// Registry client bound to one host.
#[derive(Debug, Clone)]
pub struct RegistryClient {
  http: reqwest::Client,
  base: Url,
}

impl RegistryClient {
  /// Create a client for `host` whose requests time out after `timeout`.
  pub fn new(host: &str, timeout: Duration) -> Result<Self, RegistryError> {
    let http = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(RegistryError::ClientBuild)?;
    Self::with_client(host, http)
  }

  /// Create a client for `host` that sends requests through `http`.
  pub fn with_client(host: &str, http: reqwest::Client) -> Result<Self, RegistryError> {
    let invalid = |message: String| RegistryError::InvalidHost {
      host: host.to_string(),
      message,
    };
    let base = Url::parse(host).map_err(|e| invalid(e.to_string()))?;
    if base.cannot_be_a_base() {
      return Err(invalid("not a base URL".to_string()));
    }
    Ok(Self { http, base })
  }

  /// `{host}/v3/namespaces/{ns}/artifacts`
  pub fn artifacts_url(&self, namespace: &str) -> Url {
    self.url(&[namespace, "artifacts"])
  }

  /// `{host}/v3/namespaces/{ns}/artifacts/{name}`
  pub fn artifact_url(&self, addr: &ArtifactAddr) -> Url {
    self.url(&[&addr.namespace, "artifacts", &addr.name])
  }

  /// `{host}/v3/namespaces/{ns}/artifacts/{name}/versions/{version}`
  pub fn version_url(&self, addr: &ArtifactAddr, version: &str) -> Url {
    self.url(&[&addr.namespace, "artifacts", &addr.name, "versions", version])
  }

  /// `{host}/v3/namespaces/{ns}/artifacts/{name}/versions/{version}/properties`
  pub fn properties_url(&self, addr: &ArtifactAddr, version: &str) -> Url {
    self.url(&[&addr.namespace, "artifacts", &addr.name, "versions", version, "properties"])
  }

  /// Join percent-encoded segments under `/v3/namespaces/`.
  fn url(&self, segments: &[&str]) -> Url {
    let mut url = self.base.clone();
    // `with_client` rejected cannot-be-a-base URLs, so this always succeeds.
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().push(API_VERSION).push("namespaces").extend(segments);
    }
    url
  }

  /// Send a request and return the body of a 2xx response.
  async fn send(
    &self,
    method: Method,
    url: Url,
    build: impl FnOnce(RequestBuilder) -> RequestBuilder,
  ) -> Result<Vec<u8>, RegistryError> {
    debug!(method = %method, url = %url, "sending registry request");
    let request = build(self.http.request(method.clone(), url.clone()));

    let transport = |source: reqwest::Error| RegistryError::Transport {
      url: url.to_string(),
      source,
    };
    let response = request.send().await.map_err(|source| {
      if source.is_builder() {
        RegistryError::InvalidRequest {
          url: url.to_string(),
          source,
        }
      } else {
        transport(source)
      }
    })?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport)?;
    debug!(method = %method, url = %url, status = status.as_u16(), size = body.len(), "registry responded");

    if !status.is_success() {
      return Err(RegistryError::Remote {
        method: method.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
        body: String::from_utf8_lossy(&body).into_owned(),
      });
    }
    Ok(body.to_vec())
  }
}

impl ArtifactRegistry for RegistryClient {
  async fn upload(&self, addr: &ArtifactAddr, payload: &ArtifactPayload) -> Result<(), RegistryError> {
    info!(artifact = %addr, version = %payload.version, size = payload.binary.len(), "uploading artifact");
    let url = self.artifact_url(addr);
    self
      .send(Method::POST, url, |request| {
        request
          .header(HEADER_ARTIFACT_VERSION, payload.version.as_str())
          .header(HEADER_ARTIFACT_EXTENDS, payload.config.extends_header())
          .body(payload.binary.clone())
      })
      .await?;
    Ok(())
  }

  async fn set_properties(
    &self,
    addr: &ArtifactAddr,
    version: &str,
    properties: &BTreeMap<String, String>,
  ) -> Result<(), RegistryError> {
    info!(artifact = %addr, version = %version, count = properties.len(), "setting artifact properties");
    let url = self.properties_url(addr, version);
    self.send(Method::PUT, url, |request| request.json(properties)).await?;
    Ok(())
  }

  async fn list(&self, namespace: &str) -> Result<Vec<ArtifactSummary>, RegistryError> {
    let url = self.artifacts_url(namespace);
    let body = self.send(Method::GET, url.clone(), |request| request).await?;
    let artifacts: Vec<ArtifactSummary> = serde_json::from_slice(&body).map_err(|source| RegistryError::Decode {
      url: url.to_string(),
      source,
    })?;
    debug!(namespace = %namespace, count = artifacts.len(), "listed artifacts");
    Ok(artifacts)
  }

  async fn delete(&self, addr: &ArtifactAddr, version: &str) -> Result<(), RegistryError> {
    info!(artifact = %addr, version = %version, "deleting artifact version");
    let url = self.version_url(addr, version);
    self.send(Method::DELETE, url, |request| request).await?;
    Ok(())
  }
}
