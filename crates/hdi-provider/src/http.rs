//! HTTP implementation of [`ClusterApi`] against the management endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::client::{ClusterApi, OperationHandle, OperationStatus};
use crate::model::{
    Cluster, ClusterCreateParameters, ClusterPatchParameters, ClusterResizeParameters,
    ConfigurationValues,
};
use hdi_common::metrics::{RequestStatus, RequestTimer};
use hdi_common::resource_id::{CLUSTERS_KEY, HDINSIGHT_NAMESPACE};
use hdi_common::{Error, RoleName};

/// Public cloud management endpoint
pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// API version every request is pinned to
pub const API_VERSION: &str = "2018-06-01-preview";

const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";

/// Settings for [`HttpClusterApi`]
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    /// Management endpoint base URL
    pub endpoint: String,
    /// Subscription every cluster lives in
    pub subscription_id: String,
    /// Bearer token; acquiring and refreshing it is the caller's concern
    pub access_token: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl HttpClientConfig {
    /// Config for the public cloud endpoint
    pub fn new(subscription_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            subscription_id: subscription_id.into(),
            access_token: access_token.into(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Real provider client using reqwest
pub struct HttpClusterApi {
    http: Client,
    endpoint: String,
    subscription_id: String,
    access_token: String,
}

impl HttpClusterApi {
    /// Create a client from config
    pub fn new(config: HttpClientConfig) -> Result<Self, Error> {
        if config.subscription_id.trim().is_empty() {
            return Err(Error::config("subscription id is not set"));
        }
        if config.access_token.trim().is_empty() {
            return Err(Error::config("access token is not set"));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            subscription_id: config.subscription_id,
            access_token: config.access_token,
        })
    }

    /// Subscription this client addresses
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    fn cluster_url(&self, resource_group: &str, name: &str) -> String {
        cluster_url(&self.endpoint, &self.subscription_id, resource_group, name)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url).bearer_auth(&self.access_token);
        if url.contains("api-version=") {
            builder
        } else {
            builder.query(&[("api-version", API_VERSION)])
        }
    }

    /// Send a request, recording metrics; transport failures become provider errors
    async fn execute(&self, method: &Method, builder: RequestBuilder) -> Result<Response, Error> {
        let timer = RequestTimer::start(method.as_str());
        match builder.send().await {
            Ok(response) => {
                timer.complete(RequestStatus::from_status_code(response.status().as_u16()));
                Ok(response)
            }
            Err(e) => {
                timer.complete(RequestStatus::Transport);
                Err(Error::provider(format!("request failed: {e}")))
            }
        }
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::provider(format!("failed to read response body: {e}")))?;
        if body.is_empty() {
            return serde_json::from_str("{}").map_err(Error::from);
        }
        serde_json::from_slice(&body).map_err(Error::from)
    }
}

#[async_trait]
impl ClusterApi for HttpClusterApi {
    #[instrument(skip(self, params))]
    async fn create(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterCreateParameters,
    ) -> Result<OperationHandle, Error> {
        let url = self.cluster_url(resource_group, name);
        let response = self
            .execute(&Method::PUT, self.request(Method::PUT, &url).json(params))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(handle_from_response(response.status(), response.headers()))
    }

    #[instrument(skip(self))]
    async fn get(&self, resource_group: &str, name: &str) -> Result<Option<Cluster>, Error> {
        let url = self.cluster_url(resource_group, name);
        let response = self
            .execute(&Method::GET, self.request(Method::GET, &url))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Cluster not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Self::json(response).await.map(Some)
    }

    #[instrument(skip(self, params))]
    async fn update_tags(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterPatchParameters,
    ) -> Result<(), Error> {
        let url = self.cluster_url(resource_group, name);
        let response = self
            .execute(&Method::PATCH, self.request(Method::PATCH, &url).json(params))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn resize(
        &self,
        resource_group: &str,
        name: &str,
        params: &ClusterResizeParameters,
    ) -> Result<OperationHandle, Error> {
        let url = format!(
            "{}/roles/{}/resize",
            self.cluster_url(resource_group, name),
            RoleName::Worker.provider_name()
        );
        let response = self
            .execute(&Method::POST, self.request(Method::POST, &url).json(params))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(handle_from_response(response.status(), response.headers()))
    }

    #[instrument(skip(self))]
    async fn delete(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<Option<OperationHandle>, Error> {
        let url = self.cluster_url(resource_group, name);
        let response = self
            .execute(&Method::DELETE, self.request(Method::DELETE, &url))
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => {
                debug!("Cluster already absent");
                Ok(None)
            }
            status if status.is_success() => {
                Ok(Some(handle_from_response(status, response.headers())))
            }
            _ => Err(error_from_response(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn get_configuration(
        &self,
        resource_group: &str,
        name: &str,
        configuration: &str,
    ) -> Result<ConfigurationValues, Error> {
        let url = format!(
            "{}/configurations/{}",
            self.cluster_url(resource_group, name),
            configuration
        );
        let response = self
            .execute(&Method::GET, self.request(Method::GET, &url))
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Self::json(response).await
    }

    async fn operation_status(&self, handle: &OperationHandle) -> Result<OperationStatus, Error> {
        let status_url = match handle {
            OperationHandle::Completed => return Ok(OperationStatus::Succeeded),
            OperationHandle::Pending { status_url, .. } => status_url,
        };

        let response = self
            .execute(&Method::GET, self.request(Method::GET, status_url))
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response).await);
        }

        let retry_after = parse_retry_after(response.headers());
        if status == StatusCode::ACCEPTED {
            return Ok(OperationStatus::InProgress { retry_after });
        }

        let body: AsyncOperationBody = Self::json(response).await?;
        Ok(body.into_status(retry_after))
    }
}

/// Build the URL of a cluster resource
pub fn cluster_url(endpoint: &str, subscription_id: &str, resource_group: &str, name: &str) -> String {
    format!(
        "{endpoint}/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/{HDINSIGHT_NAMESPACE}/{CLUSTERS_KEY}/{name}"
    )
}

/// Work out how to follow up on a mutating call
///
/// An async-operation header is followed on any success status, since create
/// answers 200 while the cluster is still provisioning. The location header
/// only counts on accepted or created answers. Anything else finished inline.
fn handle_from_response(status: StatusCode, headers: &HeaderMap) -> OperationHandle {
    let status_url = match status {
        StatusCode::OK => header_str(headers, ASYNC_OPERATION_HEADER),
        StatusCode::ACCEPTED | StatusCode::CREATED => header_str(headers, ASYNC_OPERATION_HEADER)
            .or_else(|| header_str(headers, LOCATION.as_str())),
        _ => None,
    };

    match status_url {
        Some(url) => OperationHandle::pending(url, parse_retry_after(headers)),
        None => OperationHandle::Completed,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Debug, Default, Deserialize)]
struct AsyncOperationBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ProviderErrorDetail>,
}

impl AsyncOperationBody {
    fn into_status(self, retry_after: Option<Duration>) -> OperationStatus {
        match self.status.as_deref() {
            // A location poll that finished has no status body.
            None => OperationStatus::Succeeded,
            Some(s) if s.eq_ignore_ascii_case("succeeded") => OperationStatus::Succeeded,
            Some(s) if s.eq_ignore_ascii_case("failed") || s.eq_ignore_ascii_case("canceled") => {
                let detail = self
                    .error
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| format!("operation finished with status {s}"));
                OperationStatus::Failed(detail)
            }
            Some(_) => OperationStatus::InProgress { retry_after },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl std::fmt::Display for ProviderErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{code}: {message}"),
            (Some(code), None) => f.write_str(code),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("unknown provider error"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: Option<ProviderErrorDetail>,
}

/// Turn a non-success answer into a provider error with the provider's text
async fn error_from_response(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Error::provider_status(status.as_u16(), error_message(status, &body))
}

fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(ProviderErrorBody {
            error: Some(detail),
        }) => format!("{status}: {detail}"),
        _ if body.trim().is_empty() => status.to_string(),
        _ => format!("{status}: {}", body.trim()),
    }
}
