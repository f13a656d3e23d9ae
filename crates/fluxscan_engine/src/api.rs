use std::time::Duration;

use bytes::Bytes;
use fluxscan_logging::{flux_debug, flux_warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ClientError;

/// Used when a failed response carries no usable `error` field.
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: Url,
    /// Only bounds connection setup. Requests themselves never time out.
    pub connect_timeout: Option<Duration>,
}

impl ApiSettings {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            connect_timeout: None,
        }
    }
}

/// Per-call options. Headers given here win over the JSON defaults.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: &Value) -> Self {
        Self {
            method: Method::POST,
            headers: Vec::new(),
            body: Some(body.to_string().into_bytes()),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Single chokepoint for server calls: JSON headers in, JSON out, server
/// error payloads turned into [`ClientError::Server`]. No retries.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(settings: ApiSettings) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            base_url: settings.base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidRequest(format!("{path}: {err}")))
    }

    /// Performs the call and resolves with the parsed JSON body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ClientError> {
        self.request_as(path, options).await
    }

    pub async fn request_as<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        self.request_url_as(url, options).await
    }

    pub async fn request_url_as<T: DeserializeOwned>(
        &self,
        url: Url,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let body = self.send(url, options).await?;
        serde_json::from_slice(&body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Same error handling as [`ApiClient::request`], but hands back the raw body.
    pub async fn request_bytes(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Bytes, ClientError> {
        let url = self.endpoint(path)?;
        self.send(url, options).await
    }

    async fn send(&self, url: Url, options: RequestOptions) -> Result<Bytes, ClientError> {
        let headers = merge_headers(&options.headers)?;
        flux_debug!("{} {}", options.method, url);

        let mut builder = self.client.request(options.method, url.clone()).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let err = server_error(status, &body);
            flux_warn!("{} failed with {}: {}", url, status, err);
            return Err(err);
        }
        Ok(body)
    }
}

fn merge_headers(overrides: &[(String, String)]) -> Result<HeaderMap, ClientError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in overrides {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| ClientError::InvalidRequest(err.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| ClientError::InvalidRequest(err.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

fn server_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}
