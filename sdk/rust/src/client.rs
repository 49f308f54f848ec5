use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Protocol version sent in `X-Version` unless overridden.
pub const DEFAULT_VERSION: &str = "1.0";

/// Errors returned by [`XhttpClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with an XHTTP error status line.
    #[error("XHTTP error {status_line}")]
    Protocol {
        code: u16,
        status_line: String,
        /// Decoded `X-Exception` detail, if the node sent one.
        exception: Option<String>,
    },

    #[error("Cannot decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub struct XhttpClient {
    client: Client,
    node_url: String,
    version: String,
}

impl XhttpClient {
    pub fn new(node_url: &str) -> Self {
        Self {
            client: Client::new(),
            node_url: node_url.trim_end_matches('/').to_string(),
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Send another `X-Version` than [`DEFAULT_VERSION`].
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Send a request with exactly the given headers.
    pub async fn send(&self, headers: &[(&str, &str)], body: Vec<u8>) -> Result<Response, reqwest::Error> {
        let mut request = self.client.post(format!("{}/", self.node_url));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        request.body(body).send().await
    }

    /// Versions the service declares.
    pub async fn versions(&self, service: &str) -> Result<Vec<String>, ClientError> {
        self.call("version", service, &[], Vec::new()).await
    }

    /// Info pairs of the service, sorted by key.
    pub async fn info(&self, service: &str) -> Result<Vec<(String, String)>, ClientError> {
        self.call("info", service, &[], Vec::new()).await
    }

    pub async fn schema(&self, service: &str) -> Result<Value, ClientError> {
        self.call("schema", service, &[], Vec::new()).await
    }

    /// Invoke an action. `arguments` are `(name, type code)` pairs.
    pub async fn perform(
        &self,
        service: &str,
        action: &str,
        arguments: &[(&str, i64)],
        body: Vec<u8>,
    ) -> Result<Value, ClientError> {
        let arguments = arguments
            .iter()
            .map(|(name, type_code)| format!("{};{}", name, type_code))
            .collect::<Vec<_>>()
            .join(",");

        let mut extra = vec![("X-Action", action)];
        if !arguments.is_empty() {
            extra.push(("X-Arguments", arguments.as_str()));
        }
        self.call("perform", service, &extra, body).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        mode: &str,
        service: &str,
        extra: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<T, ClientError> {
        let mut headers = vec![
            ("X-Mode", mode),
            ("X-Service", service),
            ("X-Version", self.version.as_str()),
        ];
        headers.extend_from_slice(extra);

        let resp = self.send(&headers, body).await?;
        let status = resp.status();
        let exception = resp
            .headers()
            .get("x-exception")
            .and_then(|v| v.to_str().ok())
            .map(decode_exception);
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(ClientError::Protocol {
                code: status.as_u16(),
                status_line: text,
                exception,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// `X-Exception` carries a JSON string; fall back to the raw value.
fn decode_exception(raw: &str) -> String {
    serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw.to_string())
}
