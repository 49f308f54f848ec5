//! Response envelope.
//!
//! # Responsibilities
//! - Wrap informational content as compact JSON
//! - Turn an [`XhttpError`] into status line, headers and body
//!
//! # Design Decisions
//! - Error status line is `"{code} {message}"`: numeric status = code,
//!   reason phrase = message, body = the whole line
//! - Error responses always carry `text/plain; charset=utf-8`
//! - 1xx protocol-level codes are not final HTTP statuses; they go out
//!   with status 550 and keep their own line in the body

use axum::http::{header::CONTENT_TYPE, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper::ext::ReasonPhrase;
use serde::Serialize;

use crate::protocol::error::{ErrorKind, XhttpError, XhttpResult};

/// Content type for error responses, before the charset.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Content type for informational and perform responses.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A response produced by the XHTTP pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XhttpResponse {
    status: StatusCode,
    reason: Option<&'static str>,
    headers: Vec<(String, String)>,
    content_type: String,
    body: String,
}

impl XhttpResponse {
    /// `200` response with `content` encoded as compact JSON.
    pub fn json<T: Serialize + ?Sized>(content: &T) -> XhttpResult<Self> {
        let body = serde_json::to_string(content).map_err(|e| XhttpError::unexpected(&e))?;
        Ok(Self {
            status: StatusCode::OK,
            reason: None,
            headers: Vec::new(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            body,
        })
    }

    /// Response describing `err`.
    pub fn from_error(err: &XhttpError) -> Self {
        let code = if err.kind().is_protocol_level() {
            ErrorKind::InternalException.code()
        } else {
            err.code()
        };

        // Later duplicates win, Content-Type is always ours.
        let mut headers: Vec<(String, String)> = Vec::new();
        for (name, value) in err.headers() {
            if name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Self {
            status: StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            reason: Some(err.message()),
            headers,
            content_type: format!("{}; charset=utf-8", DEFAULT_CONTENT_TYPE),
            body: err.status_line(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase sent in the status line, if it is not the canonical one.
    pub fn reason(&self) -> Option<&'static str> {
        self.reason
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for XhttpResponse {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("text/plain; charset=utf-8"));
        headers.insert(CONTENT_TYPE, content_type);

        if let Some(reason) = self.reason {
            response
                .extensions_mut()
                .insert(ReasonPhrase::from_static(reason.as_bytes()));
        }

        response
    }
}

impl IntoResponse for XhttpError {
    fn into_response(self) -> Response {
        XhttpResponse::from_error(&self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::error::X_EXCEPTION;

    #[test]
    fn test_json_is_compact() {
        let content = vec![("link".to_string(), "http://x".to_string())];
        let response = XhttpResponse::json(&content).unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body(), r#"[["link","http://x"]]"#);
        assert_eq!(response.content_type(), "application/json; charset=utf-8");
    }

    #[test]
    fn test_error_response_shape() {
        let err = XhttpError::version_not_supported("1.0").with_header("Content-Type", "text/html");
        let response = XhttpResponse::from_error(&err);

        assert_eq!(response.status().as_u16(), 551);
        assert_eq!(response.reason(), Some("XHTTP Version Not Supported"));
        assert_eq!(response.body(), "551 XHTTP Version Not Supported");
        assert_eq!(response.content_type(), "text/plain; charset=utf-8");
        assert_eq!(response.header("X-Version"), Some("1.0"));
        assert_eq!(response.header("content-type"), None);
    }

    #[test]
    fn test_duplicate_headers_last_wins() {
        let err = XhttpError::new(ErrorKind::ServiceNotFound)
            .with_header("X-Hint", "first")
            .with_header("x-hint", "second");
        let response = XhttpResponse::from_error(&err);
        assert_eq!(response.header("X-Hint"), Some("second"));
    }

    #[test]
    fn test_protocol_level_errors_use_final_status() {
        let response = XhttpResponse::from_error(&ErrorKind::MissingArguments.into());
        assert_eq!(response.status().as_u16(), 550);
        assert_eq!(response.body(), "106 Missing required arguments");
    }

    #[tokio::test]
    async fn test_status_line_round_trip() {
        let err = XhttpError::internal("boom");
        let response = err.clone().into_response();

        assert_eq!(response.status().as_u16(), 550);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers().get(X_EXCEPTION).unwrap(), "\"boom\"");
        let reason = response.extensions().get::<ReasonPhrase>().unwrap();
        assert_eq!(reason.as_bytes(), b"Exception");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let line = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(line, err.status_line());
        assert_eq!(line, format!("{} {}", err.code(), err.message()));
    }
}
