//! XHTTP error taxonomy.
//!
//! Every error is a fixed `(code, message)` pair plus optional extra
//! response headers:
//!
//! | code    | kind                                  |
//! |---------|---------------------------------------|
//! | 450–454 | request names no/unknown service, action or schema |
//! | 550     | internal exception (`X-Exception` header) |
//! | 551     | protocol version not supported (`X-Version` header) |
//! | 101–109 | protocol-level errors reserved for action dispatch |

use thiserror::Error;

/// Header carrying the JSON-encoded detail of an internal exception.
pub const X_EXCEPTION: &str = "X-Exception";

/// Header carrying the protocol version the node supports.
pub const X_VERSION: &str = "X-Version";

/// Result type for request processing.
pub type XhttpResult<T> = Result<T, XhttpError>;

/// The fixed kinds of XHTTP error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ServiceNotSpecified,
    ActionNotSpecified,
    ServiceNotFound,
    ActionNotFound,
    SchemaNotFound,
    InternalException,
    VersionNotSupported,
    RequestNotReady,
    IncompleteResponse,
    Redirection,
    ClientException,
    ServerException,
    MissingArguments,
    InvalidArgument,
    UnknownException,
    IncompatibleVersion,
}

impl ErrorKind {
    pub const fn code(self) -> u16 {
        match self {
            ErrorKind::ServiceNotSpecified => 450,
            ErrorKind::ActionNotSpecified => 451,
            ErrorKind::ServiceNotFound => 452,
            ErrorKind::ActionNotFound => 453,
            ErrorKind::SchemaNotFound => 454,
            ErrorKind::InternalException => 550,
            ErrorKind::VersionNotSupported => 551,
            ErrorKind::RequestNotReady => 101,
            ErrorKind::IncompleteResponse => 102,
            ErrorKind::Redirection => 103,
            ErrorKind::ClientException => 104,
            ErrorKind::ServerException => 105,
            ErrorKind::MissingArguments => 106,
            ErrorKind::InvalidArgument => 107,
            ErrorKind::UnknownException => 108,
            ErrorKind::IncompatibleVersion => 109,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            ErrorKind::ServiceNotSpecified => "Service Not Specified",
            ErrorKind::ActionNotSpecified => "Action Not Specified",
            ErrorKind::ServiceNotFound => "Service Not Found",
            ErrorKind::ActionNotFound => "Action Not Found",
            ErrorKind::SchemaNotFound => "Schema Not Found",
            ErrorKind::InternalException => "Exception",
            ErrorKind::VersionNotSupported => "XHTTP Version Not Supported",
            ErrorKind::RequestNotReady => "Cannot process response if request not ready",
            ErrorKind::IncompleteResponse => "Cannot return value of incomplete response",
            ErrorKind::Redirection => "Redirection exception",
            ErrorKind::ClientException => "Client exception",
            ErrorKind::ServerException => "Server exception",
            ErrorKind::MissingArguments => "Missing required arguments",
            ErrorKind::InvalidArgument => "Invalid argument passed",
            ErrorKind::UnknownException => "Unknown exception",
            ErrorKind::IncompatibleVersion => "Incompatible protocol version",
        }
    }

    /// Protocol-level errors (1xx) reported by action dispatch.
    pub const fn is_protocol_level(self) -> bool {
        self.code() < 200
    }
}

/// An XHTTP error, ready to be turned into a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} {}", .kind.code(), .kind.message())]
pub struct XhttpError {
    kind: ErrorKind,
    headers: Vec<(String, String)>,
}

impl XhttpError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            headers: Vec::new(),
        }
    }

    /// Internal exception whose detail travels JSON-encoded in `X-Exception`.
    pub fn internal(message: impl AsRef<str>) -> Self {
        Self::new(ErrorKind::InternalException).with_header(X_EXCEPTION, encode_detail(message.as_ref()))
    }

    /// Version mismatch, advertising the version this node supports.
    pub fn version_not_supported(supported: &str) -> Self {
        Self::new(ErrorKind::VersionNotSupported).with_header(X_VERSION, supported)
    }

    /// Wrap a non-protocol error as an internal exception.
    pub fn unexpected<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let type_name = std::any::type_name::<E>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        Self::internal(format!("{}: {}", short, err))
    }

    /// Append a header returned along with the error.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of an attached header (case-insensitive name).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `"{code} {message}"`.
    pub fn status_line(&self) -> String {
        self.to_string()
    }
}

impl From<ErrorKind> for XhttpError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// JSON string encoding with every non-ASCII character escaped, so the
/// result is always a valid header value.
pub fn encode_detail(message: &str) -> String {
    let json = serde_json::Value::from(message).to_string();
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let err = XhttpError::new(ErrorKind::ServiceNotFound);
        assert_eq!(err.status_line(), "452 Service Not Found");
        assert_eq!(err.to_string(), "452 Service Not Found");
        assert!(err.headers().is_empty());
    }

    #[test]
    fn test_codes_are_fixed() {
        assert_eq!(ErrorKind::ServiceNotSpecified.code(), 450);
        assert_eq!(ErrorKind::ActionNotSpecified.code(), 451);
        assert_eq!(ErrorKind::ActionNotFound.code(), 453);
        assert_eq!(ErrorKind::SchemaNotFound.code(), 454);
        assert_eq!(ErrorKind::IncompatibleVersion.code(), 109);
        assert!(ErrorKind::MissingArguments.is_protocol_level());
        assert!(!ErrorKind::InternalException.is_protocol_level());
    }

    #[test]
    fn test_internal_attaches_json_detail() {
        let err = XhttpError::internal("Missing X-Version header");
        assert_eq!(err.code(), 550);
        assert_eq!(err.status_line(), "550 Exception");
        assert_eq!(err.header("x-exception"), Some("\"Missing X-Version header\""));
    }

    #[test]
    fn test_version_not_supported_advertises_version() {
        let err = XhttpError::version_not_supported("1.0");
        assert_eq!(err.status_line(), "551 XHTTP Version Not Supported");
        assert_eq!(err.header(X_VERSION), Some("1.0"));
    }

    #[test]
    fn test_unexpected_uses_short_type_name() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = XhttpError::unexpected(&io);
        assert_eq!(err.header(X_EXCEPTION), Some("\"Error: disk gone\""));
    }

    #[test]
    fn test_encode_detail_escapes_non_ascii() {
        assert_eq!(encode_detail("a\"b"), r#""a\"b""#);
        assert_eq!(encode_detail("café"), r#""caf\u00e9""#);
        assert_eq!(encode_detail("🎈"), r#""\ud83c\udf88""#);
    }
}
