//! Read-only view of the XHTTP headers of a request.
//!
//! # Headers
//! - `X-Mode`: `version` | `info` | `schema` | `perform`
//! - `X-Version`: protocol version, must match the node's
//! - `X-Service`: `name` or `name;version`
//! - `X-Action`: action name (perform mode)
//! - `X-Arguments`: `name1;type1,name2;type2,...` with integer type codes
//! - `X-Encoding`: argument encoding, defaults to `x-user-defined`

use axum::http::HeaderMap;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::protocol::error::{XhttpError, XhttpResult};

pub const X_MODE: &str = "x-mode";
pub const X_VERSION: &str = "x-version";
pub const X_SERVICE: &str = "x-service";
pub const X_ACTION: &str = "x-action";
pub const X_ARGUMENTS: &str = "x-arguments";
pub const X_ENCODING: &str = "x-encoding";

/// Encoding assumed when a request carries no `X-Encoding`.
pub const DEFAULT_ENCODING: &str = "x-user-defined";

/// What a request asks the node to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// List the versions a service supports.
    Version,
    /// Describe a service.
    Info,
    /// Describe a service's actions.
    Schema,
    /// Invoke an action.
    Perform,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Version => "version",
            Mode::Info => "info",
            Mode::Schema => "schema",
            Mode::Perform => "perform",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised `X-Mode` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "version" => Ok(Mode::Version),
            "info" => Ok(Mode::Info),
            "schema" => Ok(Mode::Schema),
            "perform" => Ok(Mode::Perform),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Parsed `X-Service` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    /// Optional version suffix after `;`. Carried, not used for lookup.
    pub version: Option<String>,
}

impl ServiceSpec {
    pub fn parse(value: &str) -> Self {
        match value.split_once(';') {
            Some((name, version)) => Self {
                name: name.to_string(),
                version: Some(version.to_string()),
            },
            None => Self {
                name: value.to_string(),
                version: None,
            },
        }
    }
}

/// Declared argument types from `X-Arguments`, name → type code.
pub type ArgumentTypes = BTreeMap<String, i64>;

/// Parse an `X-Arguments` value.
pub fn parse_arguments(value: &str) -> XhttpResult<ArgumentTypes> {
    let mut args = ArgumentTypes::new();
    for item in value.split(',') {
        let (name, type_code) = item.split_once(';').unwrap_or((item, ""));
        let code = type_code.trim().parse::<i64>().map_err(|_| {
            XhttpError::internal(format!(
                "Invalid XHTTP data type {} for argument {}",
                type_code, name
            ))
        })?;
        args.insert(name.to_string(), code);
    }
    Ok(args)
}

/// The XHTTP side of an HTTP request.
#[derive(Debug, Clone, Copy)]
pub struct XhttpRequest<'a> {
    headers: &'a HeaderMap,
}

impl<'a> XhttpRequest<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        Self { headers }
    }

    /// Header value as text; values that are not visible ASCII are an
    /// internal error.
    pub fn header(&self, name: &str) -> XhttpResult<Option<&'a str>> {
        match self.headers.get(name) {
            None => Ok(None),
            Some(value) => value
                .to_str()
                .map(Some)
                .map_err(|_| XhttpError::internal(format!("Invalid {} header", display_name(name)))),
        }
    }

    /// Raw `X-Mode`, if present.
    pub fn raw_mode(&self) -> XhttpResult<Option<&'a str>> {
        self.header(X_MODE)
    }

    /// `X-Mode`, defaulting to `perform` when absent.
    pub fn mode(&self) -> XhttpResult<Result<Mode, UnknownMode>> {
        Ok(self.raw_mode()?.unwrap_or("perform").parse())
    }

    pub fn version(&self) -> XhttpResult<Option<&'a str>> {
        self.header(X_VERSION)
    }

    pub fn service(&self) -> XhttpResult<Option<ServiceSpec>> {
        Ok(self.header(X_SERVICE)?.map(ServiceSpec::parse))
    }

    pub fn action(&self) -> XhttpResult<Option<&'a str>> {
        self.header(X_ACTION)
    }

    /// Declared argument types, `None` when the header is absent.
    pub fn arguments(&self) -> XhttpResult<Option<ArgumentTypes>> {
        self.header(X_ARGUMENTS)?.map(parse_arguments).transpose()
    }

    /// `X-Encoding`, or `default` when absent.
    pub fn encoding(&self, default: &'a str) -> XhttpResult<&'a str> {
        Ok(self.header(X_ENCODING)?.unwrap_or(default))
    }
}

/// `x-service` → `X-Service`, for messages.
pub fn display_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
