//! Error types for the lot/plan search pipeline
//!
//! Only dispatching can fail in a way the caller has to report. Parsing and
//! normalization degrade to empty values instead of erroring.

use thiserror::Error;

use crate::dispatch::DispatchTicket;

/// Failure talking to the cadastral resolver
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Resolver transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Resolver returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed resolver response: {message}")]
    Malformed { message: String },
}

impl DispatchError {
    pub fn malformed(message: impl Into<String>) -> Self {
        DispatchError::Malformed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(error: serde_json::Error) -> Self {
        DispatchError::malformed(error.to_string())
    }
}

/// A search cycle that reached the resolver and failed
#[derive(Error, Debug)]
#[error("Search {ticket} failed: {source}")]
pub struct SearchError {
    pub ticket: DispatchTicket,
    #[source]
    pub source: DispatchError,
}

/// KML serialization errors
#[derive(Error, Debug)]
pub enum KmlError {
    #[error("XML write error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("KML output was not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Shapefile encoding and archive errors
#[derive(Error, Debug)]
pub enum ShapefileError {
    #[error("Zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Shapefile {part} exceeds the format's size limit")]
    TooLarge { part: &'static str },
}

/// Invalid environment configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
