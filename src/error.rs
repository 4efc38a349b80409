//! Error types for the QRZ callbook client.

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, QrzXmlError>;

/// Every way a login or lookup can fail
#[derive(Error, Debug)]
pub enum QrzXmlError {
    /// A query was attempted before any login succeeded
    #[error("No session - log in before querying")]
    NoSession,

    /// The service answered with a non-success HTTP status
    #[error("Transport error: HTTP {status} {message}")]
    Transport { status: u16, message: String },

    /// Connection-level failure (DNS, TLS, timeout, body read)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body is not well-formed XML
    #[error("XML parsing error: {0}")]
    XmlParsing(#[from] quick_xml::Error),

    /// The XML was readable but not a complete document
    #[error("Malformed XML document: {message}")]
    MalformedDocument { message: String },

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    UrlParsing(#[from] url::ParseError),

    /// The service reported a session or lookup failure in `Session.Error`
    #[error("QRZ session error: {message}")]
    Session { message: String },

    /// A failure response carried no error message
    #[error("Unknown error - no session key and no error message in response")]
    Unknown,

    /// Invalid input provided
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl QrzXmlError {
    /// Create a new transport error from an HTTP status
    pub fn transport(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create a new malformed document error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDocument {
            message: message.into(),
        }
    }

    /// Create a new session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session {
            message: message.into(),
        }
    }

    /// Create a new invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// HTTP-level failure, either a bad status or no response at all
    pub fn is_transport_error(&self) -> bool {
        matches!(self, QrzXmlError::Transport { .. } | QrzXmlError::Network(_))
    }

    /// The response body could not be turned into a document
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            QrzXmlError::XmlParsing(_) | QrzXmlError::MalformedDocument { .. }
        )
    }

    /// The service itself rejected the request
    pub fn is_session_error(&self) -> bool {
        matches!(self, QrzXmlError::Session { .. } | QrzXmlError::Unknown)
    }
}
