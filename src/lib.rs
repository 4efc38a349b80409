//! # QRZ.com XML Callbook Client
//!
//! A small async client for the QRZ.com XML callbook service.
//!
//! The client logs in with a username and password, caches the session key the
//! service hands back, and logs in again by itself when a later reply comes
//! back without a key. Replies are not bound to a fixed schema: every XML
//! document is flattened into a [`ResponseMap`] of nested keys, so fields the
//! service adds later show up without a library update.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qrz_callbook::QrzXmlClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = QrzXmlClient::new()?;
//!
//!     let login = client.login("your_username", "your_password").await?;
//!     println!("Session: {:?}", login.get_text("QRZDatabase.Session.Key"));
//!
//!     let record = client.lookup_callsign("KE2EHU").await?;
//!     for (path, value) in record.leaves() {
//!         println!("{} = {}", path, value);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Flattening
//!
//! Element names become keys and attributes sit next to their element as
//! `element.attribute`. When an element repeats under the same parent only
//! the last occurrence is kept; each overwrite is logged at `warn` level.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;
pub mod xml;

pub use client::{QrzXmlClient, QrzXmlClientConfig, SessionStatus};
pub use error::{QrzXmlError, Result};
pub use transport::{HttpTransport, Transport};
pub use types::{Protocol, ResponseMap, SessionInfo, XmlValue};
pub use xml::{flatten, parse_response, XmlElement};

/// Host serving QRZ's XML interface
pub const DEFAULT_HOST: &str = "xmldata.qrz.com";

/// Endpoint path of the current XML interface version
pub const DEFAULT_PATH: &str = "/xml/current/";

/// Root element of every QRZ response
pub const ROOT_ELEMENT: &str = "QRZDatabase";

/// Default user agent string for requests
pub const DEFAULT_USER_AGENT: &str = concat!("qrz-callbook-rs/", env!("CARGO_PKG_VERSION"));
