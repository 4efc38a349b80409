//! Session-aware QRZ.com XML client.

use crate::error::{QrzXmlError, Result};
use crate::transport::{HttpTransport, Transport};
use crate::types::{Protocol, ResponseMap, SessionInfo};
use crate::xml::parse_response;
use crate::{DEFAULT_HOST, DEFAULT_PATH, DEFAULT_USER_AGENT};
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};
use url::Url;

/// Configuration for the QRZ client
#[derive(Debug, Clone)]
pub struct QrzXmlClientConfig {
    /// Host (optionally with port) serving the XML interface
    pub host: String,
    /// Fixed endpoint path on that host
    pub path: String,
    /// User agent string for HTTP requests, also sent as `agent` on login
    pub user_agent: String,
    /// Request timeout in seconds; `None` keeps the HTTP client default
    pub timeout_seconds: Option<u64>,
}

impl Default for QrzXmlClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            path: DEFAULT_PATH.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: None,
        }
    }
}

/// Where the client stands with the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No login has succeeded yet
    NoSession,
    /// Credentials are known but no session key is cached
    Unauthenticated,
    /// A session key is cached
    Authenticated,
}

#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Internal session state
#[derive(Debug, Clone, Default)]
struct SessionState {
    credentials: Option<Credentials>,
    protocol: Protocol,
    /// Set by the first login that yields a key, never reset
    established: bool,
    key: Option<String>,
    count: Option<u32>,
    sub_exp: Option<String>,
}

impl SessionState {
    fn update_from_session_info(&mut self, session: &SessionInfo) {
        if let Some(key) = &session.key {
            self.key = Some(key.clone());
        }
        if let Some(count) = session.count {
            self.count = Some(count);
        }
        if let Some(sub_exp) = &session.sub_exp {
            self.sub_exp = Some(sub_exp.clone());
        }
    }

    fn status(&self) -> SessionStatus {
        match (self.usable_credentials(), &self.key) {
            (None, _) => SessionStatus::NoSession,
            (Some(_), None) => SessionStatus::Unauthenticated,
            (Some(_), Some(_)) => SessionStatus::Authenticated,
        }
    }

    /// Credentials that may be replayed on re-authentication
    fn usable_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|_| self.established)
    }

    fn clear(&mut self) {
        self.key = None;
        self.count = None;
        self.sub_exp = None;
    }
}

/// Main QRZ.com XML API client.
///
/// Owns its session: log in once, then every query reuses the cached key and
/// logs in again at most once when the service stops returning one.
pub struct QrzXmlClient<T = HttpTransport> {
    /// Request transport
    transport: T,
    /// Client configuration
    config: QrzXmlClientConfig,
    /// Current session state
    session: RwLock<SessionState>,
}

impl QrzXmlClient<HttpTransport> {
    /// Create a new QRZ client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(QrzXmlClientConfig::default())
    }

    /// Create a new QRZ client with custom configuration
    pub fn with_config(config: QrzXmlClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: Transport> QrzXmlClient<T> {
    /// Create a client that sends its requests through `transport`
    pub fn with_transport(transport: T, config: QrzXmlClientConfig) -> Self {
        Self {
            transport,
            config,
            session: RwLock::new(SessionState::default()),
        }
    }

    /// Log in over HTTPS and return the full login response
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<ResponseMap> {
        self.login_with_protocol(username, password, Protocol::Https)
            .await
    }

    /// Log in using the given protocol.
    ///
    /// The cached session key is dropped and the new credentials and protocol
    /// replace the old ones before the request is sent. If the login fails,
    /// later queries re-authenticate with these credentials, never earlier
    /// ones. Until some login has succeeded, queries fail with `NoSession`.
    pub async fn login_with_protocol(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        protocol: Protocol,
    ) -> Result<ResponseMap> {
        let credentials = Credentials {
            username: username.into(),
            password: password.into(),
        };
        info!(username = %credentials.username, %protocol, "Logging in to QRZ.com");

        {
            let mut session = self.session.write().await;
            session.protocol = protocol;
            session.credentials = Some(credentials.clone());
            session.clear();
        }

        let response = self.authenticate(protocol, &credentials, &[]).await?;

        info!("Successfully authenticated with QRZ.com");
        Ok(response)
    }

    /// Look up a callsign record
    pub async fn lookup_callsign(&self, callsign: &str) -> Result<ResponseMap> {
        // NoSession takes precedence over input errors; `query` checks again.
        self.require_session().await?;

        let callsign = callsign.trim().to_uppercase();
        if callsign.is_empty() {
            return Err(QrzXmlError::invalid_input("Callsign cannot be empty"));
        }
        debug!(callsign = %callsign, "Looking up callsign");

        let response = self.query(&[("callsign", &callsign)]).await?;
        reject_session_error(response)
    }

    /// Look up a DXCC entity by number, by callsign prefix, or `all`
    pub async fn lookup_dxcc(&self, entity: &str) -> Result<ResponseMap> {
        // NoSession takes precedence over input errors; `query` checks again.
        self.require_session().await?;

        let entity = entity.trim();
        if entity.is_empty() {
            return Err(QrzXmlError::invalid_input("DXCC entity cannot be empty"));
        }
        if entity.eq_ignore_ascii_case("all") {
            warn!("Fetching all DXCC entities - use sparingly to avoid server overload");
        }
        debug!(entity = %entity, "Looking up DXCC entity");

        let response = self.query(&[("dxcc", entity)]).await?;
        reject_session_error(response)
    }

    /// Run a session-aware query.
    ///
    /// Uses the cached key when there is one. If the reply carries no key the
    /// session is treated as expired and the stored credentials are sent once
    /// with the same parameters.
    pub async fn query(&self, params: &[(&str, &str)]) -> Result<ResponseMap> {
        let (credentials, protocol, key) = {
            let session = self.session.read().await;
            (
                session.usable_credentials().cloned(),
                session.protocol,
                session.key.clone(),
            )
        };
        let credentials = credentials.ok_or(QrzXmlError::NoSession)?;

        if let Some(key) = key {
            let mut all_params = vec![("s", key.as_str())];
            all_params.extend_from_slice(params);

            let response = self.fetch(protocol, &all_params).await?;
            let session_info = SessionInfo::from_response(&response);
            if session_info.has_valid_session() {
                self.session
                    .write()
                    .await
                    .update_from_session_info(&session_info);
                return Ok(response);
            }

            warn!(
                error = session_info.error_message().unwrap_or_default(),
                "Session expired, re-authenticating"
            );
            self.session.write().await.key = None;
        }

        self.authenticate(protocol, &credentials, params).await
    }

    /// Force re-authentication with the stored credentials
    pub async fn reauthenticate(&self) -> Result<ResponseMap> {
        let (credentials, protocol) = {
            let mut session = self.session.write().await;
            session.clear();
            (session.usable_credentials().cloned(), session.protocol)
        };
        let credentials = credentials.ok_or(QrzXmlError::NoSession)?;
        self.authenticate(protocol, &credentials, &[]).await
    }

    /// Current position in the session lifecycle
    pub async fn status(&self) -> SessionStatus {
        self.session.read().await.status()
    }

    /// Check if currently authenticated
    pub async fn is_authenticated(&self) -> bool {
        self.status().await == SessionStatus::Authenticated
    }

    /// Lookup count and subscription expiry from the last response
    pub async fn session_info(&self) -> (Option<u32>, Option<String>) {
        let session = self.session.read().await;
        (session.count, session.sub_exp.clone())
    }

    async fn require_session(&self) -> Result<()> {
        match self.status().await {
            SessionStatus::NoSession => Err(QrzXmlError::NoSession),
            _ => Ok(()),
        }
    }

    /// Send credentials plus `params`; a key in the reply starts a session
    async fn authenticate(
        &self,
        protocol: Protocol,
        credentials: &Credentials,
        params: &[(&str, &str)],
    ) -> Result<ResponseMap> {
        let mut all_params = vec![
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("agent", self.config.user_agent.as_str()),
        ];
        all_params.extend_from_slice(params);

        debug!(username = %credentials.username, "Authenticating with QRZ.com");
        let response = self.fetch(protocol, &all_params).await?;
        let session_info = SessionInfo::from_response(&response);

        let mut session = self.session.write().await;
        if session_info.has_valid_session() {
            session.update_from_session_info(&session_info);
            session.established = true;
            return Ok(response);
        }

        session.key = None;
        match session_info.error {
            Some(error) => Err(QrzXmlError::session(error)),
            None => Err(QrzXmlError::Unknown),
        }
    }

    /// One round trip: build the URL, GET it, flatten the XML body
    async fn fetch(&self, protocol: Protocol, params: &[(&str, &str)]) -> Result<ResponseMap> {
        let url = self.build_url(protocol, params)?;
        let body = self.transport.get(&url).await?;
        trace!(body = %body, "Received XML response");

        parse_response(&body).map_err(|e| {
            warn!(error = %e, "Failed to parse XML response");
            e
        })
    }

    /// Build the request URL for the fixed endpoint
    pub fn build_url(&self, protocol: Protocol, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}://{}{}",
            protocol, self.config.host, self.config.path
        ))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }
}

fn reject_session_error(response: ResponseMap) -> Result<ResponseMap> {
    match SessionInfo::from_response(&response).error {
        Some(error) => Err(QrzXmlError::session(error)),
        None => Ok(response),
    }
}
