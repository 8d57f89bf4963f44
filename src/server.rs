//! Server-side Hawk verification.
//!
//! A `Server` checks incoming `Authorization` headers in this order: header syntax, required
//! attributes, credentials lookup, MAC, timestamp skew, nonce replay, and finally (when the
//! body is available) the payload hash.  Each failure is a distinct `Error` variant; a stale
//! timestamp carries a `WWW-Authenticate` challenge that lets the client correct its clock.

use crate::artifacts::Artifacts;
use crate::context::{Clock, SYSTEM_CLOCK};
use crate::credentials::Credentials;
use crate::crypto;
use crate::error::*;
use crate::header::{Header, REQUEST_ATTRIBUTES};
use crate::mac::{Mac, MacType};
use crate::payload::PayloadHasher;
use crate::replay::{within_skew, NonceStore};
use crate::request::Request;
use crate::response::ResponseBuilder;
use crate::util::offset_by_ms;
use log::{debug, trace};
use std::fmt;
use std::time::{Duration, SystemTime};

/// The default allowed difference between a request's timestamp and the server's clock.
pub const DEFAULT_TIMESTAMP_SKEW: Duration = Duration::from_secs(60);

/// A source of credentials, keyed by id.  `Ok(None)` means the id is unknown.  Any function
/// or closure with the same signature is a `CredentialsLookup`.
pub trait CredentialsLookup: Send + Sync {
    fn lookup(&self, id: &str) -> Result<Option<Credentials>>;
}

impl<F> CredentialsLookup for F
where
    F: Fn(&str) -> Result<Option<Credentials>> + Send + Sync,
{
    fn lookup(&self, id: &str) -> Result<Option<Credentials>> {
        self(id)
    }
}

/// A successfully authenticated request: the credentials it was signed with, and the
/// artifacts needed to sign the response.
#[derive(Debug)]
pub struct Authenticated {
    pub credentials: Credentials,
    pub artifacts: Artifacts,
}

/// Options for `Server::header`.
#[derive(Debug, Clone, Default)]
pub struct ResponseOptions<'a> {
    pub ext: Option<&'a str>,

    /// The response body, to be hashed and bound to the MAC
    pub payload: Option<&'a [u8]>,
    pub content_type: Option<&'a str>,

    /// A precomputed payload hash; takes precedence over `payload`
    pub hash: Option<&'a [u8]>,
}

/// A Hawk server.
pub struct Server<'a> {
    credentials: &'a dyn CredentialsLookup,
    nonces: &'a dyn NonceStore,
    clock: &'a dyn Clock,
    timestamp_skew: Duration,
    localtime_offset_ms: i64,
}

impl<'a> Server<'a> {
    pub fn new(credentials: &'a dyn CredentialsLookup, nonces: &'a dyn NonceStore) -> Self {
        Server {
            credentials,
            nonces,
            clock: &SYSTEM_CLOCK,
            timestamp_skew: DEFAULT_TIMESTAMP_SKEW,
            localtime_offset_ms: 0,
        }
    }

    /// Use `clock` instead of the system clock.
    pub fn clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the allowed difference between request timestamps and the server's clock.
    pub fn timestamp_skew(mut self, skew: Duration) -> Self {
        self.timestamp_skew = skew;
        self
    }

    /// Milliseconds added to the clock's reading.
    pub fn localtime_offset_ms(mut self, offset_ms: i64) -> Self {
        self.localtime_offset_ms = offset_ms;
        self
    }

    fn now(&self) -> SystemTime {
        offset_by_ms(self.clock.now(), self.localtime_offset_ms)
    }

    /// Authenticate a request.  If `payload` is given, the request must also carry a
    /// matching payload hash; otherwise the hash can be checked later with
    /// `authenticate_payload` or `authenticate_payload_hash`.
    pub fn authenticate(&self, request: &Request, payload: Option<&[u8]>) -> Result<Authenticated> {
        if request.method.is_empty() || request.host.is_empty() || request.port == 0 {
            return Err(Error::InvalidArgumentType);
        }
        let authorization = request.authorization.ok_or_else(|| {
            debug!("request has no authorization header");
            Error::HeaderParseError("Missing authorization header".to_string())
        })?;
        let header = Header::parse_restricted(authorization, REQUEST_ATTRIBUTES)?;
        let artifacts = Artifacts::from_request_header(request, &header)?;
        trace!(
            "authenticating {} {} for id {}",
            artifacts.method,
            artifacts.resource,
            artifacts.id
        );

        let credentials = self.lookup(&artifacts.id)?;
        self.check_mac(MacType::Header, &credentials, &artifacts)?;
        self.check_freshness(&credentials, &artifacts)?;

        if let Some(payload) = payload {
            self.authenticate_payload(payload, &credentials, &artifacts, request.content_type)?;
        }

        Ok(Authenticated {
            credentials,
            artifacts,
        })
    }

    /// Check a request body against the hash in an already-authenticated request.
    pub fn authenticate_payload(
        &self,
        payload: &[u8],
        credentials: &Credentials,
        artifacts: &Artifacts,
        content_type: Option<&str>,
    ) -> Result<()> {
        let hash = PayloadHasher::hash(
            content_type.unwrap_or(""),
            credentials.key.algorithm(),
            payload,
        )?;
        self.authenticate_payload_hash(&hash, artifacts)
    }

    /// Check a precomputed payload hash against the hash in an already-authenticated request.
    pub fn authenticate_payload_hash(&self, hash: &[u8], artifacts: &Artifacts) -> Result<()> {
        match artifacts.hash {
            None => {
                debug!("request for id {} is missing a payload hash", artifacts.id);
                Err(Error::MissingPayloadHash)
            }
            Some(ref expected) => {
                if crypto::timing_safe_equal(hash, expected) {
                    Ok(())
                } else {
                    debug!("payload hash mismatch for id {}", artifacts.id);
                    Err(Error::BadPayloadHash)
                }
            }
        }
    }

    /// Generate a `Server-Authorization` header value for the response to an authenticated
    /// request.
    pub fn header(
        &self,
        credentials: &Credentials,
        artifacts: &Artifacts,
        options: &ResponseOptions,
    ) -> Result<String> {
        let hash = match (options.hash, options.payload) {
            (Some(hash), _) => Some(hash.to_vec()),
            (None, Some(payload)) => Some(PayloadHasher::hash(
                options.content_type.unwrap_or(""),
                credentials.key.algorithm(),
                payload,
            )?),
            (None, None) => None,
        };
        let ext = options.ext.filter(|e| !e.is_empty());
        ResponseBuilder::from_artifacts(artifacts)
            .hash(hash)
            .ext(ext)
            .response()
            .make_header(&credentials.key)?
            .header_value()
    }

    /// Authenticate a message produced by `client::message` and sent to `host`:`port`.
    /// `authorization` carries the id, ts, nonce, hash and mac the client sent with it.
    pub fn authenticate_message<B>(
        &self,
        host: &str,
        port: u16,
        message: B,
        authorization: &Artifacts,
    ) -> Result<Credentials>
    where
        B: AsRef<[u8]>,
    {
        if host.is_empty() || port == 0 {
            return Err(Error::InvalidArgumentType);
        }
        if authorization.id.is_empty()
            || authorization.nonce.is_empty()
            || authorization.hash.is_none()
            || authorization.mac.is_none()
        {
            return Err(Error::MissingAttributes);
        }

        let credentials = self.lookup(&authorization.id)?;
        let artifacts = Artifacts {
            id: authorization.id.clone(),
            ts: authorization.ts,
            nonce: authorization.nonce.clone(),
            host: host.to_string(),
            port,
            hash: authorization.hash.clone(),
            mac: authorization.mac.clone(),
            ..Default::default()
        };
        self.check_mac(MacType::Message, &credentials, &artifacts)?;
        self.check_freshness(&credentials, &artifacts)?;
        self.authenticate_payload(message.as_ref(), &credentials, &artifacts, None)?;
        Ok(credentials)
    }

    /// Generate a timestamp challenge: the server's current time and its `tsm`, for a
    /// `WWW-Authenticate` header.
    pub fn timestamp_message(&self, credentials: &Credentials) -> Result<Header> {
        let now = self.now();
        Ok(Header {
            ts: Some(now),
            tsm: Some(Mac::timestamp(&credentials.key, now)?),
            ..Default::default()
        })
    }

    fn lookup(&self, id: &str) -> Result<Credentials> {
        match self.credentials.lookup(id)? {
            Some(credentials) => Ok(credentials),
            None => {
                debug!("unknown credentials id {}", id);
                Err(Error::UnknownCredentials)
            }
        }
    }

    fn check_mac(
        &self,
        mac_type: MacType,
        credentials: &Credentials,
        artifacts: &Artifacts,
    ) -> Result<()> {
        let calculated = Mac::new(mac_type, &credentials.key, artifacts)?;
        if artifacts.mac.as_ref() != Some(&calculated) {
            debug!("bad {} mac for id {}", mac_type, artifacts.id);
            return Err(Error::MacMismatch);
        }
        Ok(())
    }

    fn check_freshness(&self, credentials: &Credentials, artifacts: &Artifacts) -> Result<()> {
        if !within_skew(artifacts.ts, self.now(), self.timestamp_skew) {
            debug!("stale timestamp for id {}", artifacts.id);
            let mut challenge = self.timestamp_message(credentials)?;
            challenge.error = Some("Stale timestamp".to_string());
            return Err(Error::StaleTimestamp { challenge });
        }
        if !self
            .nonces
            .check_and_record(&artifacts.id, &artifacts.nonce, artifacts.ts)
        {
            debug!("replayed nonce for id {}", artifacts.id);
            return Err(Error::ReplayedNonce);
        }
        Ok(())
    }
}

impl<'a> fmt::Debug for Server<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Server")
            .field("timestamp_skew", &self.timestamp_skew)
            .field("localtime_offset_ms", &self.localtime_offset_ms)
            .finish()
    }
}
