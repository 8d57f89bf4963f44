//! Client-side Hawk operations: building `Authorization` headers, validating the server's
//! response, authenticating messages, and learning the server's clock offset.
//!
//! The free functions in this module use the default `Context` (the system clock and random
//! nonces).  Use a `Client` to supply a different clock or nonce generator.
//!
//! These entry points never return an `Error`.  `header` reports failures in
//! `HeaderResult::err`, `authenticate` returns `false`, and `message` returns `None`.  The
//! underlying reason is logged at debug level.

use crate::artifacts::Artifacts;
use crate::context::Context;
use crate::credentials::Credentials;
use crate::error::*;
use crate::header::{Header, CHALLENGE_ATTRIBUTES, RESPONSE_ATTRIBUTES};
use crate::mac::{Mac, MacType};
use crate::payload::PayloadHasher;
use crate::request::RequestBuilder;
use crate::response::ResponseBuilder;
use crate::util::{offset_by_ms, signed_ms_between};
use log::debug;
use std::time::SystemTime;
use url::Url;

/// Options for `header`.  Only `credentials` is required.
#[derive(Debug, Clone, Default)]
pub struct HeaderOptions<'a> {
    pub credentials: Option<&'a Credentials>,

    /// Timestamp to use instead of the current time
    pub timestamp: Option<SystemTime>,

    /// Nonce to use instead of a freshly generated one
    pub nonce: Option<&'a str>,

    /// Application-specific data sent with, and covered by the MAC of, the request.  An
    /// empty string is the same as `None`.
    pub ext: Option<&'a str>,

    /// The request body, to be hashed and bound to the MAC
    pub payload: Option<&'a [u8]>,

    /// The content type of `payload`
    pub content_type: Option<&'a str>,

    /// A precomputed payload hash; takes precedence over `payload`
    pub hash: Option<&'a [u8]>,

    pub app: Option<&'a str>,

    /// Delegated-by application id; only sent with `app`
    pub dlg: Option<&'a str>,

    /// Milliseconds to add to the local clock, typically from `clock_offset`
    pub localtime_offset_ms: i64,
}

/// The result of `header`: either a header value and the artifacts it describes, or an
/// error message.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderResult {
    /// The `Authorization` header value; empty on failure
    pub field: String,
    pub artifacts: Option<Artifacts>,
    pub err: Option<String>,
}

/// The parts of a server's response that `authenticate` examines.
#[derive(Debug, Clone, Default)]
pub struct ServerResponse<'a> {
    pub server_authorization: Option<&'a str>,
    pub www_authenticate: Option<&'a str>,
    pub content_type: Option<&'a str>,
}

/// Options for `authenticate`.
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions<'a> {
    /// The response body.  When given, the response must carry a matching payload hash;
    /// otherwise any hash in the response is not checked.
    pub payload: Option<&'a [u8]>,

    /// Fail if the response has no `Server-Authorization` header
    pub required: bool,
}

/// Options for `message`.  Only `credentials` is required.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions<'a> {
    pub credentials: Option<&'a Credentials>,
    pub timestamp: Option<SystemTime>,
    pub nonce: Option<&'a str>,
    pub localtime_offset_ms: i64,
}

/// A Hawk client, carrying the `Context` used to generate timestamps and nonces.
#[derive(Debug, Clone, Copy, Default)]
pub struct Client<'a> {
    context: Context<'a>,
}

impl<'a> Client<'a> {
    pub fn new(context: Context<'a>) -> Self {
        Client { context }
    }

    /// Generate an `Authorization` header value for a request to `uri` with `method`.
    pub fn header(&self, uri: &str, method: &str, options: Option<&HeaderOptions>) -> HeaderResult {
        match self.make_header(uri, method, options) {
            Ok((field, artifacts)) => HeaderResult {
                field,
                artifacts: Some(artifacts),
                err: None,
            },
            Err(e) => {
                debug!("could not generate Hawk header: {}", e);
                HeaderResult {
                    field: String::new(),
                    artifacts: None,
                    err: Some(e.to_string()),
                }
            }
        }
    }

    fn make_header(
        &self,
        uri: &str,
        method: &str,
        options: Option<&HeaderOptions>,
    ) -> Result<(String, Artifacts)> {
        if uri.is_empty() || method.is_empty() {
            return Err(Error::InvalidArgumentType);
        }
        let options = options.ok_or(Error::InvalidArgumentType)?;
        let credentials = options.credentials.ok_or(Error::InvalidCredentialObject)?;
        let url = Url::parse(uri).map_err(|_| Error::InvalidArgumentType)?;
        let (host, port, resource) = RequestBuilder::parse_url(&url)?;

        let hash = match (options.hash, options.payload) {
            (Some(hash), _) => Some(hash.to_vec()),
            (None, Some(payload)) => Some(PayloadHasher::hash(
                options.content_type.unwrap_or(""),
                credentials.key.algorithm(),
                payload,
            )?),
            (None, None) => None,
        };

        let app = options.app.filter(|a| !a.is_empty());
        let dlg = options.dlg.filter(|d| !d.is_empty());
        let mut artifacts = Artifacts {
            id: credentials.id.clone(),
            ts: self.timestamp(options.timestamp, options.localtime_offset_ms),
            nonce: self.nonce(options.nonce)?,
            method: method.to_string(),
            host: host.to_string(),
            port,
            resource: resource.to_string(),
            hash,
            ext: options.ext.filter(|e| !e.is_empty()).map(|e| e.to_string()),
            app: app.map(|a| a.to_string()),
            dlg: app.and(dlg).map(|d| d.to_string()),
            mac: None,
        };
        artifacts.mac = Some(Mac::new(MacType::Header, &credentials.key, &artifacts)?);

        // attribute values the header syntax cannot carry are the caller's bad arguments
        let field = match artifacts.request_header().header_value() {
            Err(Error::BadAttributeValue(_)) => return Err(Error::InvalidArgumentType),
            res => res?,
        };
        Ok((field, artifacts))
    }

    /// Validate a server's response to a request made with `artifacts`.
    ///
    /// A `WWW-Authenticate` challenge carrying a timestamp must carry a valid `tsm`.  A
    /// challenge with only an `error` is accepted as is.  If there is a
    /// `Server-Authorization` header, its MAC must match; if the caller supplies the response
    /// payload, its hash must match too.
    pub fn authenticate(
        &self,
        response: &ServerResponse,
        credentials: Option<&Credentials>,
        artifacts: Option<&Artifacts>,
        options: Option<&AuthenticateOptions>,
    ) -> bool {
        match self.validate_response(response, credentials, artifacts, options) {
            Ok(valid) => valid,
            Err(e) => {
                debug!("rejecting server response: {}", e);
                false
            }
        }
    }

    fn validate_response(
        &self,
        response: &ServerResponse,
        credentials: Option<&Credentials>,
        artifacts: Option<&Artifacts>,
        options: Option<&AuthenticateOptions>,
    ) -> Result<bool> {
        let default_options = AuthenticateOptions::default();
        let options = options.unwrap_or(&default_options);

        if let Some(www_authenticate) = response.www_authenticate {
            let challenge = Header::parse_restricted(www_authenticate, CHALLENGE_ATTRIBUTES)?;
            match challenge.ts {
                Some(_) => {
                    let credentials = credentials.ok_or(Error::InvalidCredentialObject)?;
                    validate_challenge(&challenge, credentials)?;
                }
                None => {
                    if challenge.error.is_some() {
                        return Ok(true);
                    }
                }
            }
        }

        let server_authorization = match response.server_authorization {
            Some(value) => value,
            None => return Ok(!options.required),
        };
        let header = Header::parse_restricted(server_authorization, RESPONSE_ATTRIBUTES)?;
        let credentials = credentials.ok_or(Error::InvalidCredentialObject)?;
        let artifacts = artifacts.ok_or(Error::InvalidArgumentType)?;

        let hash = match options.payload {
            Some(payload) => Some(PayloadHasher::hash(
                response.content_type.unwrap_or(""),
                credentials.key.algorithm(),
                payload,
            )?),
            None => None,
        };
        let response = ResponseBuilder::from_artifacts(artifacts).hash(hash).response();
        Ok(response.validate_header(&header, &credentials.key))
    }

    /// Generate the authorization artifacts for an arbitrary message sent to `host`:`port`.
    pub fn message<B>(
        &self,
        host: &str,
        port: u16,
        message: B,
        options: Option<&MessageOptions>,
    ) -> Option<Artifacts>
    where
        B: AsRef<[u8]>,
    {
        match self.make_message(host, port, message.as_ref(), options) {
            Ok(artifacts) => Some(artifacts),
            Err(e) => {
                debug!("could not authenticate message: {}", e);
                None
            }
        }
    }

    fn make_message(
        &self,
        host: &str,
        port: u16,
        message: &[u8],
        options: Option<&MessageOptions>,
    ) -> Result<Artifacts> {
        if host.is_empty() || port == 0 {
            return Err(Error::InvalidArgumentType);
        }
        let options = options.ok_or(Error::InvalidArgumentType)?;
        let credentials = options.credentials.ok_or(Error::InvalidCredentialObject)?;

        let mut artifacts = Artifacts {
            id: credentials.id.clone(),
            ts: self.timestamp(options.timestamp, options.localtime_offset_ms),
            nonce: self.nonce(options.nonce)?,
            host: host.to_string(),
            port,
            hash: Some(PayloadHasher::hash("", credentials.key.algorithm(), message)?),
            ..Default::default()
        };
        artifacts.mac = Some(Mac::new(MacType::Message, &credentials.key, &artifacts)?);
        Ok(artifacts)
    }

    /// Validate a `WWW-Authenticate` timestamp challenge and return the server's clock minus
    /// the local clock, in milliseconds.  The result is suitable for `localtime_offset_ms`.
    pub fn clock_offset(&self, www_authenticate: &str, credentials: &Credentials) -> Option<i64> {
        let challenge = match Header::parse_restricted(www_authenticate, CHALLENGE_ATTRIBUTES) {
            Ok(challenge) => challenge,
            Err(e) => {
                debug!("could not parse timestamp challenge: {}", e);
                return None;
            }
        };
        let ts = challenge.ts?;
        if let Err(e) = validate_challenge(&challenge, credentials) {
            debug!("rejecting timestamp challenge: {}", e);
            return None;
        }
        let offset = signed_ms_between(self.context.clock.now(), ts);
        if offset.is_none() {
            debug!("timestamp challenge offset out of range");
        }
        offset
    }

    fn timestamp(&self, timestamp: Option<SystemTime>, offset_ms: i64) -> SystemTime {
        match timestamp {
            Some(ts) => ts,
            None => offset_by_ms(self.context.now(), offset_ms),
        }
    }

    fn nonce(&self, nonce: Option<&str>) -> Result<String> {
        match nonce {
            Some("") => Err(Error::InvalidArgumentType),
            Some(nonce) => Ok(nonce.to_string()),
            None => self.context.nonce(),
        }
    }
}

/// Check that a challenge's `tsm` is the MAC of its `ts` under `credentials`.
fn validate_challenge(challenge: &Header, credentials: &Credentials) -> Result<()> {
    let (ts, tsm) = match (challenge.ts, &challenge.tsm) {
        (Some(ts), Some(tsm)) => (ts, tsm),
        _ => return Err(Error::MissingAttributes),
    };
    if &Mac::timestamp(&credentials.key, ts)? != tsm {
        return Err(Error::MacMismatch);
    }
    Ok(())
}

/// Generate an `Authorization` header value using the default context.  See
/// `Client::header`.
pub fn header(uri: &str, method: &str, options: Option<&HeaderOptions>) -> HeaderResult {
    Client::default().header(uri, method, options)
}

/// Validate a server's response using the default context.  See `Client::authenticate`.
pub fn authenticate(
    response: &ServerResponse,
    credentials: Option<&Credentials>,
    artifacts: Option<&Artifacts>,
    options: Option<&AuthenticateOptions>,
) -> bool {
    Client::default().authenticate(response, credentials, artifacts, options)
}

/// Authenticate a message using the default context.  See `Client::message`.
pub fn message<B: AsRef<[u8]>>(
    host: &str,
    port: u16,
    message: B,
    options: Option<&MessageOptions>,
) -> Option<Artifacts> {
    Client::default().message(host, port, message, options)
}

/// Learn the server's clock offset using the default context.  See `Client::clock_offset`.
pub fn clock_offset(www_authenticate: &str, credentials: &Credentials) -> Option<i64> {
    Client::default().clock_offset(www_authenticate, credentials)
}
