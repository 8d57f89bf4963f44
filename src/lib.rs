//! The `hawk-engine` crate provides the protocol core of Hawk authentication: the canonical
//! strings that are MAC'd, MAC and payload-hash calculation, the `Hawk ...` header syntax, and
//! the client- and server-side validation logic, including replay and clock-skew defense.
//!
//! It does not speak HTTP itself.  Callers supply the method, host, port, resource and body
//! of each request, and transmit the resulting header values by whatever means they like.
//!
//! # Examples
//!
//! ## Hawk Client
//!
//! A client creates an `Authorization` header for a request.  The timestamp and nonce are
//! normally generated automatically; they are fixed here to make the output reproducible.
//!
//! ```
//! use hawk_engine::client::{self, HeaderOptions};
//! use hawk_engine::{Credentials, SHA1};
//! use std::time::{Duration, UNIX_EPOCH};
//!
//! let credentials = Credentials::new("123456", "2983d45yun89q", SHA1).unwrap();
//! let options = HeaderOptions {
//!     credentials: Some(&credentials),
//!     ext: Some("Bazinga!"),
//!     timestamp: Some(UNIX_EPOCH + Duration::from_secs(1353809207)),
//!     nonce: Some("Ygvqdz"),
//!     payload: Some(&b"something to write about"[..]),
//!     ..Default::default()
//! };
//!
//! let result = client::header(
//!     "http://example.net/somewhere/over/the/rainbow",
//!     "POST",
//!     Some(&options),
//! );
//! assert_eq!(result.err, None);
//! assert_eq!(
//!     result.field,
//!     "Hawk id=\"123456\", ts=\"1353809207\", nonce=\"Ygvqdz\", \
//!      hash=\"bsvY3IfUllw6V5rvk4tStEvpBhE=\", ext=\"Bazinga!\", \
//!      mac=\"qbf1ZPG/r/e06F4ht+T77LXi5vw=\""
//! );
//! ```
//!
//! ## Hawk Server
//!
//! A server looks up credentials by id, checks the MAC, the timestamp and the nonce, and can
//! then sign its response for the client to validate.
//!
//! ```
//! use hawk_engine::client::{self, HeaderOptions};
//! use hawk_engine::server::{ResponseOptions, Server};
//! use hawk_engine::{Credentials, MemoryNonceStore, RequestBuilder, Result, SHA256};
//!
//! fn lookup(id: &str) -> Result<Option<Credentials>> {
//!     match id {
//!         "dh37fgj492je" => Ok(Some(Credentials::new(id, "werxhqb98rpaxn39848xrunpaw3489ruxnpa98w4rxn", SHA256)?)),
//!         _ => Ok(None),
//!     }
//! }
//!
//! let credentials = lookup("dh37fgj492je").unwrap().unwrap();
//! let options = HeaderOptions {
//!     credentials: Some(&credentials),
//!     ..Default::default()
//! };
//! let authorization = client::header("https://example.com/resource?a=1", "GET", Some(&options));
//! assert_eq!(authorization.err, None);
//!
//! let nonces = MemoryNonceStore::new();
//! let server = Server::new(&lookup, &nonces);
//! let request = RequestBuilder::new("GET", "example.com", 443, "/resource?a=1")
//!     .authorization(authorization.field.as_str())
//!     .request();
//! let authenticated = server.authenticate(&request, None).unwrap();
//! assert_eq!(authenticated.credentials.id, "dh37fgj492je");
//!
//! let server_authorization = server
//!     .header(&authenticated.credentials, &authenticated.artifacts, &ResponseOptions::default())
//!     .unwrap();
//! assert!(server_authorization.starts_with("Hawk mac="));
//! ```

mod artifacts;
pub use artifacts::Artifacts;

mod b64;

pub mod client;

mod context;
pub use context::{Clock, Context, FixedClock, NonceGenerator, RandomNonce, SystemClock};

mod credentials;
pub use credentials::{Credentials, Key};

pub mod crypto;

mod error;
pub use error::*;

mod header;
pub use header::Header;

mod mac;
pub use mac::{normalized_string, Mac, MacType};

mod payload;
pub use payload::PayloadHasher;

mod replay;
pub use replay::{MemoryNonceStore, NonceStore};

mod request;
pub use request::{Request, RequestBuilder};

mod response;
pub use response::{Response, ResponseBuilder};

pub mod server;

mod util;

use std::fmt;
use std::str::FromStr;

/// The protocol version embedded in every canonical string.
pub const HEADER_VERSION: &str = "1";

/// DigestAlgorithm represents the hash algorithms a set of Hawk credentials may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// The name of this algorithm as it appears in credential records.
    pub fn as_str(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<DigestAlgorithm> {
        match s {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            _ => Err(Error::UnknownAlgorithm),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SHA1: DigestAlgorithm = DigestAlgorithm::Sha1;
pub const SHA256: DigestAlgorithm = DigestAlgorithm::Sha256;
