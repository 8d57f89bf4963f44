use crate::crypto::CryptoError;
use crate::header::Header;
use failure::Fail;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Fail, Debug)]
pub enum Error {
    #[fail(display = "Invalid argument type")]
    InvalidArgumentType,

    #[fail(display = "Invalid credential object")]
    InvalidCredentialObject,

    #[fail(display = "Unknown algorithm")]
    UnknownAlgorithm,

    #[fail(display = "Unparseable Hawk header: {}", _0)]
    HeaderParseError(String),

    #[fail(display = "Bad attribute value: {}", _0)]
    BadAttributeValue(String),

    #[fail(display = "Missing attributes")]
    MissingAttributes,

    #[fail(display = "Unknown credentials")]
    UnknownCredentials,

    #[fail(display = "Bad mac")]
    MacMismatch,

    #[fail(display = "Missing required payload hash")]
    MissingPayloadHash,

    #[fail(display = "Bad payload hash")]
    BadPayloadHash,

    /// The request timestamp is outside the allowed skew.  The challenge carries the server's
    /// current time and its `tsm`, suitable for a `WWW-Authenticate` header.
    #[fail(display = "Stale timestamp")]
    StaleTimestamp { challenge: Header },

    #[fail(display = "Invalid nonce")]
    ReplayedNonce,

    #[fail(display = "{}", _0)]
    Crypto(#[fail(cause)] CryptoError),

    #[fail(display = "Base64 Decode error: {}", _0)]
    Decode(#[fail(cause)] base64::DecodeError),
}

impl Error {
    /// True for errors that describe a failed authentication attempt, as opposed to a caller
    /// or configuration mistake.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::HeaderParseError(_)
            | Error::BadAttributeValue(_)
            | Error::MissingAttributes
            | Error::UnknownCredentials
            | Error::MacMismatch
            | Error::MissingPayloadHash
            | Error::BadPayloadHash
            | Error::StaleTimestamp { .. }
            | Error::ReplayedNonce
            | Error::Decode(_) => true,
            _ => false,
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Decode(e)
    }
}

impl From<CryptoError> for Error {
    fn from(e: CryptoError) -> Self {
        Error::Crypto(e)
    }
}
