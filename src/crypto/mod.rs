//! `hawk-engine` must perform certain cryptographic operations in order to function,
//! and applications may need control over which library is used for these.
//!
//! This module can be used for that purpose.  If you do not care, the default features
//! select `ring`, and no further setup is required.  Otherwise, implement
//! [`Cryptographer`] and install it with [`set_cryptographer`] before making any calls
//! into this crate.

use crate::DigestAlgorithm;
use failure::Fail;

pub(crate) mod holder;
pub(crate) use holder::get_crypographer;
pub use holder::{set_boxed_cryptographer, set_cryptographer, SetCryptographerError};

#[cfg(feature = "use_openssl")]
mod openssl;
#[cfg(feature = "use_ring")]
mod ring;

#[cfg(feature = "use_openssl")]
pub use self::openssl::OpensslCryptographer;
#[cfg(feature = "use_ring")]
pub use self::ring::RingCryptographer;

#[derive(Debug, Fail)]
pub enum CryptoError {
    /// The configured cryptographer does not support the digest algorithm
    /// specified.  This should only happen for custom `Cryptographer` implementations
    #[fail(display = "Digest algorithm {:?} is unsupported by this Cryptographer", _0)]
    UnsupportedDigest(DigestAlgorithm),

    /// The configured cryptographer implementation failed to perform an
    /// operation in some way.
    #[fail(display = "{}", _0)]
    Other(#[fail(cause)] failure::Error),
}

/// A trait encapsulating the operations required of a Hmac key.
pub trait HmacKey: Send + Sync + 'static {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError>;
}

/// A trait abstracting over the operations required of a hasher.
pub trait Hasher: Send + Sync + 'static {
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;
    fn finish(&mut self) -> Result<Vec<u8>, CryptoError>;
}

/// A trait abstracting over the primitives required by `hawk-engine`.
///
/// To use this, implement it for a type, and install it with [`set_cryptographer`].
pub trait Cryptographer: Send + Sync + 'static {
    fn rand_bytes(&self, output: &mut [u8]) -> Result<(), CryptoError>;
    fn new_key(
        &self,
        algorithm: DigestAlgorithm,
        key: &[u8],
    ) -> Result<Box<dyn HmacKey>, CryptoError>;
    fn new_hasher(&self, algo: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError>;
    /// Compare `a` and `b` in time independent of their contents.  Unequal lengths may
    /// return early.
    fn constant_time_compare(&self, a: &[u8], b: &[u8]) -> bool;
}

pub(crate) fn rand_bytes(buffer: &mut [u8]) -> Result<(), CryptoError> {
    get_crypographer().rand_bytes(buffer)
}

pub(crate) fn new_key(
    algorithm: DigestAlgorithm,
    key: &[u8],
) -> Result<Box<dyn HmacKey>, CryptoError> {
    get_crypographer().new_key(algorithm, key)
}

pub(crate) fn new_hasher(algorithm: DigestAlgorithm) -> Result<Box<dyn Hasher>, CryptoError> {
    get_crypographer().new_hasher(algorithm)
}

/// Compare two byte strings without branching on where they first differ.  All MAC and
/// hash comparisons in this crate go through this function.
pub fn timing_safe_equal(a: &[u8], b: &[u8]) -> bool {
    get_crypographer().constant_time_compare(a, b)
}
