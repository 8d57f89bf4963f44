use crate::crypto::{self, HmacKey};
use crate::error::*;
use crate::DigestAlgorithm;
use std::fmt;

/// Hawk key.
///
/// While any sequence of bytes can be specified as a key, note that each digest algorithm has
/// a suggested key length, and that passwords should *not* be used as keys.  Keys of incorrect
/// length are handled according to the digest's implementation.  An empty key is rejected.
pub struct Key {
    hmac: Box<dyn HmacKey>,
    algorithm: DigestAlgorithm,
}

impl Key {
    pub fn new<B>(key: B, algorithm: DigestAlgorithm) -> Result<Key>
    where
        B: AsRef<[u8]>,
    {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(Error::InvalidCredentialObject);
        }
        Ok(Key {
            hmac: crypto::new_key(algorithm, key)?,
            algorithm,
        })
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(self.hmac.sign(data)?)
    }

    /// The digest algorithm this key signs with; payload hashes use the same algorithm.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Key")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Hawk credentials: an ID and a key associated with that ID.  The digest algorithm
/// must be agreed between the server and the client, and the length of the key is
/// specific to that algorithm.
#[derive(Debug)]
pub struct Credentials {
    pub id: String,
    pub key: Key,
}

impl Credentials {
    /// Build a set of credentials, failing with `InvalidCredentialObject` if either the id or
    /// the key is empty.
    ///
    /// Algorithm names read from configuration can be converted with `str::parse`, which fails
    /// with `UnknownAlgorithm` for anything but `sha1` and `sha256`.
    pub fn new<S, B>(id: S, key: B, algorithm: DigestAlgorithm) -> Result<Credentials>
    where
        S: Into<String>,
        B: AsRef<[u8]>,
    {
        let id = id.into();
        if id.is_empty() {
            return Err(Error::InvalidCredentialObject);
        }
        Ok(Credentials {
            id,
            key: Key::new(key, algorithm)?,
        })
    }
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod test {
    use super::*;
    use crate::{SHA1, SHA256};

    #[test]
    fn test_new_sha256() {
        let key = vec![77u8; 32];
        let key = Key::new(key, SHA256).unwrap();
        assert_eq!(key.algorithm(), SHA256);
    }

    #[test]
    fn test_new_sha256_bad_length() {
        let key = vec![0u8; 99];
        Key::new(key, SHA256).unwrap();
    }

    #[test]
    fn test_empty_key() {
        let err = Key::new("", SHA1).unwrap_err();
        assert_eq!(err.to_string(), "Invalid credential object");
    }

    #[test]
    fn test_credentials_missing_id() {
        let err = Credentials::new("", "2983d45yun89q", SHA256).unwrap_err();
        assert_eq!(err.to_string(), "Invalid credential object");
    }

    #[test]
    fn test_credentials_missing_key() {
        let err = Credentials::new("123456", "", SHA256).unwrap_err();
        assert_eq!(err.to_string(), "Invalid credential object");
    }

    #[test]
    fn test_key_debug_hides_material() {
        let creds = Credentials::new("123456", "2983d45yun89q", SHA1).unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("123456"));
        assert!(!debug.contains("2983d45yun89q"));
    }
}
