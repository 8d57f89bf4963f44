use crate::crypto::{self, Hasher};
use crate::error::*;
use crate::{DigestAlgorithm, HEADER_VERSION};
use log::trace;

/// A utility for hashing payloads. Feed your entity body to this, then pass the `finish`
/// result to a request or response.
///
/// The content type is normalized before hashing: parameters after `;` are dropped, and the
/// remainder is trimmed and lowercased.  An empty payload produces a hash, which is
/// different from sending no hash at all.
pub struct PayloadHasher(Box<dyn Hasher>);

impl PayloadHasher {
    /// Create a new PayloadHasher. The digest is assumed to be the same as the digest used
    /// for the credentials in the request.
    pub fn new<B>(content_type: B, algorithm: DigestAlgorithm) -> Result<Self>
    where
        B: AsRef<[u8]>,
    {
        let content_type = normalize_content_type(content_type.as_ref());
        trace!("hashing payload with content type {:?}", content_type);
        let mut hasher = PayloadHasher(crypto::new_hasher(algorithm)?);
        hasher.update(format!("hawk.{}.payload\n", HEADER_VERSION))?;
        hasher.update(content_type)?;
        hasher.update(b"\n")?;
        Ok(hasher)
    }

    /// Hash a single value and return it
    pub fn hash<B1, B2>(content_type: B1, algorithm: DigestAlgorithm, payload: B2) -> Result<Vec<u8>>
    where
        B1: AsRef<[u8]>,
        B2: AsRef<[u8]>,
    {
        let mut hasher = PayloadHasher::new(content_type, algorithm)?;
        hasher.update(payload)?;
        hasher.finish()
    }

    /// Update the hash with new data.
    pub fn update<B>(&mut self, data: B) -> Result<()>
    where
        B: AsRef<[u8]>,
    {
        Ok(self.0.update(data.as_ref())?)
    }

    /// Finish hashing and return the result
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.0.update(b"\n")?;
        Ok(self.0.finish()?)
    }
}

fn normalize_content_type(content_type: &[u8]) -> Vec<u8> {
    let end = content_type
        .iter()
        .position(|&b| b == b';')
        .unwrap_or_else(|| content_type.len());
    let mut normalized = content_type[..end].to_ascii_lowercase();
    while normalized.last().map_or(false, u8::is_ascii_whitespace) {
        normalized.pop();
    }
    let start = normalized
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or_else(|| normalized.len());
    normalized.split_off(start)
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod tests {
    use super::PayloadHasher;
    use crate::b64;
    use crate::{SHA1, SHA256};

    #[test]
    fn hash_consistency() -> crate::Result<()> {
        let mut hasher1 = PayloadHasher::new("text/plain", SHA256)?;
        hasher1.update("pay")?;
        hasher1.update("load")?;
        let hash1 = hasher1.finish()?;

        let mut hasher2 = PayloadHasher::new("text/plain", SHA256)?;
        hasher2.update("payload")?;
        let hash2 = hasher2.finish()?;

        let hash3 = PayloadHasher::hash("text/plain", SHA256, "payload")?;

        assert_eq!(hash2, hash1);
        assert_eq!(hash3, hash1);
        Ok(())
    }

    #[test]
    fn hash_vectors() {
        let hash = PayloadHasher::hash("", SHA1, "something to write about").unwrap();
        assert_eq!(b64::encode(&hash), "bsvY3IfUllw6V5rvk4tStEvpBhE=");

        let hash = PayloadHasher::hash("text/plain", SHA256, "something to write about").unwrap();
        assert_eq!(b64::encode(&hash), "2QfCt3GuY9HQnHWyWD3wX68ZOKbynqlfYmuO2ZBRqtY=");
    }

    #[test]
    fn content_type_normalized() {
        let plain = PayloadHasher::hash("text/plain", SHA256, "x").unwrap();
        let messy = PayloadHasher::hash(" Text/Plain ; charset=utf-8", SHA256, "x").unwrap();
        assert_eq!(plain, messy);
        let other = PayloadHasher::hash("text/html", SHA256, "x").unwrap();
        assert_ne!(plain, other);
    }

    #[test]
    fn empty_payload_has_a_hash() {
        let hash = PayloadHasher::hash("text/plain", SHA256, "").unwrap();
        assert_eq!(hash.len(), 32);
        assert_ne!(hash, PayloadHasher::hash("text/plain", SHA256, " ").unwrap());
    }
}
