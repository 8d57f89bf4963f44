use crate::artifacts::Artifacts;
use crate::credentials::Key;
use crate::error::*;
use crate::header::Header;
use crate::mac::{Mac, MacType};
use log::debug;

/// A Response represents a response from an HTTP server.
///
/// The structure is created from the artifacts of the request it answers and then used to
/// either create (server) or validate (client) a `Server-Authorization` header.  The response
/// MAC covers the request's ts, nonce, method, host, port, resource, app and dlg, with the
/// response's own hash and ext.
///
/// Like `Request`, Responses are built with `ResponseBuilders`.
#[derive(Debug, Clone)]
pub struct Response<'a> {
    artifacts: &'a Artifacts,
    hash: Option<Vec<u8>>,
    ext: Option<&'a str>,
}

impl<'a> Response<'a> {
    fn response_artifacts(&self, hash: Option<&[u8]>, ext: Option<&str>) -> Artifacts {
        Artifacts {
            hash: hash.map(|h| h.to_vec()),
            ext: ext.map(|e| e.to_string()),
            mac: None,
            ..self.artifacts.clone()
        }
    }

    /// Create a new Header for this response.
    pub fn make_header(&self, key: &Key) -> Result<Header> {
        let artifacts = self.response_artifacts(self.hash.as_ref().map(|h| &h[..]), self.ext);
        let mac = Mac::new(MacType::Response, key, &artifacts)?;

        // the Server-Authorization header includes only mac, hash, and ext
        Ok(Header {
            mac: Some(mac),
            ext: artifacts.ext,
            hash: artifacts.hash,
            ..Default::default()
        })
    }

    /// Validate a Server-Authorization header.
    ///
    /// This checks that the MAC matches and, if a hash has been supplied locally,
    /// checks that one was provided from the server and that it, too, matches.
    pub fn validate_header(&self, response_header: &Header, key: &Key) -> bool {
        let header_mac = match response_header.mac {
            Some(ref mac) => mac,
            None => {
                debug!("response header has no mac");
                return false;
            }
        };
        let header_ext = response_header.ext.as_ref().map(|e| &e[..]);
        let header_hash = response_header.hash.as_ref().map(|h| &h[..]);

        // first verify the MAC
        let artifacts = self.response_artifacts(header_hash, header_ext);
        match Mac::new(MacType::Response, key, &artifacts) {
            Ok(calculated_mac) => {
                if &calculated_mac != header_mac {
                    debug!("response mac mismatch");
                    return false;
                }
            }
            Err(e) => {
                debug!("could not calculate response mac: {}", e);
                return false;
            }
        };

        // ..then the hashes
        if let Some(ref local_hash) = self.hash {
            match response_header.hash {
                Some(ref server_hash) => {
                    if !crate::crypto::timing_safe_equal(local_hash, server_hash) {
                        debug!("response payload hash mismatch");
                        return false;
                    }
                }
                None => {
                    debug!("response is missing a required payload hash");
                    return false;
                }
            }
        }

        // NOTE: the timestamp was generated by the client, so there is no need to verify it

        true
    }
}

#[derive(Debug, Clone)]
pub struct ResponseBuilder<'a>(Response<'a>);

impl<'a> ResponseBuilder<'a> {
    /// Generate a new Response answering the request described by `artifacts`.
    pub fn from_artifacts(artifacts: &'a Artifacts) -> Self {
        ResponseBuilder(Response {
            artifacts,
            hash: None,
            ext: None,
        })
    }

    /// Set the content hash for the response.
    ///
    /// This should always be calculated from the response payload, not copied from a header.
    pub fn hash<H: Into<Option<Vec<u8>>>>(mut self, hash: H) -> Self {
        self.0.hash = hash.into();
        self
    }

    /// Set the `ext` Hawk property for the response.
    ///
    /// This need only be set on the server; it is ignored in validating responses on the client.
    pub fn ext<S: Into<Option<&'a str>>>(mut self, ext: S) -> Self {
        self.0.ext = ext.into();
        self
    }

    /// Get the response from this builder
    pub fn response(self) -> Response<'a> {
        self.0
    }
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod test {
    use super::ResponseBuilder;
    use crate::artifacts::Artifacts;
    use crate::credentials::Key;
    use crate::header::Header;
    use crate::mac::Mac;
    use std::time::{Duration, UNIX_EPOCH};

    fn make_artifacts() -> Artifacts {
        Artifacts {
            id: "dh37fgj492je".to_string(),
            ts: UNIX_EPOCH + Duration::new(1353832234, 0),
            nonce: "j4h3g2".to_string(),
            method: "POST".to_string(),
            host: "localhost".to_string(),
            port: 9988,
            resource: "/a/b".to_string(),
            ..Default::default()
        }
    }

    fn key() -> Key {
        Key::new("tok", crate::SHA256).unwrap()
    }

    fn mac_no_hash() -> Mac {
        Mac::from(vec![
            48, 133, 228, 163, 224, 197, 222, 77, 117, 81, 143, 73, 71, 120, 68, 238, 228, 40, 55,
            64, 190, 73, 102, 123, 79, 185, 199, 26, 62, 1, 137, 170,
        ])
    }

    fn mac_with_hash() -> Mac {
        Mac::from(vec![
            33, 147, 159, 211, 184, 194, 189, 74, 53, 229, 241, 161, 215, 145, 22, 34, 206, 207,
            242, 100, 33, 193, 36, 96, 149, 133, 180, 4, 132, 87, 207, 238,
        ])
    }

    #[test]
    fn test_make_header() {
        let artifacts = make_artifacts();
        let header = ResponseBuilder::from_artifacts(&artifacts)
            .ext("server-ext")
            .response()
            .make_header(&key())
            .unwrap();
        assert_eq!(
            header,
            Header {
                mac: Some(mac_no_hash()),
                ext: Some("server-ext".to_string()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_make_header_with_hash() {
        let artifacts = make_artifacts();
        let header = ResponseBuilder::from_artifacts(&artifacts)
            .ext("server-ext")
            .hash(vec![1, 2, 3, 4])
            .response()
            .make_header(&key())
            .unwrap();
        assert_eq!(header.mac, Some(mac_with_hash()));
        assert_eq!(header.hash, Some(vec![1, 2, 3, 4]));
        assert_eq!(header.id, None);
        assert_eq!(header.ts, None);
    }

    #[test]
    fn test_request_fields_ignored() {
        // the request's own hash, ext and mac do not enter the response mac
        let mut artifacts = make_artifacts();
        artifacts.hash = Some(vec![9, 9]);
        artifacts.ext = Some("request-ext".to_string());
        let header = ResponseBuilder::from_artifacts(&artifacts)
            .ext("server-ext")
            .response()
            .make_header(&key())
            .unwrap();
        assert_eq!(header.mac, Some(mac_no_hash()));
    }

    #[test]
    fn test_validation_no_hash() {
        let artifacts = make_artifacts();
        let resp = ResponseBuilder::from_artifacts(&artifacts).response();
        let server_header = Header {
            mac: Some(mac_no_hash()),
            ext: Some("server-ext".to_string()),
            ..Default::default()
        };
        assert!(resp.validate_header(&server_header, &key()));
    }

    #[test]
    fn test_validation_no_mac() {
        let artifacts = make_artifacts();
        let resp = ResponseBuilder::from_artifacts(&artifacts).response();
        let server_header = Header {
            ext: Some("server-ext".to_string()),
            ..Default::default()
        };
        assert!(!resp.validate_header(&server_header, &key()));
    }

    #[test]
    fn test_validation_hash_in_header() {
        // When a hash is provided in the response header, but no hash is added to the Response,
        // it is ignored (so validation succeeds)
        let artifacts = make_artifacts();
        let resp = ResponseBuilder::from_artifacts(&artifacts).response();
        let server_header = Header {
            mac: Some(mac_with_hash()),
            ext: Some("server-ext".to_string()),
            hash: Some(vec![1, 2, 3, 4]),
            ..Default::default()
        };
        assert!(resp.validate_header(&server_header, &key()));
    }

    #[test]
    fn test_validation_hash_required_but_not_given() {
        // When Response.hash is called, but no hash is in the header, validation fails.
        let artifacts = make_artifacts();
        let resp = ResponseBuilder::from_artifacts(&artifacts)
            .hash(vec![1, 2, 3, 4])
            .response();
        let server_header = Header {
            mac: Some(mac_no_hash()),
            ext: Some("server-ext".to_string()),
            ..Default::default()
        };
        assert!(!resp.validate_header(&server_header, &key()));
    }

    #[test]
    fn test_validation_hash_validated() {
        // When a hash is provided in the response header and the Response.hash method is called,
        // the two must match
        let artifacts = make_artifacts();
        let resp = ResponseBuilder::from_artifacts(&artifacts)
            .hash(vec![1, 2, 3, 4])
            .response();
        let server_header = Header {
            mac: Some(mac_with_hash()),
            ext: Some("server-ext".to_string()),
            hash: Some(vec![1, 2, 3, 4]),
            ..Default::default()
        };
        assert!(resp.validate_header(&server_header, &key()));

        // a different supplied hash won't match..
        let resp = ResponseBuilder::from_artifacts(&artifacts)
            .hash(vec![99, 99, 99, 99])
            .response();
        assert!(!resp.validate_header(&server_header, &key()));
    }
}
