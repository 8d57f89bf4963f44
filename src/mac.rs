use crate::artifacts::Artifacts;
use crate::b64;
use crate::credentials::Key;
use crate::crypto;
use crate::error::*;
use crate::util::unix_secs;
use crate::HEADER_VERSION;
use std::fmt;
use std::ops::Deref;
use std::time::SystemTime;

/// The kind of MAC calculation (corresponding to the first line of the canonical string)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacType {
    Header,
    Response,
    Message,
}

impl MacType {
    fn as_str(self) -> &'static str {
        match self {
            MacType::Header => "header",
            MacType::Response => "response",
            MacType::Message => "message",
        }
    }
}

impl fmt::Display for MacType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mac represents a message authentication code, the signature in a Hawk transaction.
///
/// This class supports creating Macs using the Hawk specification, and comparing Macs
/// using a constant-time comparison (thus preventing timing side-channel attacks).
#[derive(Debug, Clone)]
pub struct Mac(Vec<u8>);

impl Mac {
    /// Calculate the MAC of the canonical string for the given artifacts.
    pub fn new(mac_type: MacType, key: &Key, artifacts: &Artifacts) -> Result<Mac> {
        let normalized = normalized_string(mac_type, artifacts);
        Ok(Mac(key.sign(normalized.as_bytes())?))
    }

    /// Calculate the `tsm` value: a MAC over a bare timestamp, which a server sends alongside
    /// its own clock so that clients can trust it.
    pub fn timestamp(key: &Key, ts: SystemTime) -> Result<Mac> {
        let normalized = format!("hawk.{}.ts\n{}\n", HEADER_VERSION, unix_secs(ts));
        Ok(Mac(key.sign(normalized.as_bytes())?))
    }

    /// The MAC as it appears in a header: standard base64 with padding.
    pub fn to_base64(&self) -> String {
        b64::encode(&self.0)
    }
}

/// Build the canonical string that is MAC'd for `artifacts`.
///
/// Every field is newline-terminated, in a fixed order.  The method is uppercased and the
/// host lowercased; `ext` is included literally, so it must not contain newlines.  The
/// `app`/`dlg` lines appear only when `app` is set.
pub fn normalized_string(mac_type: MacType, artifacts: &Artifacts) -> String {
    let mut normalized = format!(
        "hawk.{}.{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
        HEADER_VERSION,
        mac_type,
        unix_secs(artifacts.ts),
        artifacts.nonce,
        artifacts.method.to_uppercase(),
        artifacts.resource,
        artifacts.host.to_lowercase(),
        artifacts.port,
    );

    if let Some(ref h) = artifacts.hash {
        normalized.push_str(&b64::encode(h));
    }
    normalized.push('\n');

    if let Some(ref e) = artifacts.ext {
        normalized.push_str(e);
    }
    normalized.push('\n');

    if let Some(ref app) = artifacts.app {
        normalized.push_str(app);
        normalized.push('\n');
        if let Some(ref dlg) = artifacts.dlg {
            normalized.push_str(dlg);
        }
        normalized.push('\n');
    }

    normalized
}

impl AsRef<[u8]> for Mac {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<[u8; 32]> for Mac {
    fn from(original: [u8; 32]) -> Self {
        Mac(original.to_vec())
    }
}

impl From<[u8; 20]> for Mac {
    fn from(original: [u8; 20]) -> Self {
        Mac(original.to_vec())
    }
}

impl From<Vec<u8>> for Mac {
    fn from(original: Vec<u8>) -> Self {
        Mac(original)
    }
}

impl Deref for Mac {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.0
    }
}

impl PartialEq for Mac {
    fn eq(&self, other: &Mac) -> bool {
        crypto::timing_safe_equal(&self.0, &other.0)
    }
}

#[cfg(all(test, any(feature = "use_ring", feature = "use_openssl")))]
mod test {
    use super::*;
    use crate::artifacts::Artifacts;
    use crate::credentials::Key;
    use crate::SHA256;
    use std::time::{Duration, UNIX_EPOCH};

    fn key() -> Key {
        Key::new(
            vec![
                11u8, 19, 228, 209, 79, 189, 200, 59, 166, 47, 86, 254, 235, 184, 120, 197, 75,
                152, 201, 79, 115, 61, 111, 242, 219, 187, 173, 14, 227, 108, 60, 232,
            ],
            SHA256,
        )
        .unwrap()
    }

    fn artifacts() -> Artifacts {
        Artifacts {
            ts: UNIX_EPOCH + Duration::new(1000, 100),
            nonce: "nonny".to_string(),
            method: "POST".to_string(),
            host: "mysite.com".to_string(),
            port: 443,
            resource: "/v1/api".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalized_string() {
        assert_eq!(
            normalized_string(MacType::Header, &artifacts()),
            "hawk.1.header\n1000\nnonny\nPOST\n/v1/api\nmysite.com\n443\n\n\n"
        );
    }

    #[test]
    fn test_normalized_string_case() {
        let mut a = artifacts();
        a.method = "post".to_string();
        a.host = "MySite.COM".to_string();
        a.resource = "/V1/Api?Q=1".to_string();
        assert_eq!(
            normalized_string(MacType::Response, &a),
            "hawk.1.response\n1000\nnonny\nPOST\n/V1/Api?Q=1\nmysite.com\n443\n\n\n"
        );
    }

    #[test]
    fn test_normalized_string_full() {
        let mut a = artifacts();
        a.hash = Some(vec![1, 2, 3, 4]);
        a.ext = Some("ext-data".to_string());
        a.app = Some("my-app".to_string());
        assert_eq!(
            normalized_string(MacType::Header, &a),
            "hawk.1.header\n1000\nnonny\nPOST\n/v1/api\nmysite.com\n443\nAQIDBA==\next-data\nmy-app\n\n"
        );
        a.dlg = Some("my-dlg".to_string());
        assert!(normalized_string(MacType::Header, &a).ends_with("my-app\nmy-dlg\n"));
    }

    #[test]
    fn test_normalized_string_dlg_without_app() {
        let mut a = artifacts();
        a.dlg = Some("my-dlg".to_string());
        assert_eq!(
            normalized_string(MacType::Header, &a),
            normalized_string(MacType::Header, &artifacts())
        );
    }

    #[test]
    fn test_make_mac() {
        let mac = Mac::new(MacType::Header, &key(), &artifacts()).unwrap();
        assert_eq!(
            mac.deref(),
            &vec![
                192, 227, 235, 121, 157, 185, 197, 79, 189, 214, 235, 139, 9, 232, 99, 55, 67, 30,
                68, 0, 150, 187, 192, 238, 21, 200, 209, 107, 245, 159, 243, 178
            ]
        );
    }

    #[test]
    fn test_make_mac_hash() {
        let mut a = artifacts();
        a.hash = Some(vec![1, 2, 3, 4, 5]);
        let mac = Mac::new(MacType::Header, &key(), &a).unwrap();
        assert_eq!(
            mac.deref(),
            &vec![
                61, 128, 208, 253, 88, 135, 190, 196, 1, 69, 153, 193, 124, 4, 195, 87, 38, 96,
                181, 34, 65, 234, 58, 157, 175, 175, 145, 151, 61, 0, 57, 5
            ]
        );
    }

    #[test]
    fn test_make_mac_ext() {
        let mut a = artifacts();
        a.ext = Some("ext-data".to_string());
        let mac = Mac::new(MacType::Header, &key(), &a).unwrap();
        assert_eq!(
            mac.deref(),
            &vec![
                187, 104, 238, 100, 168, 112, 37, 68, 187, 141, 168, 155, 177, 193, 113, 0, 50,
                105, 127, 36, 24, 117, 200, 251, 138, 199, 108, 14, 105, 123, 234, 119
            ]
        );
    }

    #[test]
    fn test_every_field_changes_mac() {
        let key = key();
        let base = Mac::new(MacType::Header, &key, &artifacts()).unwrap();
        let variations: Vec<Box<dyn Fn(&mut Artifacts)>> = vec![
            Box::new(|a: &mut Artifacts| a.ts = UNIX_EPOCH + Duration::new(1001, 0)),
            Box::new(|a: &mut Artifacts| a.nonce = "nonnz".to_string()),
            Box::new(|a: &mut Artifacts| a.method = "GET".to_string()),
            Box::new(|a: &mut Artifacts| a.resource = "/v1/apj".to_string()),
            Box::new(|a: &mut Artifacts| a.host = "mysite.org".to_string()),
            Box::new(|a: &mut Artifacts| a.port = 444),
            Box::new(|a: &mut Artifacts| a.hash = Some(vec![0])),
            Box::new(|a: &mut Artifacts| a.ext = Some("x".to_string())),
            Box::new(|a: &mut Artifacts| a.app = Some("app".to_string())),
        ];
        for vary in variations {
            let mut a = artifacts();
            vary(&mut a);
            assert_ne!(Mac::new(MacType::Header, &key, &a).unwrap(), base);
        }
        assert_ne!(Mac::new(MacType::Response, &key, &artifacts()).unwrap(), base);
        assert_ne!(Mac::new(MacType::Message, &key, &artifacts()).unwrap(), base);
    }

    #[test]
    fn test_timestamp_mac() {
        let key = key();
        let ts = UNIX_EPOCH + Duration::new(1362346425, 0);
        let tsm = Mac::timestamp(&key, ts).unwrap();
        assert_eq!(tsm.len(), 32);
        assert_eq!(tsm, Mac::timestamp(&key, ts + Duration::from_millis(500)).unwrap());
        assert_ne!(tsm, Mac::timestamp(&key, ts + Duration::from_secs(1)).unwrap());
    }
}
