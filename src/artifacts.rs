use crate::error::*;
use crate::header::Header;
use crate::mac::Mac;
use crate::request::Request;
use std::time::{SystemTime, UNIX_EPOCH};

/// The values that make up one authenticated exchange.
///
/// A client produces these when it builds an `Authorization` header or authenticates a
/// message; a server reconstructs them from the header it receives and the request it was
/// attached to.  `ts` and `nonce` together identify the exchange for replay defense.  When
/// `hash` is `None`, the MAC covers no payload at all, which is different from covering an
/// empty payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub id: String,
    pub ts: SystemTime,
    pub nonce: String,
    pub method: String,
    pub host: String,
    pub port: u16,
    pub resource: String,
    pub hash: Option<Vec<u8>>,
    pub ext: Option<String>,
    pub app: Option<String>,
    pub dlg: Option<String>,
    pub mac: Option<Mac>,
}

impl Default for Artifacts {
    fn default() -> Self {
        Artifacts {
            id: String::new(),
            ts: UNIX_EPOCH,
            nonce: String::new(),
            method: String::new(),
            host: String::new(),
            port: 0,
            resource: String::new(),
            hash: None,
            ext: None,
            app: None,
            dlg: None,
            mac: None,
        }
    }
}

impl Artifacts {
    /// Reconstruct the artifacts of an incoming request from its parsed `Authorization`
    /// header.  The header must carry `id`, `ts`, `nonce` and `mac`.
    pub fn from_request_header(request: &Request, header: &Header) -> Result<Artifacts> {
        match (&header.id, header.ts, &header.nonce, &header.mac) {
            (Some(id), Some(ts), Some(nonce), Some(mac)) => Ok(Artifacts {
                id: id.clone(),
                ts,
                nonce: nonce.clone(),
                method: request.method.to_string(),
                host: request.host.to_string(),
                port: request.port,
                resource: request.resource.to_string(),
                hash: header.hash.clone(),
                ext: header.ext.clone(),
                app: header.app.clone(),
                dlg: header.dlg.clone(),
                mac: Some(mac.clone()),
            }),
            _ => Err(Error::MissingAttributes),
        }
    }

    /// The `Authorization` header describing these artifacts.
    pub fn request_header(&self) -> Header {
        Header {
            id: Some(self.id.clone()),
            ts: Some(self.ts),
            nonce: Some(self.nonce.clone()),
            mac: self.mac.clone(),
            ext: self.ext.clone(),
            hash: self.hash.clone(),
            app: self.app.clone(),
            dlg: match self.app {
                Some(_) => self.dlg.clone(),
                None => None,
            },
            ..Default::default()
        }
    }
}
