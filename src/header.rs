use crate::b64;
use crate::error::*;
use crate::mac::Mac;
use crate::util::{from_unix_secs, unix_secs};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// The attributes allowed in a request's `Authorization` header.
pub(crate) const REQUEST_ATTRIBUTES: &[&str] =
    &["id", "ts", "nonce", "hash", "ext", "mac", "app", "dlg"];

/// The attributes allowed in a `Server-Authorization` header.
pub(crate) const RESPONSE_ATTRIBUTES: &[&str] = &["mac", "ext", "hash"];

/// The attributes allowed in a `WWW-Authenticate` challenge.
pub(crate) const CHALLENGE_ATTRIBUTES: &[&str] = &["ts", "tsm", "error"];

/// Representation of a Hawk header value: `Authorization`, `Server-Authorization` or
/// `WWW-Authenticate`.
///
/// All fields are optional, although for specific purposes some fields must be present.
///
/// `Display` and `FromStr` work on the attribute list alone; use [`Header::header_value`]
/// and [`Header::parse`] for the full value including the `Hawk` scheme.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Header {
    pub id: Option<String>,
    pub ts: Option<SystemTime>,
    pub nonce: Option<String>,
    pub mac: Option<Mac>,
    pub ext: Option<String>,
    pub hash: Option<Vec<u8>>,
    pub app: Option<String>,
    pub dlg: Option<String>,
    pub tsm: Option<Mac>,
    pub error: Option<String>,
}

impl Header {
    /// Check the string fields for characters that cannot be carried in a header value.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("id", &self.id),
            ("nonce", &self.nonce),
            ("ext", &self.ext),
            ("app", &self.app),
            ("dlg", &self.dlg),
            ("error", &self.error),
        ];
        for (name, value) in fields.iter() {
            if let Some(value) = value {
                check_component(name, value)?;
            }
        }
        Ok(())
    }

    /// Format the header for transmission in an HTTP header, including the `Hawk ` prefix.
    pub fn header_value(&self) -> Result<String> {
        self.validate()?;
        Ok(format!("Hawk {}", self))
    }

    /// Parse a full header value, including the `Hawk` scheme, accepting any attribute.
    pub fn parse(value: &str) -> Result<Header> {
        Header::parse_restricted(value, &[])
    }

    /// Parse a full header value, including the `Hawk` scheme.  If `allowed` is not empty,
    /// any attribute not in it is an error.
    pub fn parse_restricted(value: &str, allowed: &[&str]) -> Result<Header> {
        let value = value.trim_start();
        let (scheme, rest) = match value.find(char::is_whitespace) {
            Some(i) => (&value[..i], &value[i..]),
            None => (value, ""),
        };
        if !scheme.eq_ignore_ascii_case("hawk") {
            return Err(Error::HeaderParseError("Unsupported scheme".to_string()));
        }
        if rest.trim().is_empty() {
            return Err(Error::HeaderParseError("Invalid header syntax".to_string()));
        }
        parse_attributes(rest, allowed)
    }

    fn fmt_header(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;

        if let Some(ref id) = self.id {
            write_attribute(f, &mut first, "id", id)?;
        }
        if let Some(ts) = self.ts {
            write_attribute(f, &mut first, "ts", &unix_secs(ts).to_string())?;
        }
        if let Some(ref tsm) = self.tsm {
            write_attribute(f, &mut first, "tsm", &tsm.to_base64())?;
        }
        if let Some(ref nonce) = self.nonce {
            write_attribute(f, &mut first, "nonce", nonce)?;
        }
        if let Some(ref hash) = self.hash {
            write_attribute(f, &mut first, "hash", &b64::encode(hash))?;
        }
        if let Some(ref ext) = self.ext {
            write_attribute(f, &mut first, "ext", ext)?;
        }
        if let Some(ref mac) = self.mac {
            write_attribute(f, &mut first, "mac", &mac.to_base64())?;
        }
        if let Some(ref app) = self.app {
            write_attribute(f, &mut first, "app", app)?;
        }
        if let Some(ref dlg) = self.dlg {
            write_attribute(f, &mut first, "dlg", dlg)?;
        }
        if let Some(ref error) = self.error {
            write_attribute(f, &mut first, "error", error)?;
        }
        Ok(())
    }
}

fn write_attribute(
    f: &mut fmt::Formatter,
    first: &mut bool,
    name: &str,
    value: &str,
) -> fmt::Result {
    if !*first {
        f.write_str(", ")?;
    }
    *first = false;
    write!(f, "{}=\"", name)?;
    for c in value.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str("\"")
}

/// Header values may contain printable ASCII and spaces; `"` and `\` are escaped on output.
fn allowed_char(c: char) -> bool {
    c == ' ' || c.is_ascii_graphic()
}

fn check_component(name: &str, value: &str) -> Result<()> {
    if value.chars().all(allowed_char) {
        Ok(())
    } else {
        Err(Error::BadAttributeValue(name.to_string()))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_header(f)
    }
}

impl FromStr for Header {
    type Err = Error;
    fn from_str(s: &str) -> Result<Header> {
        parse_attributes(s, &[])
    }
}

fn parse_attributes(s: &str, allowed: &[&str]) -> Result<Header> {
    let mut p = s;
    let mut header = Header::default();
    let mut seen: Vec<&str> = vec![];

    loop {
        // Skip whitespace and commas used as separators
        p = p.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        if p.is_empty() {
            break;
        }

        // Find first '=' which delimits attribute name from value
        let eq = p
            .find('=')
            .ok_or_else(|| Error::HeaderParseError("Bad header format".to_string()))?;
        let attr = p[..eq].trim();
        if attr.is_empty() || !attr.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::HeaderParseError("Bad header format".to_string()));
        }
        p = p[eq + 1..].trim_start();
        if !p.starts_with('"') {
            return Err(Error::HeaderParseError(format!(
                "Unquoted attribute value: {}",
                attr
            )));
        }
        p = &p[1..];

        let (val, rest) = unquote(p).ok_or_else(|| Error::BadAttributeValue(attr.to_string()))?;
        p = rest;

        // the value must be followed by a separator or the end of the string
        let after = p.trim_start();
        if !after.is_empty() && !after.starts_with(',') {
            return Err(Error::HeaderParseError("Bad header format".to_string()));
        }

        if !allowed.is_empty() && !allowed.contains(&attr) {
            return Err(Error::HeaderParseError(format!("Unknown attribute: {}", attr)));
        }
        if seen.contains(&attr) {
            return Err(Error::HeaderParseError(format!("Duplicate attribute: {}", attr)));
        }
        seen.push(attr);

        match attr {
            "id" => header.id = Some(val),
            "ts" => {
                let ts = u64::from_str(&val)
                    .ok()
                    .and_then(from_unix_secs)
                    .ok_or_else(|| Error::BadAttributeValue(attr.to_string()))?;
                header.ts = Some(ts);
            }
            "tsm" => header.tsm = Some(Mac::from(b64::decode(&val)?)),
            "mac" => header.mac = Some(Mac::from(b64::decode(&val)?)),
            "nonce" => header.nonce = Some(val),
            "ext" => header.ext = Some(val),
            "hash" => header.hash = Some(b64::decode(&val)?),
            "app" => header.app = Some(val),
            "dlg" => header.dlg = Some(val),
            "error" => header.error = Some(val),
            _ => {
                return Err(Error::HeaderParseError(format!(
                    "Unknown attribute: {}",
                    attr
                )))
            }
        };
    }

    if seen.is_empty() {
        return Err(Error::HeaderParseError("Invalid header syntax".to_string()));
    }
    Ok(header)
}

/// Read a quoted value up to its closing `"`, undoing backslash escapes.  Returns the value
/// and the text following the closing quote, or `None` if the value is empty, unterminated,
/// or contains a character that may not appear in a header value.
fn unquote(p: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = p.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => {
                if value.is_empty() {
                    return None;
                }
                return Some((value, &p[i + 1..]));
            }
            '\\' => {
                let (_, escaped) = chars.next()?;
                if !allowed_char(escaped) {
                    return None;
                }
                value.push(escaped);
            }
            c if allowed_char(c) => value.push(c),
            _ => return None,
        }
    }
    None
}
