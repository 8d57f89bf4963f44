use crate::error::*;
use url::{Position, Url};

/// Request represents a single HTTP request as seen by a Hawk server.
///
/// The structure is created using the builder idiom: `RequestBuilder::new` takes the fields
/// that make up the canonical string, and the optional `Authorization` header value and
/// content type are added afterward.  Cloning a builder with the fixed fields applied is a
/// convenient way to avoid repeating them.
///
/// # Examples
///
/// ```
/// use hawk_engine::RequestBuilder;
/// let base = RequestBuilder::new("GET", "mysite.com", 443, "/");
/// let request1 = base.clone().method("POST").resource("/api/user").request();
/// let request2 = base.resource("/api/users").request();
/// ```
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub(crate) method: &'a str,
    pub(crate) host: &'a str,
    pub(crate) port: u16,
    pub(crate) resource: &'a str,
    pub(crate) content_type: Option<&'a str>,
    pub(crate) authorization: Option<&'a str>,
}

impl<'a> Request<'a> {
    pub fn method(&self) -> &'a str {
        self.method
    }

    pub fn host(&self) -> &'a str {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The path and query of the request, exactly as signed.
    pub fn resource(&self) -> &'a str {
        self.resource
    }

    pub fn content_type(&self) -> Option<&'a str> {
        self.content_type
    }

    pub fn authorization(&self) -> Option<&'a str> {
        self.authorization
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder<'a>(Request<'a>);

impl<'a> RequestBuilder<'a> {
    /// Create a new request with the given method, host, port, and resource (path and query).
    pub fn new(method: &'a str, host: &'a str, port: u16, resource: &'a str) -> Self {
        RequestBuilder(Request {
            method,
            host,
            port,
            resource,
            content_type: None,
            authorization: None,
        })
    }

    /// Create a new request with the host, port, and resource determined from the URL.  The
    /// resource is the URL's path followed by its query, if any.
    pub fn from_url(method: &'a str, url: &'a Url) -> Result<Self> {
        let (host, port, resource) = RequestBuilder::parse_url(url)?;
        Ok(RequestBuilder::new(method, host, port, resource))
    }

    /// Set the request method. This should be a capitalized string.
    pub fn method(mut self, method: &'a str) -> Self {
        self.0.method = method;
        self
    }

    /// Set the resource (path and query) for the request.
    pub fn resource(mut self, resource: &'a str) -> Self {
        self.0.resource = resource;
        self
    }

    /// Set the URL hostname for the request
    pub fn host(mut self, host: &'a str) -> Self {
        self.0.host = host;
        self
    }

    /// Set the URL port for the request
    pub fn port(mut self, port: u16) -> Self {
        self.0.port = port;
        self
    }

    /// Set the content type of the request body, used when verifying its payload hash.
    pub fn content_type<S: Into<Option<&'a str>>>(mut self, content_type: S) -> Self {
        self.0.content_type = content_type.into();
        self
    }

    /// Set the value of the request's `Authorization` header.
    pub fn authorization<S: Into<Option<&'a str>>>(mut self, authorization: S) -> Self {
        self.0.authorization = authorization.into();
        self
    }

    /// Get the request from this builder
    pub fn request(self) -> Request<'a> {
        self.0
    }

    /// Split a URL into the host, port and resource that appear in the canonical string.  A
    /// URL without a host or without a known port is an `InvalidArgumentType`.
    pub(crate) fn parse_url(url: &'a Url) -> Result<(&'a str, u16, &'a str)> {
        let host = url.host_str().ok_or(Error::InvalidArgumentType)?;
        let port = url.port_or_known_default().ok_or(Error::InvalidArgumentType)?;
        let resource = &url[Position::BeforePath..Position::AfterQuery];
        Ok((host, port, resource))
    }
}
