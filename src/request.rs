//! Incoming HTTP request type.
//!
//! A [`Request`] is the per-request context every stage sees: the
//! externally-visible request line and headers, the host's own per-request
//! identifier, and the response headers staged so far.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;
use http::Method;
use http_body_util::BodyExt;
use uuid::Uuid;

use crate::error::Error;

/// An incoming HTTP request.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) scheme: String,
    pub(crate) host: String,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) id: String,
    pub(crate) response_headers: Vec<(String, String)>,
}

impl Request {
    /// Builder for requests that did not come off the wire: tests, or hosts
    /// embedding a [`Pipeline`](crate::Pipeline) behind another server.
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            request: Request {
                method: Method::GET,
                scheme: "http".to_owned(),
                host: "localhost".to_owned(),
                path: "/".to_owned(),
                query: None,
                headers: Vec::new(),
                body: Bytes::new(),
                params: HashMap::new(),
                id: new_request_id(),
                response_headers: Vec::new(),
            },
        }
    }

    /// Reads a hyper request, collecting its body.
    ///
    /// The scheme comes from an absolute-form URI when present, otherwise
    /// `http`: TLS is terminated in front of us. The host prefers the `Host`
    /// header and falls back to the URI authority (HTTP/2 `:authority`).
    pub(crate) async fn from_hyper(req: hyper::Request<hyper::body::Incoming>) -> Result<Self, Error> {
        let (parts, body) = req.into_parts();

        let headers: Vec<(String, String)> = parts.headers.iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect();

        let host = headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("host"))
            .map(|(_, v)| v.clone())
            .or_else(|| parts.uri.authority().map(|a| a.as_str().to_owned()))
            .unwrap_or_default();

        let body = body.collect().await?.to_bytes();

        Ok(Self {
            method: parts.method,
            scheme: parts.uri.scheme_str().unwrap_or("http").to_owned(),
            host,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers,
            body,
            params: HashMap::new(),
            id: new_request_id(),
            response_headers: Vec::new(),
        })
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn scheme(&self) -> &str { &self.scheme }
    pub fn host(&self) -> &str { &self.host }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The host's own identifier for this request, unique per request.
    pub fn id(&self) -> &str { &self.id }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first value of a query-string parameter, percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<Cow<'_, str>> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// The full request URL: `scheme://host/path?query`. The `?query` part is
    /// omitted when there is no query string.
    pub fn display_url(&self) -> String {
        match self.query.as_deref() {
            Some(q) if !q.is_empty() => format!("{}://{}{}?{}", self.scheme, self.host, self.path, q),
            _ => format!("{}://{}{}", self.scheme, self.host, self.path),
        }
    }

    /// Stages a header for the eventual response.
    ///
    /// Appends, never replaces: staging the same name twice yields two
    /// values. Staged headers are visible to every later stage and the
    /// handler through [`Request::response_headers`].
    pub fn append_response_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.response_headers.push((name.into(), value.into()));
    }

    /// Response headers staged so far, in staging order.
    pub fn response_headers(&self) -> &[(String, String)] { &self.response_headers }

    pub(crate) fn take_response_headers(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.response_headers)
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fluent builder for [`Request`]. Defaults to `GET http://localhost/`.
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.request.method = method;
        self
    }

    pub fn scheme(mut self, scheme: &str) -> Self {
        self.request.scheme = scheme.to_owned();
        self
    }

    pub fn host(mut self, host: &str) -> Self {
        self.request.host = host.to_owned();
        self
    }

    pub fn path(mut self, path: &str) -> Self {
        self.request.path = path.to_owned();
        self
    }

    /// Raw query string without the leading `?`.
    pub fn query(mut self, query: &str) -> Self {
        self.request.query = Some(query.to_owned());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.request.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Overrides the generated per-request identifier.
    pub fn id(mut self, id: &str) -> Self {
        self.request.id = id.to_owned();
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.request.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}
