//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::method::Method;

/// A routed request: what the client sent plus what the router extracted.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
    pub(crate) query: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        url: String,
        headers: Vec<(String, String)>,
        body: Bytes,
        params: HashMap<String, String>,
        query: HashMap<String, String>,
    ) -> Self {
        Self { method, url, headers, body, params, query }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// The request target as received: path plus `?query` if present.
    pub fn url(&self) -> &str { &self.url }

    /// The path portion of [`url`](Request::url).
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(self.url.as_str(), |(path, _)| path)
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn params(&self) -> &HashMap<String, String> { &self.params }

    /// Returns a decoded query parameter. `/users?search=ana` gives
    /// `req.query("search") == Some("ana")`.
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    pub fn query_params(&self) -> &HashMap<String, String> { &self.query }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// [`Error::Body`] if the body is empty, not JSON, or not shaped like `T`.
    /// Returning that error from a handler produces `400 Bad Request`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::Body)
    }
}
