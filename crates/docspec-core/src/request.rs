//! Request type handed to views

use crate::error::ApiError;
use bytes::Bytes;
use http::{request::Parts, HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// HTTP request as seen by a view
///
/// Carries the matched endpoint and the URL rule arguments in addition to
/// the raw request parts.
pub struct Request {
    pub(crate) parts: Parts,
    pub(crate) body: Bytes,
    pub(crate) endpoint: String,
    pub(crate) view_args: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        parts: Parts,
        body: Bytes,
        endpoint: String,
        view_args: HashMap<String, String>,
    ) -> Self {
        Self {
            parts,
            body,
            endpoint,
            view_args,
        }
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Get the URI
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// Get the query string
    pub fn query_string(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    /// Deserialize the query string, percent-decoding its values
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let query = self.query_string().unwrap_or("");
        serde_urlencoded::from_str(query)
            .map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e)))
    }

    /// Endpoint of the rule that matched, e.g. `api.get_band`
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// All URL rule arguments
    pub fn view_args(&self) -> &HashMap<String, String> {
        &self.view_args
    }

    /// A single URL rule argument
    pub fn view_arg(&self, name: &str) -> Option<&str> {
        self.view_args.get(name).map(String::as_str)
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Filter {
        genre: Option<String>,
        limit: Option<u32>,
    }

    fn request(uri: &str) -> Request {
        let (parts, _) = http::Request::get(uri).body(()).unwrap().into_parts();
        Request::new(parts, Bytes::new(), "bands".to_string(), HashMap::new())
    }

    #[test]
    fn query_is_percent_decoded() {
        let filter: Filter = request("/bands/?genre=post%20rock&limit=2").query().unwrap();
        assert_eq!(
            filter,
            Filter {
                genre: Some("post rock".to_string()),
                limit: Some(2)
            }
        );
    }

    #[test]
    fn missing_query_uses_defaults() {
        let filter: Filter = request("/bands/").query().unwrap();
        assert_eq!(filter, Filter { genre: None, limit: None });
    }

    #[test]
    fn invalid_query_is_bad_request() {
        let err = request("/bands/?limit=many").query::<Filter>().unwrap_err();
        assert_eq!(err.status, http::StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("Invalid query string"));
    }
}
