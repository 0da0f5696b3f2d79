//! TestClient for integration testing without network binding
//!
//! Requests go through [`App::dispatch`] exactly as they would when served,
//! so routing, converters and views are all exercised.
//!
//! # Example
//!
//! ```rust,ignore
//! #[tokio::test]
//! async fn test_hello() {
//!     let app = App::new("hello");
//!     app.route("/", &[Method::GET], ViewFunction::new("hello", || async { "Hello" }))?;
//!     let client = TestClient::new(&app);
//!
//!     let response = client.get("/").await;
//!     response.assert_status(200);
//!     assert_eq!(response.text(), "Hello");
//! }
//! ```

use crate::app::App;
use crate::error::ApiError;
use crate::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use http_body_util::BodyExt;
use serde::{de::DeserializeOwned, Serialize};

/// Test client for integration testing without network binding
pub struct TestClient {
    app: App,
}

impl TestClient {
    /// Create a new test client sharing `app`
    pub fn new(app: &App) -> Self {
        Self { app: app.clone() }
    }

    /// Send a GET request
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(TestRequest::get(path)).await
    }

    /// Send a POST request with JSON body
    pub async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> TestResponse {
        self.request(TestRequest::post(path).json(body)).await
    }

    /// Send a request with full control
    pub async fn request(&self, req: TestRequest) -> TestResponse {
        let mut builder = http::Request::builder().method(req.method).uri(req.path.as_str());
        for (key, value) in req.headers.iter() {
            builder = builder.header(key, value);
        }

        let response = match builder.body(req.body.unwrap_or_default()) {
            Ok(request) => self.app.dispatch(request).await,
            Err(err) => ApiError::bad_request(format!("Invalid test request: {}", err)).into_response(),
        };
        TestResponse::from_response(response).await
    }
}

/// Test request builder
#[derive(Debug, Clone)]
pub struct TestRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Create a new request with the given method and path
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a header to the request
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if let (Ok(name), Ok(val)) = (
            key.parse::<http::header::HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, val);
        }
        self
    }

    /// Set the request body as JSON, with a matching Content-Type
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        if let Ok(bytes) = serde_json::to_vec(body) {
            self.body = Some(Bytes::from(bytes));
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
        }
        self
    }

    /// Set the request body as raw bytes
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Test response with assertion helpers
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    async fn from_response(response: Response) -> Self {
        let (parts, body) = response.into_parts();
        let body_bytes = body
            .collect()
            .await
            .map(|b| b.to_bytes())
            .unwrap_or_default();

        Self {
            status: parts.status,
            headers: parts.headers,
            body: body_bytes,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as a string, lossily decoded
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Assert that the response has the expected status code
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(), expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.text()
        );
        self
    }

    /// Assert that the response has the expected header value
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, key: &str, expected: &str) -> &Self {
        let actual = self
            .headers
            .get(key)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        assert_eq!(
            actual, expected,
            "Expected header '{}' to be '{}', got '{}'",
            key, expected, actual
        );
        self
    }

    /// Assert that the response body contains the expected string
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the expected string.
    pub fn assert_body_contains(&self, expected: &str) -> &Self {
        let body = self.text();
        assert!(
            body.contains(expected),
            "Expected body to contain '{}', got '{}'",
            expected,
            body
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Request;
    use crate::view::ViewFunction;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
    struct Band {
        name: String,
        members: u32,
    }

    fn app() -> App {
        let app = App::new("test");
        app.route("/", &[Method::GET], ViewFunction::new("hello", || async { "Hello, World!" }))
            .unwrap();
        app.route(
            "/echo",
            &[Method::POST],
            ViewFunction::new("echo", |req: Request| async move {
                req.json::<Band>().map(crate::response::Json)
            }),
        )
        .unwrap();
        app
    }

    #[tokio::test]
    async fn test_client_get_request() {
        let client = TestClient::new(&app());
        let response = client.get("/").await;
        response.assert_status(200);
        assert_eq!(response.text(), "Hello, World!");
    }

    #[tokio::test]
    async fn test_client_not_found() {
        let client = TestClient::new(&app());
        client.get("/missing").await.assert_status(404);
    }

    #[tokio::test]
    async fn test_client_post_json() {
        let client = TestClient::new(&app());
        let band = Band {
            name: "Queen".into(),
            members: 4,
        };
        let response = client.post_json("/echo", &band).await;
        response.assert_status(200);
        assert_eq!(response.json::<Band>().unwrap(), band);

        let response = client.request(TestRequest::post("/echo").body("not json")).await;
        response.assert_status(400).assert_body_contains("Invalid JSON");
    }

    #[tokio::test]
    async fn test_client_method_not_allowed() {
        let client = TestClient::new(&app());
        let response = client.request(TestRequest::delete("/")).await;
        response.assert_status(405).assert_header("allow", "GET");
    }

    #[test]
    fn test_request_builder_json_sets_content_type() {
        let req = TestRequest::post("/echo").json(&Band {
            name: "Queen".into(),
            members: 4,
        });
        assert_eq!(
            req.headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(req.body.is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn prop_unregistered_paths_are_not_found(segment in "[a-z]{1,12}") {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let client = TestClient::new(&app());
                let response = client.get(&format!("/unregistered/{}", segment)).await;
                prop_assert_eq!(response.status(), StatusCode::NOT_FOUND);
                Ok(())
            })?;
        }
    }
}
