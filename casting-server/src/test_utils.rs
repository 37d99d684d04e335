use crate::create_app;
use crate::models::{NewActor, NewMovie, NewPerformance};
use crate::state::AppState;
use crate::store::Catalog;
use axum::Router;
use axum::body::Body;
use casting_auth::testutil::{TEST_AUDIENCE, TokenBuilder, primary_jwks};
use casting_auth::{AuthSettings, AuthorizationGate};
use chrono::NaiveDate;
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use log::LevelFilter;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Permissions of the agency's three roles
pub const CASTING_ASSISTANT: &[&str] = &["get:actors", "get:movies"];
pub const CASTING_DIRECTOR: &[&str] = &[
    "get:actors",
    "get:movies",
    "post:actors",
    "patch:actors",
    "delete:actors",
    "patch:movies",
];
pub const EXECUTIVE_PRODUCER: &[&str] = &[
    "get:actors",
    "get:movies",
    "post:actors",
    "patch:actors",
    "delete:actors",
    "post:movies",
    "patch:movies",
    "delete:movies",
];

/// Test fixture running the whole application against a mocked identity
/// provider.
///
/// The provider serves the primary test key set at the well-known path and
/// the catalog is seeded with two actors and one movie, with actor 1 cast in
/// movie 1 (rating 4).
///
/// # Examples
///
/// ```rust
/// #[tokio::test]
/// async fn test_endpoint() {
///     let fixture = TestFixture::new().await;
///
///     // Requests carry an executive producer token unless told otherwise
///     let response = fixture.get("/movies").await;
///     response.assert_ok();
///
///     // Or pick the caller's permissions explicitly
///     let token = fixture.token(CASTING_ASSISTANT);
///     let response = fixture.delete_with_token("/movies/1", Some(&token)).await;
///     response.assert_error(StatusCode::UNAUTHORIZED, "Permission not found.");
/// }
/// ```
pub struct TestFixture {
    /// The application router
    pub app: Router,
    /// Settings the gate verifies against
    pub settings: AuthSettings,
    /// Mock identity provider, kept alive for the fixture's lifetime
    _provider_mock: MockServer,
}

impl TestFixture {
    /// Creates a fixture whose provider publishes the primary test keys.
    pub async fn new() -> Self {
        let provider_mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(primary_jwks()))
            .mount(&provider_mock)
            .await;
        Self::with_provider(provider_mock).await
    }

    /// Creates a fixture whose provider fails every key-set request.
    pub async fn with_unreachable_provider() -> Self {
        let provider_mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&provider_mock)
            .await;
        Self::with_provider(provider_mock).await
    }

    async fn with_provider(provider_mock: MockServer) -> Self {
        Self::setup_logger(LevelFilter::Debug);

        let settings = AuthSettings::new(provider_mock.uri(), TEST_AUDIENCE)
            .expect("mock provider settings are valid")
            .with_key_fetch_timeout(Duration::from_secs(1));
        let gate = AuthorizationGate::from_settings(settings.clone())
            .expect("gate builds from mock provider settings");
        let state = AppState::new(gate, seeded_catalog().await);
        let app = create_app(state);

        Self {
            app,
            settings,
            _provider_mock: provider_mock,
        }
    }

    /// Initializes the test logger with the given level.
    pub fn setup_logger(level: LevelFilter) {
        let _ = env_logger::builder()
            .filter_level(level)
            .is_test(true)
            .try_init();
    }

    /// Signs a token for the mock provider carrying the given permissions.
    pub fn token(&self, permissions: &[&str]) -> String {
        TokenBuilder::new()
            .issuer(self.settings.required_issuer())
            .permissions(permissions)
            .build()
    }

    /// Creates a request builder with an executive producer token and a JSON
    /// content type.
    pub fn request_builder(&self, method: Method, uri: impl AsRef<str>) -> http::request::Builder {
        let token = self.token(EXECUTIVE_PRODUCER);
        self.request_builder_with_token(method, uri, Some(&token))
    }

    /// Creates a request builder with the given bearer token, or none at all.
    pub fn request_builder_with_token(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        token: Option<&str>,
    ) -> http::request::Builder {
        let mut builder = Request::builder().method(method).uri(uri.as_ref());
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.header("Content-Type", "application/json")
    }

    pub async fn get(&self, uri: impl AsRef<str>) -> TestResponse {
        let token = self.token(EXECUTIVE_PRODUCER);
        self.get_with_token(uri, Some(&token)).await
    }

    pub async fn get_with_token(&self, uri: impl AsRef<str>, token: Option<&str>) -> TestResponse {
        let request = self
            .request_builder_with_token(Method::GET, uri, token)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    pub async fn post<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let token = self.token(EXECUTIVE_PRODUCER);
        self.post_with_token(uri, body, Some(&token)).await
    }

    pub async fn post_with_token<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        self.send_json(Method::POST, uri, body, token).await
    }

    pub async fn patch<T: Serialize>(&self, uri: impl AsRef<str>, body: &T) -> TestResponse {
        let token = self.token(EXECUTIVE_PRODUCER);
        self.patch_with_token(uri, body, Some(&token)).await
    }

    pub async fn patch_with_token<T: Serialize>(
        &self,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        self.send_json(Method::PATCH, uri, body, token).await
    }

    pub async fn delete(&self, uri: impl AsRef<str>) -> TestResponse {
        let token = self.token(EXECUTIVE_PRODUCER);
        self.delete_with_token(uri, Some(&token)).await
    }

    pub async fn delete_with_token(
        &self,
        uri: impl AsRef<str>,
        token: Option<&str>,
    ) -> TestResponse {
        let request = self
            .request_builder_with_token(Method::DELETE, uri, token)
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    async fn send_json<T: Serialize>(
        &self,
        method: Method,
        uri: impl AsRef<str>,
        body: &T,
        token: Option<&str>,
    ) -> TestResponse {
        let json_body = serde_json::to_vec(body).expect("Failed to serialize body to JSON");
        let request = self
            .request_builder_with_token(method, uri, token)
            .body(Body::from(json_body))
            .expect("Failed to build request");
        self.send(request).await
    }

    /// Sends a request and returns a TestResponse.
    ///
    /// Non-JSON or empty bodies are exposed as an empty JSON object.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        let json = if !body.is_empty() {
            serde_json::from_slice(&body).unwrap_or_else(|_| serde_json::json!({}))
        } else {
            serde_json::json!({})
        };

        TestResponse {
            status,
            headers,
            json,
        }
    }
}

async fn seeded_catalog() -> Catalog {
    let catalog = Catalog::new();
    catalog
        .create_actor(NewActor {
            name: "Ada Lane".to_string(),
            age: 41,
            gender: "female".to_string(),
            genres: vec!["drama".to_string()],
            seeking_work: true,
        })
        .await;
    catalog
        .create_actor(NewActor {
            name: "Tomas Reyes".to_string(),
            age: 35,
            gender: "male".to_string(),
            genres: vec!["comedy".to_string()],
            seeking_work: false,
        })
        .await;
    let movie = catalog
        .create_movie(NewMovie {
            title: "The Long Take".to_string(),
            release_date: NaiveDate::from_ymd_opt(2024, 5, 17).expect("valid date"),
            genres: vec!["drama".to_string()],
        })
        .await;
    catalog
        .add_performance(
            movie.id,
            NewPerformance {
                actor_id: 1,
                actor_rating: Some(4),
            },
        )
        .await
        .expect("seeded movie and actor exist");
    catalog
}

/// Response from a test request with its status, headers and JSON body.
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body as JSON (if present and valid JSON)
    pub json: Value,
}

impl TestResponse {
    /// Asserts that the response has the expected status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match the expected value.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "Expected status {} but got {} with body: {}",
            expected,
            self.status,
            serde_json::to_string_pretty(&self.json).unwrap_or_default()
        );
        self
    }

    /// Asserts that the response status is OK (200).
    pub fn assert_ok(&self) -> &Self {
        self.assert_status(StatusCode::OK)
    }

    /// Asserts an error response with the agency's error body.
    pub fn assert_error(&self, expected: StatusCode, message: &str) -> &Self {
        self.assert_status(expected);
        assert_eq!(
            self.json,
            serde_json::json!({
                "success": false,
                "error": expected.as_u16(),
                "message": message,
            })
        );
        self
    }

    /// Converts the response body to the specified type.
    ///
    /// # Panics
    ///
    /// Panics if deserialization fails.
    pub fn json_as<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.json.clone()).expect("Failed to deserialize response JSON")
    }
}
