// src/services/api_client.rs
// DOCUMENTATION: Bapful backend API client
// PURPOSE: Authenticated HTTP calls with local session bookkeeping

use crate::config::Config;
use crate::errors::ClientError;
use crate::models::{
    AuthResponse, Coordinates, CreateReviewRequest, LocationRecord, LoginRequest, Place,
    RateReviewRequest, RecommendationSection, Recommendations, RegisterRequest, Review,
    ReviewVote, ReviewVotes, Session, User,
};
use crate::services::SessionManager;
use crate::store::SessionStore;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

/// Largest page the reviews endpoint serves
pub const MAX_REVIEW_PAGE: u32 = 50;

/// Whether a request carries the stored bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// Attach `Authorization: Bearer <token>` when a token is stored
    Bearer,
    /// Never attach credentials
    Anonymous,
}

/// Response of GET /health
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub app: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// Bapful REST API client
/// DOCUMENTATION: Single-attempt requests, no retries. Every failed request
/// surfaces as a ClientError; a 401 additionally drops the local session.
#[derive(Clone)]
pub struct ApiClient {
    /// HTTP client for making requests
    client: Client,
    /// Parsed base URL; request paths are appended as segments
    base_url: Url,
    /// Owner of the persisted session
    session: SessionManager,
    /// Tell the backend about logouts
    remote_logout: bool,
}

impl ApiClient {
    /// Create a client from configuration
    /// DOCUMENTATION: The store decides where the session lives
    /// (MemoryStore for tests, FileStore for the CLI)
    pub fn new(config: &Config, store: Arc<dyn SessionStore>) -> Result<Self, ClientError> {
        let mut client =
            Self::with_session(&config.api_base_url, config.request_timeout(), SessionManager::new(store))?;
        client.remote_logout = config.remote_logout;
        Ok(client)
    }

    /// Create a client around an existing session manager
    pub fn with_session(
        base_url: &str,
        timeout: Duration,
        session: SessionManager,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| ClientError::Validation(format!("invalid base URL '{}': {}", base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(ClientError::Validation(format!(
                "base URL cannot carry paths: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bapful-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("cannot build HTTP client: {}", e)))?;

        log::debug!("API client using base URL {}", base_url);

        Ok(Self {
            client,
            base_url,
            session,
            remote_logout: false,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Session accessor shared with this client
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Log in and persist the session
    /// DOCUMENTATION: Any non-2xx answer becomes ClientError::Auth;
    /// network failures stay ClientError::Network
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = LoginRequest::new(email, password);
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let response: AuthResponse = self
            .send_json(Method::POST, &["auth", "login"], &request, Auth::Anonymous)
            .await
            .map_err(auth_failure)?;

        self.start_session(response).await
    }

    /// Register a new account and persist the session
    /// DOCUMENTATION: An already registered email is ClientError::Conflict.
    /// Backends have answered that with 409 and with 400 + detail, both are mapped.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let request = RegisterRequest::new(name, email, password);
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let response: AuthResponse = self
            .send_json(Method::POST, &["auth", "register"], &request, Auth::Anonymous)
            .await
            .map_err(register_failure)?;

        self.start_session(response).await
    }

    /// Log out
    /// DOCUMENTATION: The remote call is best effort; the local session is
    /// cleared no matter what and nothing is reported to the caller
    pub async fn logout(&self) {
        if self.remote_logout && self.session.is_authenticated().await {
            let result: Result<Value, ClientError> = match self.request(Method::POST, &["auth", "logout"]) {
                Ok(builder) => self.send(builder, Auth::Bearer).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                log::warn!("Remote logout failed, clearing local session anyway: {}", e);
            }
        }

        self.session.clear().await;
        log::info!("Logged out");
    }

    /// Persisted user, None when absent, unreadable or without a token
    pub async fn current_user(&self) -> Option<User> {
        self.session.current_user().await
    }

    /// True iff a token is stored
    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    async fn start_session(&self, response: AuthResponse) -> Result<Session, ClientError> {
        let session = Session::from(response);
        self.session.save(&session).await?;
        log::info!("Session started for user {}", session.user.id);
        Ok(session)
    }

    // ------------------------------------------------------------------
    // Locations
    // ------------------------------------------------------------------

    /// GET /health
    pub async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        self.get(&["health"], &[], Auth::Anonymous).await
    }

    /// Reviewed places around a point
    /// DOCUMENTATION: GET /locations?lat&lng&radius; records that cannot be
    /// placed on a map are dropped, distances are filled in client-side
    pub async fn nearby_locations(
        &self,
        origin: Coordinates,
        radius_m: Option<u32>,
    ) -> Result<Vec<Place>, ClientError> {
        let mut query = vec![("lat", origin.lat.to_string()), ("lng", origin.lng.to_string())];
        if let Some(radius) = radius_m {
            query.push(("radius", radius.to_string()));
        }

        let records: Vec<LocationRecord> = self.get(&["locations"], &query, Auth::Bearer).await?;
        log::debug!("Nearby search returned {} records", records.len());

        Ok(with_distances(Place::from_locations(records), &origin))
    }

    /// Category buckets of recommended places
    /// DOCUMENTATION: GET /locations with optional origin and per_category
    pub async fn recommendations(
        &self,
        origin: Option<Coordinates>,
        per_category: Option<u32>,
    ) -> Result<Vec<Recommendations>, ClientError> {
        let mut query = Vec::new();
        if let Some(origin) = origin {
            query.push(("lat", origin.lat.to_string()));
            query.push(("lng", origin.lng.to_string()));
        }
        if let Some(per_category) = per_category.filter(|n| *n > 0) {
            query.push(("per_category", per_category.to_string()));
        }

        let sections: Vec<RecommendationSection> =
            self.get(&["locations"], &query, Auth::Bearer).await?;

        Ok(sections.into_iter().map(Recommendations::from_section).collect())
    }

    /// Keyword search around a point
    /// DOCUMENTATION: GET /locations/search?query&lat&lng
    pub async fn search_locations(
        &self,
        keyword: &str,
        origin: Coordinates,
    ) -> Result<Vec<Place>, ClientError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ClientError::Validation("search keyword is empty".to_string()));
        }

        let query = [
            ("query", keyword.to_string()),
            ("lat", origin.lat.to_string()),
            ("lng", origin.lng.to_string()),
        ];

        let records: Vec<LocationRecord> =
            self.get(&["locations", "search"], &query, Auth::Bearer).await?;
        log::debug!("Search '{}' returned {} records", keyword, records.len());

        Ok(with_distances(Place::from_locations(records), &origin))
    }

    /// Single place by id
    pub async fn location(&self, location_id: &str) -> Result<Place, ClientError> {
        let record: LocationRecord = self
            .get(&["locations", location_id], &[], Auth::Bearer)
            .await?;
        Place::from_location(record)
    }

    /// Page of reviews for a place
    /// DOCUMENTATION: limit is clamped to 1..=50, the range the backend accepts
    pub async fn location_reviews(
        &self,
        location_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Review>, ClientError> {
        let query = [
            ("limit", limit.clamp(1, MAX_REVIEW_PAGE).to_string()),
            ("offset", offset.to_string()),
        ];
        self.get(&["locations", location_id, "reviews"], &query, Auth::Bearer)
            .await
    }

    /// Place together with its first page of reviews
    pub async fn location_with_reviews(
        &self,
        location_id: &str,
        limit: u32,
    ) -> Result<Place, ClientError> {
        let place = self.location(location_id).await?;
        let reviews = self.location_reviews(location_id, limit, 0).await?;
        Ok(place.with_reviews(reviews))
    }

    /// POST /locations/{id}/reviews (authenticated)
    pub async fn create_review(
        &self,
        location_id: &str,
        rating: u8,
        comment: Option<&str>,
    ) -> Result<Review, ClientError> {
        let request = CreateReviewRequest {
            rating,
            comment: comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
        };
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        self.send_json(
            Method::POST,
            &["locations", location_id, "reviews"],
            &request,
            Auth::Bearer,
        )
        .await
    }

    /// Up- or down-vote a review (authenticated)
    pub async fn rate_review(
        &self,
        location_id: &str,
        review_id: &str,
        vote: ReviewVote,
    ) -> Result<ReviewVotes, ClientError> {
        self.send_json(
            Method::POST,
            &["locations", location_id, "review", review_id, "rate"],
            &RateReviewRequest { rating: vote },
            Auth::Bearer,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Generic request wrapper
    // ------------------------------------------------------------------

    /// GET `segments` with query parameters and decode the JSON answer
    pub async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        auth: Auth,
    ) -> Result<T, ClientError> {
        let builder = self.request(Method::GET, segments)?.query(query);
        self.send(builder, auth).await
    }

    /// Send a JSON body and decode the JSON answer
    pub async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
        auth: Auth,
    ) -> Result<T, ClientError> {
        let builder = self.request(method, segments)?.json(body);
        self.send(builder, auth).await
    }

    /// Start a request against `base_url/segments...`
    /// DOCUMENTATION: Segments are percent-encoded, so ids may hold any text
    pub fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        Ok(self.client.request(method, self.endpoint(segments)?))
    }

    /// Execute a request
    /// DOCUMENTATION: Injects the bearer token when asked to and one is stored.
    /// A 401 clears the local session before the error is returned.
    pub async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        auth: Auth,
    ) -> Result<T, ClientError> {
        let builder = match auth {
            Auth::Bearer => match self.session.token().await {
                Some(token) => builder.bearer_auth(token),
                None => builder,
            },
            Auth::Anonymous => builder,
        };

        let request = builder
            .build()
            .map_err(|e| ClientError::Validation(format!("cannot build request: {}", e)))?;
        let (method, url) = (request.method().clone(), request.url().path().to_string());

        log::debug!("{} {}", method, url);

        let response = self.client.execute(request).await.map_err(|e| {
            log::error!("{} {} failed: {}", method, url, e);
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            log::error!("Reading {} {} response failed: {}", method, url, e);
            ClientError::Network(e.to_string())
        })?;

        if !status.is_success() {
            let body = error_body(&bytes);
            log::warn!("{} {} answered {}", method, url, status);

            if status == StatusCode::UNAUTHORIZED {
                log::info!("Authorization rejected, clearing local session");
                self.session.clear().await;
            }

            return Err(ClientError::Http { status, body });
        }

        let payload: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };

        serde_json::from_slice(payload).map_err(|e| {
            log::error!("Failed to parse {} {} response: {}", method, url, e);
            ClientError::Parse(format!("{} {}: {}", method, url, e))
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Validation(format!("base URL cannot carry paths: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// Parse an error body: JSON when possible, raw text otherwise
fn error_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

fn with_distances(places: Vec<Place>, origin: &Coordinates) -> Vec<Place> {
    places
        .into_iter()
        .map(|place| place.with_distance_from(origin))
        .collect()
}

/// Login/register rejections are authentication failures
fn auth_failure(err: ClientError) -> ClientError {
    match err {
        ClientError::Http { status, body } => {
            let message = crate::errors::extract_detail(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request rejected")
                    .to_string()
            });
            ClientError::Auth { status, message }
        }
        other => other,
    }
}

fn register_failure(err: ClientError) -> ClientError {
    if let ClientError::Http { status, body } = &err {
        if is_duplicate_email(*status, body) {
            return ClientError::Conflict(
                crate::errors::extract_detail(body)
                    .unwrap_or_else(|| "Email already registered".to_string()),
            );
        }
    }
    auth_failure(err)
}

fn is_duplicate_email(status: StatusCode, body: &Value) -> bool {
    if status == StatusCode::CONFLICT {
        return true;
    }
    status == StatusCode::BAD_REQUEST
        && crate::errors::extract_detail(body)
            .map(|d| d.to_lowercase().contains("already registered"))
            .unwrap_or(false)
}
