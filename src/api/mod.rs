//! HTTP client for the restaurant backend

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::cart::CartItem;
use crate::model::{
    OrderCreated, OrderRequest, OrderSummary, TodayMenu, TransportInfo, TransportLocation,
    WeekMenu,
};

/// Name of the backend's session cookie
const SESSION_COOKIE: &str = "session";

/// Local storage key the session cookie value is kept under
pub const SESSION_KEY: &str = "session";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Please log in first")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Server returned HTTP {0}")]
    Status(StatusCode),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        // Redirects are inspected by login, never followed
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn set_session(&mut self, session: Option<String>) {
        self.session = session;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_cookie(self.http.get(self.url(path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.with_cookie(self.http.post(self.url(path)))
    }

    fn with_cookie(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session {
            Some(session) => request.header(COOKIE, format!("{}={}", SESSION_COOKIE, session)),
            None => request,
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn week_menu(&self) -> Result<WeekMenu, ApiError> {
        tracing::debug!("GET /api/menu/week");
        let response = self.get("/api/menu/week").send().await?;
        Self::decode(response).await
    }

    pub async fn today_menu(&self) -> Result<TodayMenu, ApiError> {
        tracing::debug!("GET /api/menu/today");
        let response = self.get("/api/menu/today").send().await?;
        Self::decode(response).await
    }

    pub async fn transport_info(&self) -> Result<Vec<TransportLocation>, ApiError> {
        tracing::debug!("GET /api/transport-info");
        let response = self.get("/api/transport-info").send().await?;
        let info: TransportInfo = Self::decode(response).await?;
        Ok(info.locations)
    }

    /// Submit the cart; returns the new order id
    pub async fn create_order(&self, items: &[CartItem]) -> Result<String, ApiError> {
        tracing::info!("Submitting order with {} line(s)", items.len());
        let body = OrderRequest {
            items,
            pickup_time: None,
        };
        let response = self.post("/api/orders").json(&body).send().await?;
        let created: OrderCreated = Self::decode(response).await?;
        Ok(created.id)
    }

    pub async fn my_orders(&self) -> Result<Vec<OrderSummary>, ApiError> {
        tracing::debug!("GET /api/orders/my");
        let response = self.get("/api/orders/my").send().await?;
        Self::decode(response).await
    }

    /// Log in with the web form; on success the session cookie is kept and returned
    pub async fn login(&mut self, email: &str, password: &str) -> Result<String, ApiError> {
        let form = [("email", email.trim().to_lowercase()), ("password", password.to_string())];
        let response = self.http.post(self.url("/login")).form(&form).send().await?;

        let status = response.status();
        if !status.is_redirection() {
            return Err(ApiError::Status(status));
        }

        // Failed logins redirect back to the form
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if location.trim_end_matches('/').ends_with("/login") {
            return Err(ApiError::InvalidCredentials);
        }

        let session = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(parse_session_cookie)
            .ok_or_else(|| ApiError::Decode("login response did not set a session".to_string()))?;

        tracing::info!("Logged in as {}", email);
        self.session = Some(session.clone());
        Ok(session)
    }
}

/// Extract the session value from a Set-Cookie header
fn parse_session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name == SESSION_COOKIE && !value.is_empty() {
        Some(value.to_string())
    } else {
        None
    }
}
