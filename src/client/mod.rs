//! Typed client for the hospital API.
//!
//! One async method per route. Reads go through a [`QueryCache`] keyed by
//! route path; every successful mutation invalidates the list it changes
//! before returning, so the next read re-fetches.

mod cache;
mod error;

pub use cache::QueryCache;
pub use error::ClientError;

use std::collections::BTreeMap;

use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use url::Url;

use crate::auth::SESSION_COOKIE;
use crate::database::models::{
    Appointment, AppointmentListing, AppointmentStatus, Doctor, NewDoctor, NewReport, NewUser,
    Report, Role, User,
};
use crate::validation::{AppointmentRequest, LoginRequest};

const USER_KEY: &str = "/api/user";
const DOCTORS_KEY: &str = "/api/doctors";
const APPOINTMENTS_KEY: &str = "/api/appointments";
const REPORTS_KEY: &str = "/api/reports";

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<String>>,
    cache: QueryCache,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: RwLock::new(None),
            cache: QueryCache::new(),
        })
    }

    /// Resume a session obtained earlier (e.g. persisted by the CLI)
    pub fn with_token(self, token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token),
            ..self
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current session token, if logged in
    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // Session

    pub async fn register(&self, user: &NewUser) -> Result<User, ClientError> {
        let response = self.send(Method::POST, "/api/register", Some(user)).await?;
        self.start_session(response).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let credentials = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self.send(Method::POST, "/api/login", Some(&credentials)).await?;
        self.start_session(response).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.send(Method::POST, "/api/logout", None::<&()>).await?;
        // Local state goes even if the server already forgot the session
        *self.token.write().await = None;
        self.cache.clear().await;
        check(response).await.map(|_| ())
    }

    /// The logged-in user, or `None` when the session is missing or expired
    pub async fn user(&self) -> Result<Option<User>, ClientError> {
        if let Some(cached) = self.cache.get(USER_KEY).await {
            return Ok(serde_json::from_value(cached)?);
        }

        let response = self.send(Method::GET, USER_KEY, None::<&()>).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            self.cache.put(USER_KEY, Value::Null).await;
            return Ok(None);
        }
        let value = check(response).await?;
        self.cache.put(USER_KEY, value.clone()).await;
        Ok(Some(serde_json::from_value(value)?))
    }

    // Doctors

    pub async fn doctors(&self) -> Result<Vec<Doctor>, ClientError> {
        self.query(DOCTORS_KEY).await
    }

    pub async fn doctor(&self, id: i32) -> Result<Option<Doctor>, ClientError> {
        match self.query(&format!("{}/{}", DOCTORS_KEY, id)).await {
            Ok(doctor) => Ok(Some(doctor)),
            Err(ClientError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create_doctor(&self, doctor: &NewDoctor) -> Result<Doctor, ClientError> {
        self.mutate(Method::POST, DOCTORS_KEY, doctor, DOCTORS_KEY).await
    }

    // Appointments

    /// The caller's appointment list, shaped by the logged-in user's role
    pub async fn appointments(&self) -> Result<AppointmentListing, ClientError> {
        let rows: Value = self.query(APPOINTMENTS_KEY).await?;
        let is_admin = matches!(self.user().await?, Some(user) if user.role == Role::Admin);

        Ok(if is_admin {
            AppointmentListing::All(serde_json::from_value(rows)?)
        } else {
            AppointmentListing::Own(serde_json::from_value(rows)?)
        })
    }

    pub async fn book_appointment(
        &self,
        request: &AppointmentRequest,
    ) -> Result<Appointment, ClientError> {
        self.mutate(Method::POST, APPOINTMENTS_KEY, request, APPOINTMENTS_KEY)
            .await
    }

    pub async fn update_appointment_status(
        &self,
        id: i32,
        status: AppointmentStatus,
    ) -> Result<Appointment, ClientError> {
        let path = format!("{}/{}/status", APPOINTMENTS_KEY, id);
        let body = serde_json::json!({ "status": status });
        self.mutate(Method::PATCH, &path, &body, APPOINTMENTS_KEY).await
    }

    // Reports

    pub async fn reports(&self) -> Result<Vec<Report>, ClientError> {
        self.query(REPORTS_KEY).await
    }

    pub async fn create_report(&self, report: &NewReport) -> Result<Report, ClientError> {
        self.mutate(Method::POST, REPORTS_KEY, report, REPORTS_KEY).await
    }

    /// `GET /health`, never cached
    pub async fn health(&self) -> Result<Value, ClientError> {
        let response = self.send(Method::GET, "/health", None::<&()>).await?;
        check(response).await
    }

    async fn query<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        if let Some(cached) = self.cache.get(path).await {
            tracing::debug!("Cache hit for {}", path);
            return Ok(serde_json::from_value(cached)?);
        }

        let response = self.send(Method::GET, path, None::<&()>).await?;
        let value = check(response).await?;
        self.cache.put(path, value.clone()).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn mutate<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        invalidates: &str,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, Some(body)).await?;
        let value = check(response).await?;
        self.cache.invalidate(invalidates).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn start_session(&self, response: Response) -> Result<User, ClientError> {
        let token = session_token(&response);
        let value = check(response).await?;
        if token.is_some() {
            *self.token.write().await = token;
        }
        self.cache.clear().await;
        self.cache.put(USER_KEY, value.clone()).await;
        Ok(serde_json::from_value(value)?)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ClientError> {
        let url = self.base_url.join(path)?;
        let mut request: RequestBuilder = self.http.request(method, url);
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }
}

/// Turn a response into its JSON body, or the server's error
async fn check(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound);
    }

    let bytes = response.bytes().await?;
    if status.is_success() {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    let message = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| status.canonical_reason())
        .unwrap_or("Request failed")
        .to_string();
    let field_errors: BTreeMap<String, String> = body
        .get("field_errors")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        field_errors,
    })
}

fn session_token(response: &Response) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .filter_map(|rest| rest.split(';').next())
        .find(|token| !token.is_empty())
        .map(str::to_string)
}
