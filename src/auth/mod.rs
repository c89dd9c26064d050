use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::{HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_SESSION_EXPIRY_HOURS};
use crate::database::models::{Role, User};
use crate::database::{Backends, SessionStore, Storage, StorageError};

/// Name of the cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "hospital_session";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Server-side session row
    pub sid: Uuid,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid session secret")]
    InvalidSecret,
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
    #[error("Session lifetime of {0} hours is out of range")]
    InvalidLifetime(u64),
    #[error("Password task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Hash a password into an argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is not a valid PHC string: {}", e);
            false
        }
    }
}

/// Hash on the blocking pool so argon2 never runs on a runtime worker
pub async fn hash_password_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// Check login credentials on the blocking pool.
///
/// An unknown user (`stored == None`) is verified against a fixed hash so the
/// response takes as long as a wrong password for a real account.
pub async fn check_credentials(password: String, stored: Option<String>) -> Result<bool, AuthError> {
    let matched = tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password(&password, &stored),
        None => {
            if let Some(dummy) = dummy_hash() {
                verify_password(&password, dummy);
            }
            false
        }
    })
    .await?;
    Ok(matched)
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("hospital-api-unknown-user").ok())
        .as_deref()
}

/// A freshly established session, ready to be handed to the client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub max_age_secs: i64,
}

/// Issues and verifies session tokens.
///
/// A token is only honoured while its session row exists, so logout (which
/// deletes the row) invalidates the token even before it expires.
#[derive(Clone)]
pub struct SessionManager {
    storage: Arc<dyn Storage>,
    sessions: Arc<dyn SessionStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
    lifetime_hours: u64,
    cookie_secure: bool,
}

impl SessionManager {
    pub fn new(backends: &Backends, security: &SecurityConfig) -> Result<Self, AuthError> {
        let secret = &security.session_secret;
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        let hours = security.session_expiry_hours;
        if hours > MAX_SESSION_EXPIRY_HOURS {
            return Err(AuthError::InvalidLifetime(hours));
        }

        Ok(Self {
            storage: backends.storage.clone(),
            sessions: backends.sessions.clone(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(hours as i64),
            lifetime_hours: hours,
            cookie_secure: security.cookie_secure,
        })
    }

    /// Create a session row for the user and sign a token referencing it
    pub async fn establish(&self, user: &User) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.lifetime)
            .ok_or(AuthError::InvalidLifetime(self.lifetime_hours))?;
        let session = self.sessions.create_session(user.id, expires_at).await?;

        let claims = Claims {
            sub: user.id.to_string(),
            sid: session.id,
            role: user.role,
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))?;

        tracing::debug!("Established session {} for user {}", session.id, user.id);
        Ok(IssuedSession {
            token,
            max_age_secs: self.lifetime.num_seconds(),
        })
    }

    /// Decode a token without consulting the session store
    pub fn decode(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!("Rejected session token: {}", e);
                None
            }
        }
    }

    /// Resolve a token to its user. `Ok(None)` means not authenticated.
    pub async fn verify(&self, token: &str) -> Result<Option<(Claims, User)>, AuthError> {
        let Some(claims) = self.decode(token) else {
            return Ok(None);
        };
        let Ok(user_id) = claims.sub.parse::<i32>() else {
            return Ok(None);
        };

        let session = match self.sessions.get_session(claims.sid).await? {
            Some(session) if session.user_id == user_id => session,
            _ => {
                tracing::debug!("Session {} is gone or expired", claims.sid);
                return Ok(None);
            }
        };

        let user = self.storage.get_user(session.user_id).await?;
        Ok(user.map(|user| (claims, user)))
    }

    /// Destroy the session a token refers to, if it is still decodable
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        if let Some(claims) = self.decode(token) {
            self.sessions.delete_session(claims.sid).await?;
            tracing::debug!("Revoked session {}", claims.sid);
        }
        Ok(())
    }

    pub fn session_cookie(&self, issued: &IssuedSession) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE, issued.token, issued.max_age_secs
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }

    pub fn clear_cookie(&self) -> HeaderValue {
        if self.cookie_secure {
            HeaderValue::from_static(
                "hospital_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Secure",
            )
        } else {
            HeaderValue::from_static("hospital_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
        }
    }
}

/// Pull the session token from the cookie, falling back to a Bearer header
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::models::NewUser;

    async fn manager_with_user() -> (SessionManager, User) {
        let backends = Backends::memory();
        let config = AppConfig::in_memory();
        let manager = SessionManager::new(&backends, &config.security).unwrap();
        let user = backends
            .storage
            .create_user(NewUser {
                username: "jdoe".into(),
                password: hash_password("secret").unwrap(),
                role: Role::Patient,
                name: "John Doe".into(),
                email: "john@example.com".into(),
                mobile: None,
            })
            .await
            .unwrap();
        (manager, user)
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "plaintext"));
    }

    #[tokio::test]
    async fn blocking_helpers_match_sync_hashing() {
        let hash = hash_password_blocking("hunter2".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(check_credentials("hunter2".into(), Some(hash.clone())).await.unwrap());
        assert!(!check_credentials("hunter3".into(), Some(hash)).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_user_still_pays_for_a_verification() {
        assert!(dummy_hash().is_some_and(|hash| hash.starts_with("$argon2id$")));
        assert!(!check_credentials("hunter2".into(), None).await.unwrap());
    }

    #[test]
    fn oversized_lifetime_is_rejected() {
        let backends = Backends::memory();
        let mut config = AppConfig::in_memory();
        config.security.session_expiry_hours = u64::MAX;
        assert!(matches!(
            SessionManager::new(&backends, &config.security),
            Err(AuthError::InvalidLifetime(u64::MAX))
        ));
    }

    #[tokio::test]
    async fn issued_token_verifies_until_revoked() {
        let (manager, user) = manager_with_user().await;
        let issued = manager.establish(&user).await.unwrap();

        let (claims, found) = manager.verify(&issued.token).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(claims.role, Role::Patient);

        manager.revoke(&issued.token).await.unwrap();
        assert!(manager.verify(&issued.token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let (manager, user) = manager_with_user().await;
        let issued = manager.establish(&user).await.unwrap();

        let at = issued.token.rfind('.').unwrap() + 5;
        let original = &issued.token[at..at + 1];
        let replacement = if original == "A" { "B" } else { "A" };
        let tampered = format!("{}{}{}", &issued.token[..at], replacement, &issued.token[at + 1..]);
        assert!(manager.verify(&tampered).await.unwrap().is_none());
        assert!(manager.verify("not-a-token").await.unwrap().is_none());
    }

    #[test]
    fn extracts_cookie_before_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-header"));

        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; hospital_session=from-cookie"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn cookie_attributes_follow_config() {
        let backends = Backends::memory();
        let mut config = AppConfig::in_memory();
        config.security.cookie_secure = true;
        let manager = SessionManager::new(&backends, &config.security).unwrap();

        let cookie = manager
            .session_cookie(&IssuedSession {
                token: "abc".into(),
                max_age_secs: 60,
            })
            .unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("hospital_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=60"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = manager.clear_cookie();
        let cleared = cleared.to_str().unwrap();
        assert!(cleared.starts_with("hospital_session=;"));
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));

        config.security.cookie_secure = false;
        let plain = SessionManager::new(&backends, &config.security).unwrap();
        assert!(!plain.clear_cookie().to_str().unwrap().contains("Secure"));
    }
}
