use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Patient,
}

impl Role {
    pub const ALLOWED: &'static str = "admin, patient";

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Patient => "patient",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "patient" => Ok(Role::Patient),
            other => Err(UnknownVariant {
                value: other.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Persisted user row. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub mobile: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Insertable user: everything but `id` and `createdAt`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_serialized() {
        let user = User {
            id: 1,
            username: "jdoe".into(),
            password: "$argon2id$v=19$secret".into(),
            role: Role::Patient,
            name: "John Doe".into(),
            email: "john@example.com".into(),
            mobile: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["role"], "patient");
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn role_parses_lowercase_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("Admin".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Patient);
    }
}
