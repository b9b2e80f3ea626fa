use std::fmt;

use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ModelError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String, // normalized, unique
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    /// Administrators bypass ownership checks.
    pub fn is_admin(&self) -> bool {
        self.is_superuser
    }

    pub fn check_password(&self, plain: &str) -> anyhow::Result<bool> {
        super::password::verify_password(plain, &self.password_hash)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

/// Validated account data ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn regular(email: &str, password_hash: String) -> Result<Self, ModelError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(ModelError::InvalidArgument(
                "Users must have an email address".into(),
            ));
        }
        Ok(Self {
            email,
            password_hash,
            is_staff: false,
            is_superuser: false,
        })
    }

    pub fn superuser(email: &str, password_hash: String) -> Result<Self, ModelError> {
        Ok(Self {
            is_staff: true,
            is_superuser: true,
            ..Self::regular(email, password_hash)?
        })
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_email_is_rejected() {
        let err = NewUser::regular("", "hash".into()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidArgument(_)));
        assert!(NewUser::superuser("   ", "hash".into()).is_err());
    }

    #[test]
    fn email_is_lowercased() {
        let user = NewUser::regular("test@psykweb.COM", "hash".into()).unwrap();
        assert_eq!(user.email, "test@psykweb.com");
        assert!(!user.is_staff);
        assert!(!user.is_superuser);
    }

    #[test]
    fn superuser_sets_both_flags() {
        let user = NewUser::superuser("Admin@Example.com", "hash".into()).unwrap();
        assert!(user.is_staff);
        assert!(user.is_superuser);
        assert_eq!(user.email, "admin@example.com");
    }
}
