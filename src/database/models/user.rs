use serde::{Deserialize, Serialize};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Doctor => write!(f, "doctor"),
        }
    }
}

/// User model for database storage
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub(in crate::database) password_hash: String,
    pub role: Role,
}

impl User {
    /// Verify a password against the stored hash
    pub fn verify_password(&self, password: &str) -> bool {
        let parsed_hash = match PasswordHash::new(&self.password_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// A user not yet stored. The id is assigned by the database.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub(in crate::database) password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(username: String, password: &str, role: Role) -> Result<Self, Error> {
        Ok(Self {
            username,
            password_hash: hash_password(password)?,
            role,
        })
    }
}

/// Argon2 hash with a fresh random salt, in PHC string format.
pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(password: &str) -> User {
        let new = NewUser::new("house".into(), password, Role::Doctor).unwrap();
        User {
            id: 1,
            username: new.username,
            password_hash: new.password_hash,
            role: new.role,
        }
    }

    #[test]
    fn test_verify_password() {
        let u = user("Lupus!123");
        assert!(u.verify_password("Lupus!123"));
        assert!(!u.verify_password("lupus!123"));
        assert!(!u.verify_password(""));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("same"));
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let mut u = user("x");
        u.password_hash = "not-a-hash".into();
        assert!(!u.verify_password("x"));
    }

    #[test]
    fn test_serialize_hides_hash() {
        let json = serde_json::to_string(&user("secret")).unwrap();
        assert!(json.contains("\"role\":\"doctor\""));
        assert!(!json.contains("password_hash"));
    }
}
