//! Authentication and authorization

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::StudentId;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User's roles
    pub roles: Vec<String>,
    /// Student record the user may read, for student accounts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Role names carried in tokens
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const TEACHER: &str = "teacher";
    pub const STUDENT: &str = "student";
}

/// Creates a new JWT token
///
/// # Arguments
///
/// * `user_id` - User identifier
/// * `roles` - User's roles
/// * `student_id` - Linked student record, for student accounts
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    user_id: &str,
    roles: Vec<String>,
    student_id: Option<StudentId>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        roles,
        student_id,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role; admins pass every check
pub fn has_role(claims: &Claims, required_role: &str) -> bool {
    claims
        .roles
        .iter()
        .any(|r| r == required_role || r == roles::ADMIN)
}

/// Teachers and admins see the whole business
pub fn require_staff(claims: &Claims) -> Result<(), AuthError> {
    if has_role(claims, roles::TEACHER) {
        Ok(())
    } else {
        Err(AuthError::MissingPermission("billing:read".to_string()))
    }
}

/// Staff may read any statement; a student only their own
pub fn require_statement_access(claims: &Claims, student_id: StudentId) -> Result<(), AuthError> {
    if has_role(claims, roles::TEACHER) {
        return Ok(());
    }
    if has_role(claims, roles::STUDENT) && claims.student_id == Some(student_id) {
        return Ok(());
    }
    Err(AuthError::MissingPermission("statement:read".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims(roles: &[&str], student_id: Option<StudentId>) -> Claims {
        Claims {
            sub: "user-1".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            student_id,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let student = StudentId::new();
        let token = create_token("u1", vec![roles::STUDENT.to_string()], Some(student), SECRET, 60).unwrap();

        let decoded = validate_token(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, "u1");
        assert_eq!(decoded.student_id, Some(student));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token("u1", vec![], None, SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_staff_access() {
        assert!(require_staff(&claims(&[roles::TEACHER], None)).is_ok());
        assert!(require_staff(&claims(&[roles::ADMIN], None)).is_ok());
        assert!(require_staff(&claims(&[roles::STUDENT], None)).is_err());
    }

    #[test]
    fn test_student_reads_only_own_statement() {
        let own = StudentId::new();
        let student = claims(&[roles::STUDENT], Some(own));

        assert!(require_statement_access(&student, own).is_ok());
        assert!(require_statement_access(&student, StudentId::new()).is_err());
        assert!(require_statement_access(&claims(&[roles::TEACHER], None), own).is_ok());
        assert!(require_statement_access(&claims(&[], Some(own)), own).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn student_token_never_opens_another_statement(own in any::<u128>(), other in any::<u128>()) {
                prop_assume!(own != other);
                let own = StudentId::from(uuid::Uuid::from_u128(own));
                let other = StudentId::from(uuid::Uuid::from_u128(other));

                let student = claims(&[roles::STUDENT], Some(own));
                prop_assert!(require_statement_access(&student, own).is_ok());
                prop_assert!(require_statement_access(&student, other).is_err());
            }
        }
    }
}
