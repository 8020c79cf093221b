use super::model::{AppMetadata, AuthenticatedUser};
use crate::core::error::AppError;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Verifies HS256 access tokens issued by the backend's auth service
pub struct JwtValidator {
    decoding_key: DecodingKey,
    audience: String,
    leeway: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct Claims {
    sub: String,
    #[serde(rename = "exp")]
    _exp: u64,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_metadata: AppMetadata,
}

impl JwtValidator {
    pub fn new(secret: &str, audience: String, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            audience,
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Token subject is not a user id".to_string()))?;

        Ok(AuthenticatedUser {
            id,
            email: claims.email,
            roles: claims.app_metadata.all_roles(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    const SECRET: &str = "super-secret-jwt-token-with-at-least-32-characters";

    fn token(claims: Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn validator() -> JwtValidator {
        JwtValidator::new(SECRET, "authenticated".to_string(), Duration::from_secs(0))
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn test_valid_token_yields_user() {
        let id = Uuid::new_v4();
        let jwt = token(
            json!({
                "sub": id.to_string(),
                "aud": "authenticated",
                "exp": in_one_hour(),
                "email": "student@campus.test",
                "role": "authenticated",
                "app_metadata": { "provider": "email", "role": "admin" }
            }),
            SECRET,
        );

        let user = validator().validate_token(&jwt).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email.as_deref(), Some("student@campus.test"));
        assert!(user.is_admin());
    }

    #[test]
    fn test_missing_app_metadata_means_no_roles() {
        let jwt = token(
            json!({ "sub": Uuid::new_v4().to_string(), "aud": "authenticated", "exp": in_one_hour() }),
            SECRET,
        );

        let user = validator().validate_token(&jwt).unwrap();
        assert!(user.roles.is_empty());
        assert!(user.email.is_none());
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let jwt = token(
            json!({ "sub": Uuid::new_v4().to_string(), "aud": "authenticated", "exp": in_one_hour() }),
            "another-secret-another-secret-another",
        );
        assert!(matches!(validator().validate_token(&jwt), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_rejects_expired_and_wrong_audience() {
        let expired = token(
            json!({ "sub": Uuid::new_v4().to_string(), "aud": "authenticated", "exp": 1_000_000 }),
            SECRET,
        );
        assert!(validator().validate_token(&expired).is_err());

        let anon = token(
            json!({ "sub": Uuid::new_v4().to_string(), "aud": "anon", "exp": in_one_hour() }),
            SECRET,
        );
        assert!(validator().validate_token(&anon).is_err());
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        let jwt = token(
            json!({ "sub": "service", "aud": "authenticated", "exp": in_one_hour() }),
            SECRET,
        );
        assert!(matches!(validator().validate_token(&jwt), Err(AppError::Auth(_))));
    }
}
