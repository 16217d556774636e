use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Tokens expire one hour after issue. There is no revocation; a
/// compromised token stays valid until it expires naturally.
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User id
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<String, AppError> {
        let issued_at = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at as usize,
            exp: (issued_at + TOKEN_TTL_SECS) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| AppError::Internal("Token generation error".to_string()))
    }

    /// Returns `None` on any verification failure; callers treat that as
    /// an anonymous request.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .ok()
    }
}
