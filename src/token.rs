use anyhow::Context;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How long an issued session token stays valid.
const TOKEN_TTL_HOURS: i64 = 24;

/// The identity carried by a verified session token
#[derive(Debug, PartialEq, Eq)]
pub struct TokenIdentity {
    pub user_id: i32,
    pub email: String,
}

/// Claim set embedded in session tokens
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    email: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Error)]
#[error("the provided token was invalid or expired")]
pub struct InvalidToken;

/// Issues and verifies the HS256 session tokens the API hands out at login. The signing
/// secret comes from the environment, so every replica sharing a secret accepts each
/// other's tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> TokenService {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for the given user which expires [TOKEN_TTL_HOURS] from now.
    pub fn issue(&self, user_id: i32, email: &str) -> Result<String, anyhow::Error> {
        let issued_at = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_owned(),
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_HOURS * 3600,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .context("Signing a session token")?;

        Ok(token)
    }

    /// Checks a token's signature and expiry, returning the identity it was issued for.
    /// Malformed, tampered, and expired tokens are deliberately indistinguishable.
    pub fn verify(&self, token: &str) -> Result<TokenIdentity, InvalidToken> {
        let decoded = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| InvalidToken)?;

        Ok(TokenIdentity {
            user_id: decoded.claims.sub,
            email: decoded.claims.email,
        })
    }
}
