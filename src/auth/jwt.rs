use crate::config::AuthConfig;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    pub token_type: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SigningKeys {
    fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }
}

/// Mints and verifies HS256 tokens; access and refresh use separate secrets.
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(cfg: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            access: SigningKeys::new(&cfg.access_secret, cfg.access_ttl_secs),
            refresh: SigningKeys::new(&cfg.refresh_secret, cfg.refresh_ttl_secs),
            validation,
        }
    }

    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, jsonwebtoken::errors::Error> {
        Ok(TokenPair {
            access_token: self.sign(&self.access, user_id)?,
            refresh_token: self.sign(&self.refresh, user_id)?,
            token_type: "bearer".to_string(),
        })
    }

    pub fn verify_access(&self, token: &str) -> Option<Claims> {
        self.verify(&self.access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Option<Claims> {
        self.verify(&self.refresh, token)
    }

    fn sign(
        &self,
        keys: &SigningKeys,
        user_id: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(keys.ttl_secs),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
    }

    fn verify(&self, keys: &SigningKeys, token: &str) -> Option<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &keys.decoding, &self.validation).ok()?;
        if data.claims.sub.trim().is_empty() {
            return None;
        }
        Some(data.claims)
    }
}
