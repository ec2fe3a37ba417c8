use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::clock::Clock;
use crate::db::models::{PublicUser, User};
use crate::db::store::UserStore;
use crate::error::{AppError, AuthError};

const MIN_PASSWORD_LEN: usize = 6;

// Structurally valid bcrypt hash verified against when an email is unknown,
// so a login miss costs the same as a password mismatch.
const PHANTOM_HASH: &str = "$2a$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // User ID
    pub email: String,
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

/// Issued token plus its type designation, as the client receives it.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
}

/// Result of a token check that never touches the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenCheck {
    pub valid: bool,
    pub user_id: String,
    pub email: String,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    jwt_secret: String,
    token_expiry_days: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        jwt_secret: String,
        token_expiry_days: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            store,
            clock,
            jwt_secret,
            token_expiry_days,
            bcrypt_cost,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;

        // Early duplicate check for a clean error; under a race the store's
        // uniqueness constraint is the arbiter.
        if self.store.find_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateEmail.into());
        }

        let password_hash = bcrypt::hash(password, self.bcrypt_cost)?;
        let user = User::new(email, password_hash, name.map(str::to_owned));
        let user = self.store.create(user).await?;

        self.issue_token(&user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);

        let user = match self.store.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                // Unknown email still pays one bcrypt verification.
                let _ = bcrypt::verify(password, PHANTOM_HASH);
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials.into());
        }

        self.issue_token(&user)
    }

    /// Verifies the token and loads the user it references. This is the
    /// guard every protected operation composes with.
    pub async fn current_user(&self, token: &str) -> Result<PublicUser, AppError> {
        let claims = self.decode_token(token)?;

        let user_id =
            Uuid::parse_str(&claims.sub).map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        Ok(user.to_public())
    }

    /// Signature-and-expiry check only; cheaper than `current_user` because
    /// it never fetches the record.
    pub fn verify_token(&self, token: &str) -> Result<TokenCheck, AppError> {
        let claims = self.decode_token(token)?;

        Ok(TokenCheck {
            valid: true,
            user_id: claims.sub,
            email: claims.email,
        })
    }

    fn issue_token(&self, user: &User) -> Result<TokenPair, AppError> {
        let now = self.clock.now();
        let exp = (now + Duration::days(self.token_expiry_days)).timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp,
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            token_type: "bearer".to_string(),
        })
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        // Expiry is checked against the injected clock below, not the
        // library's system-time check.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AuthError::Unauthorized)?
        .claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(AuthError::Unauthorized.into());
        }

        Ok(claims)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "'{}' is not a valid email address",
            email
        )))
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}
