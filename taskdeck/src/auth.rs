//! Account registration, login and bearer-token verification.
//!
//! Passwords are stored as Argon2id PHC strings. Tokens are HS256 JWTs that
//! carry the user id as `sub`; a token only authenticates while its user row
//! still exists.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{info, warn};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::ServiceError;
use crate::model::{
    FieldError, LoginRequest, LoginResponse, PasswordChange, ProfileUpdate, RegisterRequest,
    UserSummary,
};

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// The cheapest parameters argon2 accepts. Only for tests.
    pub const fn minimal() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>, ServiceError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|err| ServiceError::HashError(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl: TimeDelta,
    pub hash_cost: HashCost,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: TimeDelta::hours(24),
            hash_cost: HashCost::default(),
        }
    }

    pub fn with_token_ttl(mut self, ttl: TimeDelta) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// The user a request acts for. Only [`AuthService::authenticate`] produces one
/// from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

pub struct AuthService {
    db: DatabaseConnection,
    settings: AuthSettings,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl AuthService {
    pub fn new(db: DatabaseConnection, settings: AuthSettings) -> Self {
        let encoding = EncodingKey::from_secret(settings.jwt_secret.as_bytes());
        let decoding = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
        Self {
            db,
            settings,
            encoding,
            decoding,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<UserSummary, ServiceError> {
        let name = required(&request.name, "Name")?;
        let email = normalize_email(&request.email)?;
        if request.password.is_empty() {
            return Err(FieldError::Missing("Password").into());
        }

        if self.find_by_email(&email).await?.is_some() {
            warn!("registration rejected, email already on file");
            return Err(ServiceError::DuplicateEmail(email));
        }

        let account = user::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name),
            email: Set(email.clone()),
            password_hash: Set(self.hash_password(&request.password).await?),
            avatar: Set(None),
            created_at: Set(Utc::now()),
        };
        let inserted = account
            .insert(&self.db)
            .await
            .map_err(|err| duplicate_or(err, &email))?;

        info!("registered user {}", inserted.id);
        Ok(inserted.summary())
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let email = normalize_email(&request.email)?;
        if request.password.is_empty() {
            return Err(FieldError::Missing("Password").into());
        }

        let Some(account) = self.find_by_email(&email).await? else {
            warn!("login rejected, unknown email");
            return Err(ServiceError::InvalidCredentials);
        };
        if !verify_password(&account.password_hash, &request.password).await? {
            warn!("login rejected for user {}, wrong password", account.id);
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.issue_token(&account)?;
        info!("user {} logged in", account.id);
        Ok(LoginResponse {
            token,
            user: account.summary(),
        })
    }

    /// Resolve a bearer token to the acting user.
    pub async fn authenticate(&self, token: &str) -> Result<Identity, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default()).map_err(|err| {
            warn!("bearer token rejected: {err}");
            ServiceError::Unauthorized
        })?;

        let account = user::Entity::find_by_id(data.claims.sub)
            .one(&self.db)
            .await?
            .ok_or_else(|| {
                warn!("bearer token names a user that no longer exists");
                ServiceError::Unauthorized
            })?;

        Ok(Identity {
            user_id: account.id,
            email: account.email,
        })
    }

    pub async fn current_user(&self, identity: &Identity) -> Result<UserSummary, ServiceError> {
        Ok(self.account(identity).await?.summary())
    }

    pub async fn update_profile(
        &self,
        identity: &Identity,
        update: ProfileUpdate,
    ) -> Result<UserSummary, ServiceError> {
        let account = self.account(identity).await?;
        let mut active: user::ActiveModel = account.clone().into();
        let mut requested_email = account.email.clone();

        if let Some(name) = update.name {
            active.name = Set(required(&name, "Name")?);
        }
        if let Some(email) = update.email {
            let email = normalize_email(&email)?;
            if email != account.email {
                if self.find_by_email(&email).await?.is_some() {
                    return Err(ServiceError::DuplicateEmail(email));
                }
                requested_email = email.clone();
                active.email = Set(email);
            }
        }
        if let Some(avatar) = update.avatar {
            let avatar = avatar.trim().to_string();
            active.avatar = Set((!avatar.is_empty()).then_some(avatar));
        }

        if !active.is_changed() {
            return Ok(account.summary());
        }

        let updated = active
            .update(&self.db)
            .await
            .map_err(|err| duplicate_or(err, &requested_email))?;
        info!("user {} updated their profile", updated.id);
        Ok(updated.summary())
    }

    pub async fn change_password(
        &self,
        identity: &Identity,
        change: PasswordChange,
    ) -> Result<(), ServiceError> {
        if change.new_password.is_empty() {
            return Err(FieldError::Missing("New password").into());
        }

        let account = self.account(identity).await?;
        // Form error: the session stays valid.
        if !verify_password(&account.password_hash, &change.current_password).await? {
            return Err(ServiceError::ValidationError(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: user::ActiveModel = account.into();
        active.password_hash = Set(self.hash_password(&change.new_password).await?);
        let updated = active.update(&self.db).await?;
        info!("user {} changed their password", updated.id);
        Ok(())
    }

    /// Sign a token for `account` valid for the configured lifetime.
    pub fn issue_token(&self, account: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account.id.clone(),
            email: account.email.clone(),
            iat: now.timestamp(),
            exp: (now + self.settings.token_ttl).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    async fn account(&self, identity: &Identity) -> Result<user::Model, ServiceError> {
        user::Entity::find_by_id(identity.user_id.clone())
            .one(&self.db)
            .await?
            .ok_or(ServiceError::Unauthorized)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, DbErr> {
        user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    async fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let hasher = self.settings.hash_cost.hasher()?;
        let password = password.to_owned();
        blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|err| ServiceError::HashError(err.to_string()))
        })
        .await
    }
}

/// Check `password` against a stored PHC string. The cost parameters are read
/// from the hash itself.
async fn verify_password(hash: &str, password: &str) -> Result<bool, ServiceError> {
    let hash = hash.to_owned();
    let password = password.to_owned();
    blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|err| ServiceError::HashError(err.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
}

/// Argon2 is CPU-bound; keep it off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServiceError::HashError(err.to_string()))?
}

fn required(value: &str, field: &'static str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FieldError::Missing(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn normalize_email(raw: &str) -> Result<String, FieldError> {
    required(raw, "Email").map(|email| email.to_lowercase())
}

/// Two registrations can race past the lookup; the unique index decides.
fn duplicate_or(err: DbErr, email: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::DuplicateEmail(email.to_string()),
        _ => ServiceError::DatabaseError(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert_eq!(normalize_email("   "), Err(FieldError::Missing("Email")));
    }

    #[tokio::test]
    async fn test_password_hash_round_trip() {
        let settings = AuthSettings::new("secret").with_hash_cost(HashCost::minimal());
        let hasher = settings.hash_cost.hasher().unwrap();
        let salt = SaltString::generate(&mut OsRng);
        let hash = hasher
            .hash_password(b"correct horse", &salt)
            .unwrap()
            .to_string();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "correct horse").await.unwrap());
        assert!(!verify_password(&hash, "battery staple").await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_hash_is_an_internal_error() {
        let result = verify_password("not-a-phc-string", "whatever").await;
        assert!(matches!(result, Err(ServiceError::HashError(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_verification_runs_off_the_async_thread() {
        let settings = AuthSettings::new("secret").with_hash_cost(HashCost::minimal());
        let hasher = settings.hash_cost.hasher().unwrap();
        let salt = SaltString::generate(&mut OsRng);
        let hash = hasher.hash_password(b"pw", &salt).unwrap().to_string();

        let caller = std::thread::current().id();
        let worker = blocking(|| Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(caller, worker);

        let (a, b) = tokio::join!(verify_password(&hash, "pw"), verify_password(&hash, "nope"));
        assert!(a.unwrap());
        assert!(!b.unwrap());
    }
}
