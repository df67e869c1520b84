//! Session token and password primitives
//!
//! Signed session tokens: `payload.hex(sha256(payload + secret))` where the
//! payload is `user_id:role:expires_at_ms`. The signing secret is a random
//! non-zero i64 generated into the `settings` table on first run.
//!
//! Passwords are stored as hex sha256 of salt + password, with a per-user
//! random salt.
//!
//! Pure functions plus settings-table access. No HTTP framework
//! dependencies; cookie handling lives in the server crate.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Authentication error types
#[derive(Debug, Clone)]
pub enum AuthError {
    /// Token is structurally malformed
    Malformed(String),

    /// Signature does not match the payload
    InvalidSignature,

    /// Token expiry is in the past
    Expired,

    /// Database error loading the signing secret
    DatabaseError(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Malformed(reason) => write!(f, "Malformed token: {}", reason),
            AuthError::InvalidSignature => write!(f, "Invalid token signature"),
            AuthError::Expired => write!(f, "Token expired"),
            AuthError::DatabaseError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for AuthError {}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub role: String,
    /// Unix epoch milliseconds
    pub expires_at: i64,
}

/// Load the session signing secret from the settings table
///
/// Generates and stores a random non-zero secret on first access.
pub async fn load_session_secret(db: &SqlitePool) -> Result<i64, AuthError> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = 'session_shared_secret'")
            .fetch_optional(db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    match result {
        Some((value,)) => value
            .parse::<i64>()
            .map_err(|e| AuthError::DatabaseError(format!("Invalid i64: {}", e))),
        None => initialize_session_secret(db).await,
    }
}

/// Generate and persist a fresh random signing secret
pub async fn initialize_session_secret(db: &SqlitePool) -> Result<i64, AuthError> {
    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let val = rng.gen::<i64>();
        if val != 0 {
            break val;
        }
    };

    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES ('session_shared_secret', ?)")
        .bind(secret.to_string())
        .execute(db)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    Ok(secret)
}

/// Issue a signed session token for the given claims
pub fn issue_token(claims: &SessionClaims, secret: i64) -> String {
    let payload = format!("{}:{}:{}", claims.user_id, claims.role, claims.expires_at);
    let signature = sign(&payload, secret);
    format!("{}.{}", payload, signature)
}

/// Verify a session token's signature and expiry, returning its claims
pub fn verify_token(token: &str, secret: i64, now_ms: i64) -> Result<SessionClaims, AuthError> {
    let (payload, signature) = token
        .rsplit_once('.')
        .ok_or_else(|| AuthError::Malformed("missing signature".to_string()))?;

    let expected = sign(payload, secret);
    if signature != expected {
        return Err(AuthError::InvalidSignature);
    }

    let mut parts = payload.splitn(3, ':');
    let user_id = parts
        .next()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| AuthError::Malformed("bad user id".to_string()))?;
    let role = parts
        .next()
        .ok_or_else(|| AuthError::Malformed("missing role".to_string()))?
        .to_string();
    let expires_at = parts
        .next()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| AuthError::Malformed("bad expiry".to_string()))?;

    if expires_at < now_ms {
        return Err(AuthError::Expired);
    }

    Ok(SessionClaims {
        user_id,
        role,
        expires_at,
    })
}

fn sign(payload: &str, secret: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hasher.update(secret.to_le_bytes());
    hex_encode(&hasher.finalize())
}

/// Generate a random per-user password salt
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex_encode(&bytes)
}

/// Hash a password with its salt
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex_encode(&hasher.finalize())
}

/// Constant-shape password check against the stored hash
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    hash_password(password, salt) == stored_hash
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
