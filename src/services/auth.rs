use axum::http::HeaderMap;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use rusqlite::Connection;
use sha2::Sha256;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::User;

type HmacSha256 = Hmac<Sha256>;

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

// ── Passwords ──

/// Salted PBKDF2-SHA256, stored as `pbkdf2$<iterations>$<salt>$<hash>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut hash = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut hash);

    format!(
        "pbkdf2${PBKDF2_ITERATIONS}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    )
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 || parts[0] != "pbkdf2" {
        return false;
    }
    let Ok(iterations) = parts[1].parse::<u32>() else {
        return false;
    };
    let Ok(salt) = URL_SAFE_NO_PAD.decode(parts[2]) else {
        return false;
    };
    let Ok(expected) = URL_SAFE_NO_PAD.decode(parts[3]) else {
        return false;
    };

    let mut hash = vec![0u8; expected.len()];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), &salt, iterations, &mut hash);
    hash == expected
}

/// Registration rules, mirrored by the web client's signup form.
pub fn validate_password_strength(password: &str) -> Vec<&'static str> {
    let mut errors = vec![];
    if password.len() < 8 {
        errors.push("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must include at least one uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must include at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must include at least one number");
    }
    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        errors.push("Password must include at least one special character");
    }
    errors
}

// ── Tokens ──

/// `base64url(user_id:expires_unix) . base64url(hmac_sha256)`.
pub fn mint_token(user_id: &str, secret: &str, ttl_hours: i64) -> String {
    let expires = Utc::now().timestamp() + ttl_hours * 3600;
    let payload = format!("{user_id}:{expires}");

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    let sig = mac.finalize().into_bytes();

    format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(payload),
        URL_SAFE_NO_PAD.encode(sig)
    )
}

/// Returns the user id for a well-formed, correctly signed, unexpired token.
pub fn verify_token(token: &str, secret: &str) -> Option<String> {
    let (payload_b64, sig_b64) = token.split_once('.')?;
    let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
    let sig = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(&payload);
    mac.verify_slice(&sig).ok()?;

    let payload = String::from_utf8(payload).ok()?;
    let (user_id, expires) = payload.rsplit_once(':')?;
    let expires: i64 = expires.parse().ok()?;
    if Utc::now().timestamp() > expires {
        return None;
    }

    Some(user_id.to_string())
}

/// Resolves the request's bearer token to a stored user.
pub fn authenticate(
    conn: &Connection,
    headers: &HeaderMap,
    secret: &str,
) -> Result<User, AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
    let user_id = verify_token(token, secret).ok_or(AppError::Unauthorized)?;

    queries::get_user_by_id(conn, &user_id)?.ok_or(AppError::Unauthorized)
}
