//! Password-reset link tokens
//!
//! A token is `{issued_at}-{hex(hmac_sha256)}`. The MAC covers the user id,
//! the current password hash and the last login time, so a token stops
//! working as soon as the password changes or the user logs in again.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug)]
pub enum ResetTokenError {
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

/// User state the token is bound to.
#[derive(Debug, Clone, Copy)]
pub struct ResetTokenSubject<'a> {
    pub user_id: &'a Uuid,
    pub password_hash: &'a str,
    pub last_login: Option<i64>,
}

#[derive(Clone)]
pub struct ResetTokenGenerator {
    secret: Vec<u8>,
    timeout_secs: i64,
}

impl ResetTokenGenerator {
    pub fn new(secret: &str, timeout_secs: i64) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            timeout_secs,
        }
    }

    pub fn make_token(&self, subject: ResetTokenSubject<'_>, now: i64) -> Result<String, ResetTokenError> {
        let mac = self.mac(subject, now)?;
        Ok(format!("{}-{}", now, hex::encode(mac.finalize().into_bytes())))
    }

    pub fn check_token(&self, subject: ResetTokenSubject<'_>, token: &str, now: i64) -> bool {
        let Some((issued_at, signature)) = token.split_once('-') else {
            return false;
        };
        let Ok(issued_at) = issued_at.parse::<i64>() else {
            return false;
        };
        if issued_at > now || now - issued_at > self.timeout_secs {
            return false;
        }
        let Ok(signature) = hex::decode(signature) else {
            return false;
        };
        match self.mac(subject, issued_at) {
            Ok(mac) => mac.verify_slice(&signature).is_ok(),
            Err(_) => false,
        }
    }

    fn mac(&self, subject: ResetTokenSubject<'_>, issued_at: i64) -> Result<HmacSha256, ResetTokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| ResetTokenError::InvalidKey(e.to_string()))?;
        mac.update(subject.user_id.as_bytes());
        mac.update(b"|");
        mac.update(subject.password_hash.as_bytes());
        mac.update(b"|");
        mac.update(subject.last_login.unwrap_or_default().to_string().as_bytes());
        mac.update(b"|");
        mac.update(issued_at.to_string().as_bytes());
        Ok(mac)
    }
}

/// URL-safe encoding of a user id for reset links.
pub fn encode_uid(user_id: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(user_id.to_string())
}

pub fn decode_uid(encoded: &str) -> Option<Uuid> {
    let bytes = URL_SAFE_NO_PAD.decode(encoded).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    Uuid::parse_str(&text).ok()
}
