use jsonwebtoken::{decode, DecodingKey, Validation, Algorithm};
use chrono::Utc;
use crate::error::{PortalError, PortalResult};
use crate::models::TokenClaims;

/// Seconds of clock skew tolerated when judging a token expired.
const EXPIRY_LEEWAY_SECS: u64 = 30;

/// Reads the claims of a JWT bearer token without checking its signature.
///
/// The client never holds the signing key; the claims are only used to skip
/// a round-trip for a token that has visibly expired. The backend remains
/// the authority on validity.
pub fn peek_claims(token: &str) -> PortalResult<TokenClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let token_data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| PortalError::Decode(format!("bearer token is not a JWT: {e}")))?;
    Ok(token_data.claims)
}

/// `Some(true)` if the token carries an `exp` in the past, `None` if it has no readable expiry.
pub fn is_expired(token: &str) -> Option<bool> {
    is_expired_at(token, Utc::now().timestamp().max(0) as u64)
}

pub fn is_expired_at(token: &str, now: u64) -> Option<bool> {
    let exp = peek_claims(token).ok()?.exp?;
    Some(exp.saturating_add(EXPIRY_LEEWAY_SECS) <= now)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
