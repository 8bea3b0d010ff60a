use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::UserRole;

type HmacSha256 = Hmac<Sha256>;

/// How long a GitHub login round-trip may take
const STATE_TTL_SECS: i64 = 600;

/// Stateless OAuth `state` values signed with `SECRET_KEY`.
///
/// The payload carries a nonce, the role the user asked for and an expiry,
/// so the callback can trust the role without a server-side session.
pub struct OAuthStateSigner {
    secret: Vec<u8>,
}

/// What a verified state tells the callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthState {
    pub preferred_role: Option<UserRole>,
}

impl OAuthStateSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Internal(format!("Invalid OAuth state key: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    pub fn sign(&self, preferred_role: Option<UserRole>) -> Result<String> {
        self.sign_with_expiry(preferred_role, Utc::now().timestamp() + STATE_TTL_SECS)
    }

    fn sign_with_expiry(&self, preferred_role: Option<UserRole>, expires_at: i64) -> Result<String> {
        let role = preferred_role.map(|r| r.to_string()).unwrap_or_default();
        let payload = format!("{}|{}|{}", Uuid::new_v4().simple(), role, expires_at);
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            signature
        ))
    }

    pub fn verify(&self, state: &str) -> Result<OAuthState> {
        let invalid = || AppError::BadRequest("Invalid OAuth state".to_string());

        let (encoded, signature) = state.split_once('.').ok_or_else(invalid)?;
        let payload = URL_SAFE_NO_PAD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(invalid)?;
        let signature = hex::decode(signature).map_err(|_| invalid())?;

        self.mac(&payload)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let mut fields = payload.splitn(3, '|');
        let _nonce = fields.next().ok_or_else(invalid)?;
        let role = fields.next().ok_or_else(invalid)?;
        let expires_at: i64 = fields
            .next()
            .and_then(|v| v.parse().ok())
            .ok_or_else(invalid)?;

        if expires_at < Utc::now().timestamp() {
            return Err(AppError::BadRequest("OAuth state expired".to_string()));
        }

        let preferred_role = if role.is_empty() {
            None
        } else {
            Some(role.parse::<UserRole>().map_err(|_| invalid())?)
        };

        Ok(OAuthState { preferred_role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_role() {
        let signer = OAuthStateSigner::new("server-secret");
        let state = signer.sign(Some(UserRole::Hr)).unwrap();

        let verified = signer.verify(&state).unwrap();
        assert_eq!(verified.preferred_role, Some(UserRole::Hr));

        let state = signer.sign(None).unwrap();
        assert_eq!(signer.verify(&state).unwrap().preferred_role, None);
    }

    #[test]
    fn test_tampered_state_is_rejected() {
        let signer = OAuthStateSigner::new("server-secret");
        let state = signer.sign(Some(UserRole::Candidate)).unwrap();
        let (_, signature) = state.split_once('.').unwrap();

        let forged_payload = URL_SAFE_NO_PAD.encode("nonce|hr|99999999999");
        let forged = format!("{}.{}", forged_payload, signature);
        assert!(signer.verify(&forged).is_err());
    }

    #[test]
    fn test_other_key_is_rejected() {
        let state = OAuthStateSigner::new("a").sign(None).unwrap();
        assert!(OAuthStateSigner::new("b").verify(&state).is_err());
    }

    #[test]
    fn test_expired_state_is_rejected() {
        let signer = OAuthStateSigner::new("server-secret");
        let state = signer
            .sign_with_expiry(None, Utc::now().timestamp() - 1)
            .unwrap();
        assert!(signer.verify(&state).is_err());
    }

    #[test]
    fn test_malformed_state() {
        let signer = OAuthStateSigner::new("server-secret");
        assert!(signer.verify("").is_err());
        assert!(signer.verify("no-dot").is_err());
        assert!(signer.verify("abc.zz").is_err());
    }
}
