use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use signet_core::UserId;

/// JWT claims embedded in presign tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject (user id).
    sub: String,
    /// Expiry (seconds since epoch).
    exp: usize,
}

/// Issues and verifies short-lived presign tokens.
///
/// Presigned URLs let a page embed document links that work without the
/// browser holding a session, e.g. inside iframes or emailed previews.
pub struct PresignManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_seconds: u64,
}

impl PresignManager {
    #[must_use]
    pub fn new(secret: &str, expiry_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_seconds,
        }
    }

    /// Issue a presign token for the given user.
    pub fn issue(&self, user: &UserId) -> Result<String, jsonwebtoken::errors::Error> {
        #[allow(clippy::cast_possible_truncation)]
        let exp = jsonwebtoken::get_current_timestamp() as usize + self.expiry_seconds as usize;
        let claims = Claims {
            sub: user.as_str().to_owned(),
            exp,
        };
        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Verify a presign token.
    ///
    /// Every failure mode (bad signature, expired, malformed) collapses to
    /// `None`: a broken presign token must be indistinguishable from no
    /// token at all.
    pub fn verify(&self, token: &str) -> Option<UserId> {
        match decode::<Claims>(token, &self.decoding_key, &Validation::default()) {
            Ok(data) => Some(UserId::new(data.claims.sub)),
            Err(err) => {
                debug!(error = %err, "presign token rejected");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let manager = PresignManager::new("test-secret", 60);
        let token = manager.issue(&UserId::new("user-1")).unwrap();
        assert_eq!(manager.verify(&token).unwrap().as_str(), "user-1");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issuer = PresignManager::new("secret-a", 60);
        let verifier = PresignManager::new("secret-b", 60);
        let token = issuer.issue(&UserId::new("user-1")).unwrap();
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let manager = PresignManager::new("test-secret", 60);
        assert!(manager.verify("not-a-jwt").is_none());
    }
}
