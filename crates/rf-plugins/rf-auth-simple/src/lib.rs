//! # rf-auth-simple
//!
//! HMAC-SHA256 implementation of `SessionResolver`.
//! A session token is `<user uuid>.<base64url signature of the uuid>`, so the
//! server can resolve identities without a session table.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rf_core::traits::SessionResolver;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub struct SignedTokenResolver {
    /// Keyed MAC state, cloned for every signature.
    mac: HmacSha256,
}

impl SignedTokenResolver {
    /// Accepts the signing secret (e.g., from `auth.session_secret`).
    pub fn new(secret: &SecretString) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid session secret: {e}"))?;
        Ok(Self { mac })
    }

    /// Issues a bearer token for `user_id`.
    pub fn issue(&self, user_id: Uuid) -> String {
        let mut mac = self.mac.clone();
        mac.update(user_id.to_string().as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{user_id}.{signature}")
    }

    fn verify(&self, token: &str) -> Option<Uuid> {
        let (user_part, signature_part) = token.trim().split_once('.')?;
        let user_id = Uuid::parse_str(user_part).ok()?;
        if user_id.is_nil() {
            return None;
        }
        let signature = URL_SAFE_NO_PAD.decode(signature_part).ok()?;

        let mut mac = self.mac.clone();
        mac.update(user_id.to_string().as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature).ok()?;
        Some(user_id)
    }
}

#[async_trait]
impl SessionResolver for SignedTokenResolver {
    async fn resolve(&self, token: &str) -> Option<Uuid> {
        self.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(secret: &str) -> SignedTokenResolver {
        SignedTokenResolver::new(&SecretString::from(secret.to_string())).unwrap()
    }

    #[tokio::test]
    async fn issued_tokens_resolve_to_their_user() {
        let auth = resolver("a-very-long-session-secret-for-tests");
        let user = Uuid::now_v7();
        let token = auth.issue(user);
        assert_eq!(auth.resolve(&token).await, Some(user));
    }

    #[tokio::test]
    async fn tokens_from_another_secret_are_rejected() {
        let user = Uuid::now_v7();
        let token = resolver("secret-one-secret-one-secret-one!").issue(user);
        assert_eq!(resolver("secret-two-secret-two-secret-two!").resolve(&token).await, None);
    }

    #[tokio::test]
    async fn tampered_user_is_rejected() {
        let auth = resolver("a-very-long-session-secret-for-tests");
        let token = auth.issue(Uuid::now_v7());
        let (_, signature) = token.split_once('.').unwrap();
        let forged = format!("{}.{}", Uuid::now_v7(), signature);
        assert_eq!(auth.resolve(&forged).await, None);
    }

    #[tokio::test]
    async fn malformed_tokens_are_rejected() {
        let auth = resolver("a-very-long-session-secret-for-tests");
        for token in ["", "no-dot", "not-a-uuid.abc", &format!("{}.!!!", Uuid::now_v7())] {
            assert_eq!(auth.resolve(token).await, None, "accepted {token:?}");
        }
        let nil = auth.issue(Uuid::nil());
        assert_eq!(auth.resolve(&nil).await, None);
    }
}
