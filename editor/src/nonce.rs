use std::time::{SystemTime, UNIX_EPOCH};

use sha1_smol::Sha1;

use crate::config::EditorConfig;
use crate::error::EditorError;

/// Issues and checks the anti-forgery token sent with a save. Tokens are
/// bound to the viewer's session.
pub trait TokenVerifier {
    fn issue(&self, session: &str) -> String;
    fn verify(&self, token: &str, session: &str) -> bool;
}

/// Time-bucketed tokens: `sha1(secret | action | session | tick)`, where a
/// tick is half the configured lifetime. A token verifies during the tick it
/// was issued in and the one after.
#[derive(Debug, Clone)]
pub struct NonceSigner {
    secret: String,
    action: String,
    half_life: u64,
}

impl NonceSigner {
    /// Fails on an empty secret: tokens signed with it could be computed by
    /// anyone.
    pub fn new(
        secret: impl Into<String>,
        action: impl Into<String>,
        lifetime_secs: u64,
    ) -> Result<Self, EditorError> {
        let secret = secret.into();
        if secret.trim().is_empty() {
            return Err(EditorError::MissingSecret);
        }
        Ok(NonceSigner {
            secret,
            action: action.into(),
            half_life: (lifetime_secs / 2).max(1),
        })
    }

    pub fn from_config(config: &EditorConfig) -> Result<Self, EditorError> {
        Self::new(&config.secret, &config.nonce_action, config.nonce_lifetime_secs)
    }

    pub fn issue_at(&self, session: &str, unix_secs: u64) -> String {
        self.sign(session, self.tick(unix_secs))
    }

    pub fn verify_at(&self, token: &str, session: &str, unix_secs: u64) -> bool {
        let tick = self.tick(unix_secs);
        token == self.sign(session, tick) || (tick > 0 && token == self.sign(session, tick - 1))
    }

    fn tick(&self, unix_secs: u64) -> u64 {
        unix_secs.div_ceil(self.half_life)
    }

    fn sign(&self, session: &str, tick: u64) -> String {
        let mut hasher = Sha1::new();
        for part in [self.secret.as_bytes(), self.action.as_bytes(), session.as_bytes()] {
            hasher.update(part);
            hasher.update(b"|");
        }
        hasher.update(tick.to_string().as_bytes());
        hasher.digest().to_string()
    }
}

impl TokenVerifier for NonceSigner {
    fn issue(&self, session: &str) -> String {
        self.issue_at(session, now())
    }

    fn verify(&self, token: &str, session: &str) -> bool {
        self.verify_at(token, session, now())
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    fn signer(secret: &str, action: &str) -> NonceSigner {
        NonceSigner::new(secret, action, 100).unwrap()
    }

    #[test]
    fn token_is_hex_sha1() {
        let token = signer("k", "a").issue_at("s", T);
        assert_eq!(token.len(), 40);
        assert!(token.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn token_verifies_until_the_next_tick_ends() {
        let signer = signer("k", "a");
        let token = signer.issue_at("s", T);
        assert!(signer.verify_at(&token, "s", T));
        assert!(signer.verify_at(&token, "s", T + 50));
        assert!(!signer.verify_at(&token, "s", T + 150));
    }

    #[test]
    fn token_is_bound_to_secret_action_and_session() {
        let token = signer("k", "a").issue_at("s", T);
        assert!(!signer("other", "a").verify_at(&token, "s", T));
        assert!(!signer("k", "b").verify_at(&token, "s", T));
        assert!(!signer("k", "a").verify_at(&token, "other-session", T));
        assert!(!signer("k", "a").verify_at("", "s", T));
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            NonceSigner::new("", "a", 100),
            Err(EditorError::MissingSecret)
        ));
        assert!(matches!(
            NonceSigner::from_config(&EditorConfig::default()),
            Err(EditorError::MissingSecret)
        ));
    }
}
