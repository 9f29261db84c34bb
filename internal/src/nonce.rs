use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::{distributions::Alphanumeric, Rng};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Action the settings form nonce is bound to. Also the name of the hidden form field
pub const SETTINGS_ACTION: &str = "amu_settings_nonce";

const NONCE_LEN: usize = 20;

pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceAge {
    /// Created in the current half of the lifetime
    Fresh,

    /// Created in the previous half, expires at the next tick
    Aging,
}

/// Issues and checks anti-CSRF tokens bound to an action and a session.
///
/// Nothing is stored: a nonce is a keyed hash of the current time window, so
/// it stays valid for between half and the whole of `lifetime`.
#[derive(Clone)]
pub struct NonceIssuer {
    secret: String,
    half_life_seconds: i64,
}

impl std::fmt::Debug for NonceIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceIssuer")
            .field("half_life_seconds", &self.half_life_seconds)
            .finish_non_exhaustive()
    }
}

impl NonceIssuer {
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Self {
        let half_life_seconds = i64::try_from(lifetime.as_secs() / 2)
            .unwrap_or(i64::MAX)
            .max(1);

        Self {
            secret: secret.into(),
            half_life_seconds,
        }
    }

    fn tick(&self, at: DateTime<Utc>) -> i64 {
        let ts = at.timestamp();
        let tick = ts.div_euclid(self.half_life_seconds);
        if ts.rem_euclid(self.half_life_seconds) > 0 {
            tick + 1
        } else {
            tick
        }
    }

    fn digest(&self, tick: i64, action: &str, session: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        mac.update(tick.to_string().as_bytes());
        mac.update(b"|");
        mac.update(action.as_bytes());
        mac.update(b"|");
        mac.update(session.as_bytes());

        let mut hex = format!("{:x}", mac.finalize().into_bytes());
        hex.truncate(NONCE_LEN);
        hex
    }

    pub fn create(&self, action: &str, session: &str) -> String {
        self.create_at(action, session, Utc::now())
    }

    pub fn create_at(&self, action: &str, session: &str, at: DateTime<Utc>) -> String {
        self.digest(self.tick(at), action, session)
    }

    pub fn verify(&self, action: &str, session: &str, nonce: &str) -> Option<NonceAge> {
        self.verify_at(action, session, nonce, Utc::now())
    }

    pub fn verify_at(
        &self,
        action: &str,
        session: &str,
        nonce: &str,
        at: DateTime<Utc>,
    ) -> Option<NonceAge> {
        if nonce.is_empty() {
            return None;
        }

        let tick = self.tick(at);
        let matches = |tick: i64| {
            bool::from(
                self.digest(tick, action, session)
                    .as_bytes()
                    .ct_eq(nonce.as_bytes()),
            )
        };

        if matches(tick) {
            Some(NonceAge::Fresh)
        } else if matches(tick - 1) {
            Some(NonceAge::Aging)
        } else {
            None
        }
    }
}
