use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// In-memory store of login tokens, each mapped to its issue time.
/// A token is valid while less than `ttl` has elapsed since it was issued.
pub struct SessionStore {
    ttl: Duration,
    pub(crate) tokens: HashMap<String, Instant>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            tokens: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint and record a new token
    pub fn issue(&mut self) -> String {
        self.issue_at(Instant::now())
    }

    pub(crate) fn issue_at(&mut self, now: Instant) -> String {
        let token = generate_token();
        self.tokens.insert(token.clone(), now);
        token
    }

    /// Check a token, dropping it if it has expired
    pub fn validate(&mut self, token: &str) -> bool {
        self.validate_at(token, Instant::now())
    }

    pub(crate) fn validate_at(&mut self, token: &str, now: Instant) -> bool {
        let Some(&created) = self.tokens.get(token) else {
            return false;
        };

        if now.saturating_duration_since(created) < self.ttl {
            true
        } else {
            tracing::debug!("Session token expired");
            self.tokens.remove(token);
            false
        }
    }

    /// Remove every expired token. Returns how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub(crate) fn purge_expired_at(&mut self, now: Instant) -> usize {
        let before = self.tokens.len();
        let ttl = self.ttl;
        self.tokens
            .retain(|_, created| now.saturating_duration_since(*created) < ttl);
        before - self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Periodically purge expired tokens. The first sweep happens one
/// `every` after spawning.
pub fn spawn_sweeper(store: Arc<Mutex<SessionStore>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // interval fires immediately on the first tick
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = store.lock().await.purge_expired();
            if purged > 0 {
                tracing::info!("Purged {} expired session tokens", purged);
            }
        }
    })
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
