use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use once_cell::sync::Lazy;
use tracing::{debug, info, warn};

/// Process-wide list of revoked session ids
static TOKEN_BLACKLIST: Lazy<TokenBlacklist> = Lazy::new(TokenBlacklist::new);

type Entries = HashMap<String, (SystemTime, SystemTime)>;

/// Revoked sessions, each kept until its tokens would have expired anyway.
///
/// The list is bounded: when full, expired entries are dropped first and then
/// the oldest revocations.
pub struct TokenBlacklist {
    /// Session id to (expiration, revocation time)
    revoked_tokens: Arc<Mutex<Entries>>,
    max_size: usize,
}

impl Default for TokenBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBlacklist {
    pub fn new() -> Self {
        Self::with_max_size(10000)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            revoked_tokens: Arc::new(Mutex::new(HashMap::new())),
            max_size,
        }
    }

    // A panic while holding the lock leaves the map itself consistent
    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.revoked_tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Revoke a session until `expiration`
    pub fn revoke_token(&self, token_id: &str, expiration: SystemTime) {
        let revocation_time = SystemTime::now();
        let mut tokens = self.entries();

        if tokens.len() >= self.max_size {
            warn!("Token blacklist reached max size ({}), performing aggressive cleanup", self.max_size);
            Self::cleanup_expired_internal(&mut tokens);

            if tokens.len() >= self.max_size {
                Self::remove_oldest_entries(&mut tokens, (self.max_size / 2).max(1));
            }
        }

        tokens.insert(token_id.to_string(), (expiration, revocation_time));
        info!("Session revoked: {}", token_id);
    }

    pub fn is_revoked(&self, token_id: &str) -> bool {
        self.entries().contains_key(token_id)
    }

    pub fn size(&self) -> usize {
        self.entries().len()
    }

    /// Drop entries whose tokens have expired; returns how many were removed
    pub fn cleanup_expired_tokens(&self) -> usize {
        let mut tokens = self.entries();
        Self::cleanup_expired_internal(&mut tokens)
    }

    fn cleanup_expired_internal(tokens: &mut Entries) -> usize {
        let now = SystemTime::now();
        let before = tokens.len();
        tokens.retain(|_, (expiration, _)| *expiration > now);

        let removed = before - tokens.len();
        if removed > 0 {
            debug!("Removed {} expired sessions from blacklist", removed);
        }
        removed
    }

    fn remove_oldest_entries(tokens: &mut Entries, count: usize) {
        let mut by_age: Vec<(String, SystemTime)> = tokens
            .iter()
            .map(|(id, (_, revoked_at))| (id.clone(), *revoked_at))
            .collect();
        by_age.sort_by(|a, b| a.1.cmp(&b.1));

        for (id, _) in by_age.into_iter().take(count) {
            tokens.remove(&id);
        }
        debug!("Removed {} oldest entries from token blacklist", count);
    }
}

/// The global blacklist
pub fn blacklist() -> &'static TokenBlacklist {
    &TOKEN_BLACKLIST
}

/// Spawn an hourly cleanup of the global blacklist. Requires a Tokio runtime.
pub fn start_cleanup_task() {
    use std::time::Duration;
    use tokio::time;

    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            let removed = blacklist().cleanup_expired_tokens();
            debug!("Blacklist cleanup removed {} sessions, {} remain", removed, blacklist().size());
        }
    });
}
