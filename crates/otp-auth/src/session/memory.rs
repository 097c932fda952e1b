//! In-memory session store.

use super::{OtpSession, SessionStore};
use crate::error::OtpError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// In-memory OTP session store.
///
/// Expiry is enforced when a session is looked up. The optional reaper
/// only reclaims memory held by sessions nobody came back for.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    /// Sessions indexed by session id
    sessions: Arc<RwLock<HashMap<String, OtpSession>>>,
}

impl MemorySessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Spawn a background task that periodically drops expired sessions.
    ///
    /// The caller owns the handle and should abort it on shutdown.
    pub fn spawn_reaper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        info!("Starting session reaper, interval: {:?}", interval);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let removed = store.purge_expired(Utc::now()).await;
                if removed > 0 {
                    debug!("Reaped {} expired sessions", removed);
                }
            }
        })
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: OtpSession) -> Result<(), OtpError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn consume(
        &self,
        session_id: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpSession, OtpError> {
        // The write lock spans lookup, checks and removal.
        let mut sessions = self.sessions.write().await;

        let session = sessions.get(session_id).ok_or(OtpError::InvalidSession)?;
        if session.is_expired(now) {
            return Err(OtpError::Expired);
        }
        if session.code != code {
            return Err(OtpError::InvalidCode);
        }

        sessions.remove(session_id).ok_or(OtpError::InvalidSession)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn session(phone: &str) -> OtpSession {
        OtpSession::new(phone.into(), ChronoDuration::seconds(120))
    }

    #[tokio::test]
    async fn test_consume_success_removes_session() {
        let store = MemorySessionStore::new();
        let s = session("+14155551234");
        store.insert(s.clone()).await.unwrap();

        let consumed = store.consume(&s.session_id, &s.code, Utc::now()).await.unwrap();
        assert_eq!(consumed, s);
        assert!(store.is_empty().await);

        let again = store.consume(&s.session_id, &s.code, Utc::now()).await;
        assert!(matches!(again, Err(OtpError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_consume_unknown_session() {
        let store = MemorySessionStore::new();
        let result = store.consume("nope", "123456", Utc::now()).await;
        assert!(matches!(result, Err(OtpError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_session() {
        let store = MemorySessionStore::new();
        let s = session("+14155551234");
        store.insert(s.clone()).await.unwrap();

        let wrong = if s.code == "100000" { "100001" } else { "100000" };
        let result = store.consume(&s.session_id, wrong, Utc::now()).await;
        assert!(matches!(result, Err(OtpError::InvalidCode)));
        assert_eq!(store.len().await, 1);

        assert!(store.consume(&s.session_id, &s.code, Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_session_rejected_but_kept() {
        let store = MemorySessionStore::new();
        let s = session("+14155551234");
        store.insert(s.clone()).await.unwrap();

        let later = s.expires_at + ChronoDuration::seconds(1);
        let result = store.consume(&s.session_id, &s.code, later).await;
        assert!(matches!(result, Err(OtpError::Expired)));
        assert_eq!(store.len().await, 1);

        // Still not verifiable on a second attempt.
        let result = store.consume(&s.session_id, &s.code, later).await;
        assert!(matches!(result, Err(OtpError::Expired)));
    }

    #[tokio::test]
    async fn test_expired_check_precedes_code_check() {
        let store = MemorySessionStore::new();
        let s = session("+14155551234");
        store.insert(s.clone()).await.unwrap();

        let later = s.expires_at + ChronoDuration::seconds(1);
        let result = store.consume(&s.session_id, "000000", later).await;
        assert!(matches!(result, Err(OtpError::Expired)));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = MemorySessionStore::new();
        let old = OtpSession::new("+14155551234".into(), ChronoDuration::seconds(-1));
        let fresh = session("+14155559876");
        store.insert(old).await.unwrap();
        store.insert(fresh.clone()).await.unwrap();

        let removed = store.purge_expired(Utc::now()).await;
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store
            .consume(&fresh.session_id, &fresh.code, Utc::now())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reaper_removes_expired_sessions() {
        let store = MemorySessionStore::new();
        let old = OtpSession::new("+14155551234".into(), ChronoDuration::seconds(-1));
        store.insert(old).await.unwrap();

        let handle = store.spawn_reaper(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(store.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_consume_single_winner() {
        let store = MemorySessionStore::new();
        let s = session("+14155551234");
        store.insert(s.clone()).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                let id = s.session_id.clone();
                let code = s.code.clone();
                tokio::spawn(async move { store.consume(&id, &code, Utc::now()).await })
            })
            .collect();

        let mut successes = 0;
        let mut invalid = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(OtpError::InvalidSession) => invalid += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(invalid, 31);
    }
}
