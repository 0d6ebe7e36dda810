use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::i18n::Language;
use crate::pipeline::session::PipelineSession;

pub type SessionHandle = Arc<Mutex<PipelineSession>>;

/// Live pipeline sessions, keyed by id. Cheap to clone.
///
/// A session is bound at `open` to the caller that created it (or to no one,
/// for anonymous callers); `acquire` refuses any other caller.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, owner_id: Option<String>, language: Language) -> SessionHandle {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(PipelineSession::new(id, owner_id, language)));
        self.sessions.insert(id, handle.clone());
        handle
    }

    /// Looks up a session and checks the caller against its bound owner.
    pub async fn acquire(
        &self,
        id: Uuid,
        caller: Option<&CurrentUser>,
    ) -> Result<SessionHandle, AppError> {
        // Clone the handle out so no map shard lock is held across the await.
        let handle = self
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;

        let mut session = handle.lock().await;
        if session.owner_id() != caller.map(|user| user.id.as_str()) {
            return Err(AppError::Forbidden);
        }
        session.touch();
        drop(session);
        Ok(handle)
    }

    pub fn close(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Drops sessions untouched for `max_idle`. Busy or currently locked sessions are kept.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.is_busy() || session.idle_for() < max_idle,
            Err(_) => true,
        });
        let purged = before.saturating_sub(self.sessions.len());
        if purged > 0 {
            info!("Purged {purged} idle pipeline sessions");
        }
        purged
    }

    /// Background task: purge idle sessions once a minute, forever.
    pub fn spawn_idle_purge(&self, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(60));
            loop {
                ticker.tick().await;
                registry.purge_idle(max_idle);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn user(id: &str) -> CurrentUser {
        CurrentUser {
            id: id.to_string(),
            role: Role::IndividualUser,
        }
    }

    #[tokio::test]
    async fn test_owner_binding() {
        let registry = SessionRegistry::new();
        let id = registry.open(Some("u1".into()), Language::En).lock().await.id();

        assert!(registry.acquire(id, Some(&user("u1"))).await.is_ok());
        assert!(matches!(
            registry.acquire(id, Some(&user("u2"))).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            registry.acquire(id, None).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_anonymous_session_rejects_signed_in_caller() {
        let registry = SessionRegistry::new();
        let id = registry.open(None, Language::Ar).lock().await.id();
        assert!(registry.acquire(id, None).await.is_ok());
        assert!(registry.acquire(id, Some(&user("u1"))).await.is_err());
    }

    #[tokio::test]
    async fn test_close_and_unknown_session() {
        let registry = SessionRegistry::new();
        let id = registry.open(None, Language::En).lock().await.id();
        assert!(registry.close(id));
        assert!(!registry.close(id));
        assert!(matches!(
            registry.acquire(id, None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_purge_idle_keeps_busy_sessions() {
        let registry = SessionRegistry::new();
        registry.open(None, Language::En);
        let busy = registry.open(None, Language::En);
        busy.lock()
            .await
            .begin_analysis(crate::pipeline::session::UploadedDocument {
                filename: "cv.pdf".into(),
                mime_type: "application/pdf".into(),
                bytes: bytes::Bytes::from_static(b"%PDF"),
            })
            .unwrap();

        assert_eq!(registry.purge_idle(Duration::ZERO), 1);
        assert_eq!(registry.len(), 1);
        assert!(busy.lock().await.is_busy());
    }

    #[tokio::test]
    async fn test_purge_idle_keeps_recent_sessions() {
        let registry = SessionRegistry::new();
        registry.open(None, Language::En);
        assert_eq!(registry.purge_idle(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 1);
    }
}
