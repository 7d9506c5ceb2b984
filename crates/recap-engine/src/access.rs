//! Whitelist check composed around request handlers.

use std::collections::HashSet;
use std::future::Future;

use recap_core::{ChatId, RecapError, Result};

/// Who sent a request and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i64,
    pub chat_id: ChatId,
}

impl Caller {
    pub fn new(user_id: i64, chat_id: ChatId) -> Self {
        Self { user_id, chat_id }
    }
}

/// Set of user and chat ids allowed to use the service.
///
/// An empty set allows everyone.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: HashSet<i64>,
}

impl AccessPolicy {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn from_whitelist(ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            allowed: ids.into_iter().collect(),
        }
    }

    pub fn is_allowed(&self, caller: &Caller) -> bool {
        self.allowed.is_empty()
            || self.allowed.contains(&caller.user_id)
            || self.allowed.contains(&caller.chat_id)
    }

    pub fn authorize(&self, caller: &Caller) -> Result<()> {
        if self.is_allowed(caller) {
            return Ok(());
        }
        tracing::warn!(
            "Access denied for user {} in chat {}",
            caller.user_id,
            caller.chat_id
        );
        Err(RecapError::AccessDenied {
            user_id: caller.user_id,
            chat_id: caller.chat_id,
        })
    }

    /// Run `handler` only if `caller` is allowed. A denied handler is never polled.
    pub async fn guard<T, F>(&self, caller: &Caller, handler: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.authorize(caller)?;
        handler.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn empty_whitelist_allows_everyone() {
        assert!(AccessPolicy::allow_all().is_allowed(&Caller::new(7, 7)));
    }

    #[test]
    fn user_or_chat_id_grants_access() {
        let policy = AccessPolicy::from_whitelist([42, -1001]);

        assert!(policy.is_allowed(&Caller::new(42, 5)));
        assert!(policy.is_allowed(&Caller::new(5, -1001)));
        assert_eq!(
            policy.authorize(&Caller::new(5, 6)),
            Err(RecapError::AccessDenied {
                user_id: 5,
                chat_id: 6
            })
        );
    }

    #[tokio::test]
    async fn denied_handler_does_not_run() {
        let policy = AccessPolicy::from_whitelist([1]);
        let ran = AtomicBool::new(false);

        let result = policy
            .guard(&Caller::new(2, 2), async {
                ran.store(true, Ordering::SeqCst);
                Ok::<_, RecapError>(())
            })
            .await;

        assert!(matches!(result, Err(RecapError::AccessDenied { .. })));
        assert!(!ran.load(Ordering::SeqCst));

        let allowed = policy.guard(&Caller::new(1, 2), async { Ok::<_, RecapError>(5) }).await;
        assert_eq!(allowed, Ok(5));
    }
}
