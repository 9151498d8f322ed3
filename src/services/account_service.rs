use serde::Serialize;
use thiserror::Error;

use super::{AuditAction, AuditEntry, AuditLog, CollaboratorError, DocumentPath, DocumentStore, IdentityStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    DeleteIdentity,
    DeleteProfile,
    AppendAudit,
}

impl CascadeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStep::DeleteIdentity => "delete_identity",
            CascadeStep::DeleteProfile => "delete_profile",
            CascadeStep::AppendAudit => "append_audit",
        }
    }
}

/// A cascade step failed. Steps in `completed` stay done.
#[derive(Debug, Error)]
#[error("account deletion failed at {} after {} completed step(s): {source}", .failed.as_str(), .completed.len())]
pub struct CascadeError {
    pub failed: CascadeStep,
    pub completed: Vec<CascadeStep>,
    #[source]
    pub source: CollaboratorError,
}

impl CascadeError {
    /// True once the identity record is gone.
    pub fn is_partial(&self) -> bool {
        !self.completed.is_empty()
    }
}

/// Delete `target_uid` everywhere, in order: identity record, profile
/// document, then an audit entry naming `actor_uid`.
///
/// Nothing is rolled back. Once the identity is deleted it stays deleted
/// even if the profile or audit step fails afterwards.
pub async fn delete_user_cascade(
    identities: &dyn IdentityStore,
    documents: &dyn DocumentStore,
    audit: &dyn AuditLog,
    actor_uid: &str,
    target_uid: &str,
) -> Result<(), CascadeError> {
    let mut completed = Vec::with_capacity(3);

    identities
        .delete(target_uid)
        .await
        .map_err(|source| fail(CascadeStep::DeleteIdentity, &completed, source))?;
    completed.push(CascadeStep::DeleteIdentity);
    tracing::info!("Deleted identity {} (requested by {})", target_uid, actor_uid);

    documents
        .delete(&DocumentPath::user(target_uid))
        .await
        .map_err(|source| fail(CascadeStep::DeleteProfile, &completed, source))?;
    completed.push(CascadeStep::DeleteProfile);
    tracing::info!("Deleted profile document users/{}", target_uid);

    let entry = AuditEntry {
        actor_uid: actor_uid.to_string(),
        action: AuditAction::DeleteUser,
        target_uid: target_uid.to_string(),
    };
    let record = audit
        .append(&entry)
        .await
        .map_err(|source| fail(CascadeStep::AppendAudit, &completed, source))?;
    tracing::info!("Recorded audit entry {} at {}", record.id, record.created_at);

    Ok(())
}

fn fail(step: CascadeStep, completed: &[CascadeStep], source: CollaboratorError) -> CascadeError {
    if completed.is_empty() {
        tracing::warn!("Account deletion stopped at {}: {}", step.as_str(), source);
    } else {
        tracing::error!(
            "Account deletion partially applied: {:?} done, {} failed: {}",
            completed,
            step.as_str(),
            source
        );
    }
    CascadeError {
        failed: step,
        completed: completed.to_vec(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::AuditRecord;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Journal {
        events: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl Journal {
        fn failing(step: &'static str) -> Self {
            Self {
                fail_on: Some(step),
                ..Default::default()
            }
        }

        fn record(&self, event: &'static str, detail: String) -> Result<(), CollaboratorError> {
            if self.fail_on == Some(event) {
                return Err(CollaboratorError::Unavailable(event.to_string()));
            }
            self.events.lock().unwrap().push(format!("{event}:{detail}"));
            Ok(())
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdentityStore for Journal {
        async fn delete(&self, uid: &str) -> Result<(), CollaboratorError> {
            self.record("identity", uid.to_string())
        }
    }

    #[async_trait]
    impl DocumentStore for Journal {
        async fn delete(&self, path: &DocumentPath) -> Result<(), CollaboratorError> {
            self.record("document", path.to_string())
        }
    }

    #[async_trait]
    impl AuditLog for Journal {
        async fn append(&self, entry: &AuditEntry) -> Result<AuditRecord, CollaboratorError> {
            self.record("audit", format!("{}>{}>{}", entry.actor_uid, entry.action.as_str(), entry.target_uid))?;
            Ok(AuditRecord {
                id: uuid::Uuid::new_v4(),
                created_at: chrono::Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn runs_steps_in_order() {
        let journal = Journal::default();
        delete_user_cascade(&journal, &journal, &journal, "admin1", "u1")
            .await
            .unwrap();
        assert_eq!(
            journal.events(),
            vec!["identity:u1", "document:users/u1", "audit:admin1>DELETE_USER>u1"]
        );
    }

    #[tokio::test]
    async fn identity_failure_stops_everything() {
        let journal = Journal::failing("identity");
        let err = delete_user_cascade(&journal, &journal, &journal, "admin1", "u1")
            .await
            .unwrap_err();
        assert_eq!(err.failed, CascadeStep::DeleteIdentity);
        assert!(!err.is_partial());
        assert!(journal.events().is_empty());
    }

    #[tokio::test]
    async fn later_failure_keeps_identity_deleted() {
        let journal = Journal::failing("audit");
        let err = delete_user_cascade(&journal, &journal, &journal, "admin1", "u1")
            .await
            .unwrap_err();
        assert_eq!(err.failed, CascadeStep::AppendAudit);
        assert_eq!(err.completed, vec![CascadeStep::DeleteIdentity, CascadeStep::DeleteProfile]);
        assert_eq!(journal.events(), vec!["identity:u1", "document:users/u1"]);
    }
}
