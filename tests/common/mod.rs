#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use lawblog_api::auth::{TokenError, TokenVerifier};
use lawblog_api::config::ApiConfig;
use lawblog_api::generation::prompt::required_fragments;
use lawblog_api::generation::{AttemptPolicy, ConversationMessage, GenerativeApi, GenerativeError, SystemPrompt};
use lawblog_api::services::{
    AuditEntry, AuditLog, AuditRecord, CollaboratorError, DocumentPath, DocumentStore, IdentityStore, RoleStore,
    TemplateError, TemplateStore,
};
use lawblog_api::AppState;

/// Ordered log of every side effect the stubs performed.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Accepts `token-<uid>` and nothing else.
pub struct StubTokens;

#[async_trait]
impl TokenVerifier for StubTokens {
    async fn verify(&self, token: &str) -> Result<String, TokenError> {
        token
            .strip_prefix("token-")
            .map(str::to_string)
            .ok_or_else(|| TokenError::Invalid("unknown token".to_string()))
    }
}

pub struct StubRoles(pub HashMap<String, String>);

#[async_trait]
impl RoleStore for StubRoles {
    async fn get_role(&self, uid: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(self.0.get(uid).cloned())
    }
}

pub struct StubIdentities {
    pub journal: Journal,
    pub known: Vec<String>,
}

#[async_trait]
impl IdentityStore for StubIdentities {
    async fn delete(&self, uid: &str) -> Result<(), CollaboratorError> {
        if !self.known.iter().any(|k| k == uid) {
            return Err(CollaboratorError::NotFound(format!("identity {uid}")));
        }
        self.journal.push(format!("identity-delete:{uid}"));
        Ok(())
    }
}

pub struct StubDocuments {
    pub journal: Journal,
    pub fail: bool,
}

#[async_trait]
impl DocumentStore for StubDocuments {
    async fn delete(&self, path: &DocumentPath) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable("document store down".to_string()));
        }
        self.journal.push(format!("document-delete:{path}"));
        Ok(())
    }
}

pub struct StubAudit {
    pub journal: Journal,
}

#[async_trait]
impl AuditLog for StubAudit {
    async fn append(&self, entry: &AuditEntry) -> Result<AuditRecord, CollaboratorError> {
        self.journal.push(format!(
            "audit-append:{}:{}:{}",
            entry.actor_uid,
            entry.action.as_str(),
            entry.target_uid
        ));
        Ok(AuditRecord {
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
        })
    }
}

/// Every required fragment, or all but the listed ones.
pub struct StubTemplates {
    pub missing: Vec<&'static str>,
}

#[async_trait]
impl TemplateStore for StubTemplates {
    async fn read(&self, fragment_id: &str) -> Result<String, TemplateError> {
        if self.missing.contains(&fragment_id) {
            return Err(TemplateError::Missing {
                id: fragment_id.to_string(),
                path: format!("stub/{fragment_id}.txt"),
            });
        }
        Ok(format!("[{fragment_id}]"))
    }
}

/// Replays canned answers and remembers every system prompt it saw.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    answers: Arc<Mutex<VecDeque<Result<String, String>>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new(answers: Vec<Result<String, String>>) -> Self {
        Self {
            answers: Arc::new(Mutex::new(answers.into())),
            prompts: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerativeApi for ScriptedGenerator {
    async fn complete(
        &self,
        system_prompt: &SystemPrompt,
        _messages: &[ConversationMessage],
    ) -> Result<String, GenerativeError> {
        self.prompts.lock().unwrap().push(system_prompt.as_str().to_string());
        let next = self.answers.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(reason)) => Err(GenerativeError::Transport(reason)),
            None => Err(GenerativeError::Transport("script exhausted".to_string())),
        }
    }
}

pub fn valid_article_json() -> String {
    serde_json::json!({
        "title": "보이스피싱 피해금 환급 절차",
        "intro": "보이스피싱 피해를 입었다면 가장 먼저 지급정지를 신청해야 합니다.",
        "body": "## 지급정지\n...\n## 피해구제 신청\n...\n## 형사 고소\n...",
        "conclusion": "- 즉시 신고\n- 증거 보존",
        "summary_table": "| 단계 | 조치 |\n|---|---|\n| 1 | 지급정지 |"
    })
    .to_string()
}

/// Knobs for a test instance.
pub struct Fixture {
    pub journal: Journal,
    pub generator: ScriptedGenerator,
    pub missing_templates: Vec<&'static str>,
    pub failing_documents: bool,
}

impl Fixture {
    pub fn new(answers: Vec<Result<String, String>>) -> Self {
        Self {
            journal: Journal::default(),
            generator: ScriptedGenerator::new(answers),
            missing_templates: Vec::new(),
            failing_documents: false,
        }
    }

    pub fn state(&self) -> AppState {
        let roles = HashMap::from([
            ("admin-1".to_string(), "admin".to_string()),
            ("member-1".to_string(), "user".to_string()),
        ]);

        AppState {
            tokens: Arc::new(StubTokens),
            roles: Arc::new(StubRoles(roles)),
            identities: Arc::new(StubIdentities {
                journal: self.journal.clone(),
                known: vec!["u1".to_string(), "u2".to_string()],
            }),
            documents: Arc::new(StubDocuments {
                journal: self.journal.clone(),
                fail: self.failing_documents,
            }),
            audit: Arc::new(StubAudit {
                journal: self.journal.clone(),
            }),
            templates: Arc::new(StubTemplates {
                missing: self.missing_templates.clone(),
            }),
            generator: Arc::new(self.generator.clone()),
            attempt_policy: AttemptPolicy {
                max_attempts: 2,
                call_timeout: Duration::from_secs(5),
            },
        }
    }

    pub async fn spawn(&self) -> Result<TestServer> {
        TestServer::spawn(self.state()).await
    }
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    async fn spawn(state: AppState) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        let api = ApiConfig {
            enable_request_logging: true,
            max_request_size_bytes: 1024 * 1024,
        };
        let app = lawblog_api::app(state, &api);
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub fn all_fragment_ids() -> Vec<&'static str> {
    required_fragments().collect()
}
