use pos_core::auth::{self, TokenSigner};
use pos_core::config::Config;
use pos_core::db::Db;
use pos_core::kitchen::{KitchenBoard, KitchenEvent};
use pos_core::paths;
use pos_core::workflow::WorkflowRegistry;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

/// Push envelope sent to terminals: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: serde_json::Value,
}

impl PushMessage {
    pub fn new(kind: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }
}

impl From<&KitchenEvent> for PushMessage {
    fn from(event: &KitchenEvent) -> Self {
        let data = match serde_json::to_value(event) {
            Ok(serde_json::Value::Object(mut map)) => map.remove("data").unwrap_or_default(),
            _ => serde_json::Value::Null,
        };
        Self::new(event.name(), data)
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub db: Arc<Db>,
    pub kitchen: Arc<Mutex<KitchenBoard>>,
    pub signer: TokenSigner,
    pub registry: Arc<WorkflowRegistry>,
    pub event_tx: broadcast::Sender<PushMessage>,
    pub terminals: Arc<AtomicUsize>,
    /// bcrypt cost for users created through the API.
    pub hash_cost: u32,
}

impl AppState {
    /// Load config, database and kitchen board from an initialized root.
    pub fn load(root: PathBuf) -> pos_core::Result<Self> {
        let config = Config::load(&root)?;
        let db = Db::open(&paths::db_path(&root))?;
        let board = KitchenBoard::load(&paths::kitchen_path(&root))?;
        Ok(Self::from_parts(root, config, db, board))
    }

    pub fn from_parts(root: PathBuf, config: Config, db: Db, board: KitchenBoard) -> Self {
        let (tx, _) = broadcast::channel(256);
        let signer = TokenSigner::new(&config.jwt_secret(), config.auth.token_ttl_hours);
        Self {
            root,
            config: Arc::new(config),
            db: Arc::new(db),
            kitchen: Arc::new(Mutex::new(board)),
            signer,
            registry: Arc::new(WorkflowRegistry::builtin()),
            event_tx: tx,
            terminals: Arc::new(AtomicUsize::new(0)),
            hash_cost: auth::DEFAULT_HASH_COST,
        }
    }

    /// Broadcast to every subscriber. Having none is not an error.
    pub fn publish(&self, msg: PushMessage) {
        tracing::debug!(kind = %msg.kind, "push");
        let _ = self.event_tx.send(msg);
    }

    pub fn publish_kitchen(&self, events: &[KitchenEvent]) {
        for event in events {
            self.publish(PushMessage::from(event));
        }
    }

    pub fn connected_terminals(&self) -> usize {
        self.terminals.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
impl AppState {
    /// Create an active user with `role` and return a bearer token for it.
    pub(crate) fn seed_user_token(
        &self,
        username: &str,
        business_type: pos_core::types::BusinessType,
        role: pos_core::types::Role,
    ) -> String {
        let conn = self.db.conn().unwrap();
        let user = pos_core::users::create_user(
            &conn,
            &pos_core::users::NewUser {
                username: username.to_string(),
                password: "pass1234".to_string(),
                display_name: None,
                role,
                business_type,
            },
            auth::MIN_HASH_COST,
        )
        .unwrap();
        self.signer
            .issue(&user.id, &user.username, business_type, role)
            .unwrap()
            .0
    }
}
