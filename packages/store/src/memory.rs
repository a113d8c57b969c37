use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, TimeZone, Utc};
use futures::channel::mpsc::UnboundedSender;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{AuthService, ChangeKind, ObjectStore, RecordChange, RecordStore};
use crate::error::{Error, Result};
use crate::filter::{Filter, Order};
use crate::models::{AuthEvent, AuthEventKind, Session, User};
use crate::subscription::{Listeners, Subscription};

/// A collaborator call, recorded by [`MemoryBackend`] and usable as a failure target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Call {
    GetSession,
    SignUp,
    SignIn,
    SignOut,
    Select,
    Insert,
    Update,
    Delete,
    Subscribe,
    Upload,
}

struct Account {
    id: String,
    password: String,
    confirmed: bool,
}

struct RowListener {
    table: String,
    filter: Filter,
    tx: UnboundedSender<RecordChange>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    next_id: i64,
    ticks: i64,
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    objects: HashMap<(String, String), Vec<u8>>,
    failures: HashMap<Call, String>,
    calls: Vec<Call>,
    auth_listeners: Listeners<AuthEvent>,
    row_listeners: Vec<RowListener>,
    require_confirmation: bool,
}

/// In-memory hosted backend for tests and offline demos.
///
/// Implements [`AuthService`], [`RecordStore`], and [`ObjectStore`] with the same
/// observable behavior as the hosted service: ids and `created_at` are assigned on
/// insert, every mutation fans out a [`RecordChange`] to matching subscribers, and
/// sign-in/sign-out notify auth listeners. Calls are recorded and any call can be
/// made to fail once with [`MemoryBackend::fail_next`].
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

const BASE_URL: &str = "memory://storage";

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require email confirmation before sign-in (the hosted default).
    pub fn with_email_confirmation(self) -> Self {
        self.lock().require_confirmation = true;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next `call` fail with `message`.
    pub fn fail_next(&self, call: Call, message: &str) {
        self.lock().failures.insert(call, message.to_string());
    }

    /// Every collaborator call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Mark an account as confirmed, as clicking the verification link would.
    pub fn confirm_account(&self, email: &str) {
        if let Some(account) = self.lock().accounts.get_mut(email) {
            account.confirmed = true;
        }
    }

    /// Create a confirmed account directly.
    pub fn add_account(&self, email: &str, password: &str) {
        let mut state = self.lock();
        let id = format!("user-{}", state.accounts.len() + 1);
        state.accounts.insert(
            email.to_string(),
            Account {
                id,
                password: password.to_string(),
                confirmed: true,
            },
        );
    }

    /// Insert a row without recording a call or notifying subscribers.
    pub fn seed<R: Serialize>(&self, table: &str, record: &R) -> Value {
        let mut state = self.lock();
        let row = state.prepare_row(record).unwrap_or(Value::Null);
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// All rows of `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Stored bytes of an uploaded object.
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Deliver a change to subscribers of `table` as the realtime service would.
    pub fn emit_change(&self, table: &str, change: RecordChange) {
        self.lock().notify_rows(table, change);
    }

    /// Number of live row subscriptions.
    pub fn row_subscribers(&self) -> usize {
        let mut state = self.lock();
        state.row_listeners.retain(|l| !l.tx.is_closed());
        state.row_listeners.len()
    }

    /// Number of live auth-state listeners.
    pub fn auth_subscribers(&self) -> usize {
        self.lock().auth_listeners.len()
    }
}

impl State {
    fn record(&mut self, call: Call) -> Result<()> {
        self.calls.push(call);
        match self.failures.remove(&call) {
            Some(message) => Err(error_for(call, message)),
            None => Ok(()),
        }
    }

    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
            + Duration::seconds(self.ticks)
    }

    fn prepare_row<R: Serialize>(&mut self, record: &R) -> Result<Value> {
        let mut row =
            serde_json::to_value(record).map_err(|e| Error::Mutation(e.to_string()))?;
        let Some(fields) = row.as_object_mut() else {
            return Err(Error::Mutation("record must be a JSON object".to_string()));
        };
        if !fields.contains_key("id") {
            self.next_id += 1;
            fields.insert("id".to_string(), Value::from(self.next_id));
        }
        if !fields.contains_key("created_at") {
            let created_at = self.now().to_rfc3339();
            fields.insert("created_at".to_string(), Value::from(created_at));
        }
        Ok(row)
    }

    fn notify_rows(&mut self, table: &str, change: RecordChange) {
        self.row_listeners.retain(|listener| {
            if listener.table != table {
                return !listener.tx.is_closed();
            }
            let row = match change.kind {
                ChangeKind::Delete => change.old.as_ref(),
                _ => change.new.as_ref(),
            };
            let wanted = row.map(|r| listener.filter.matches(r)).unwrap_or(false);
            if wanted {
                listener.tx.unbounded_send(change.clone()).is_ok()
            } else {
                !listener.tx.is_closed()
            }
        });
    }

    fn session_for(&self, email: &str) -> Option<Session> {
        let account = self.accounts.get(email)?;
        Some(Session {
            access_token: format!("access-{}", account.id),
            refresh_token: format!("refresh-{}", account.id),
            expires_at: None,
            user: User {
                id: account.id.clone(),
                email: Some(email.to_string()),
            },
        })
    }
}

fn error_for(call: Call, message: String) -> Error {
    match call {
        Call::GetSession | Call::SignUp | Call::SignIn | Call::SignOut => Error::Auth(message),
        Call::Select | Call::Subscribe => Error::Fetch(message),
        Call::Insert | Call::Update | Call::Delete => Error::Mutation(message),
        Call::Upload => Error::Upload(message),
    }
}

impl AuthService for MemoryBackend {
    async fn get_session(&self) -> Result<Option<Session>> {
        let mut state = self.lock();
        state.record(Call::GetSession)?;
        Ok(state.session.clone())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        let mut state = self.lock();
        state.record(Call::SignUp)?;
        if state.accounts.contains_key(email) {
            return Err(Error::Auth("User already registered".to_string()));
        }
        let id = format!("user-{}", state.accounts.len() + 1);
        let confirmed = !state.require_confirmation;
        state.accounts.insert(
            email.to_string(),
            Account {
                id,
                password: password.to_string(),
                confirmed,
            },
        );
        if !confirmed {
            return Ok(None);
        }
        let session = state.session_for(email);
        state.session = session.clone();
        state
            .auth_listeners
            .emit(&AuthEvent::new(AuthEventKind::SignedIn, session.clone()));
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut state = self.lock();
        state.record(Call::SignIn)?;
        let account = state
            .accounts
            .get(email)
            .filter(|a| a.password == password)
            .ok_or_else(|| Error::Auth("Invalid login credentials".to_string()))?;
        if !account.confirmed {
            return Err(Error::Auth("Email not confirmed".to_string()));
        }
        let session = state
            .session_for(email)
            .ok_or_else(|| Error::Auth("Invalid login credentials".to_string()))?;
        state.session = Some(session.clone());
        state
            .auth_listeners
            .emit(&AuthEvent::new(AuthEventKind::SignedIn, Some(session.clone())));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        let mut state = self.lock();
        state.record(Call::SignOut)?;
        state.session = None;
        state
            .auth_listeners
            .emit(&AuthEvent::new(AuthEventKind::SignedOut, None));
        Ok(())
    }

    fn on_auth_state_change(&self) -> Subscription<AuthEvent> {
        self.lock().auth_listeners.subscribe()
    }
}

impl RecordStore for MemoryBackend {
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<T>> {
        let mut state = self.lock();
        state.record(Call::Select)?;
        let mut rows: Vec<Value> = state
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = order {
            rows.sort_by(|a, b| order.compare(a, b));
        }
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| Error::Fetch(e.to_string())))
            .collect()
    }

    async fn insert<R: Serialize>(&self, table: &str, record: &R) -> Result<()> {
        let mut state = self.lock();
        state.record(Call::Insert)?;
        let row = state.prepare_row(record)?;
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        state.notify_rows(
            table,
            RecordChange {
                kind: ChangeKind::Insert,
                old: None,
                new: Some(row),
            },
        );
        Ok(())
    }

    async fn update<R: Serialize>(&self, table: &str, filter: &Filter, fields: &R) -> Result<()> {
        let mut state = self.lock();
        state.record(Call::Update)?;
        let fields = serde_json::to_value(fields).map_err(|e| Error::Mutation(e.to_string()))?;
        let Some(fields) = fields.as_object() else {
            return Err(Error::Mutation("update fields must be a JSON object".to_string()));
        };
        let mut changes = Vec::new();
        for row in state.tables.entry(table.to_string()).or_default().iter_mut() {
            if !filter.matches(row) {
                continue;
            }
            let old = row.clone();
            if let Some(target) = row.as_object_mut() {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            changes.push(RecordChange {
                kind: ChangeKind::Update,
                old: Some(old),
                new: Some(row.clone()),
            });
        }
        for change in changes {
            state.notify_rows(table, change);
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<()> {
        let mut state = self.lock();
        state.record(Call::Delete)?;
        let rows = state.tables.entry(table.to_string()).or_default();
        let (removed, kept): (Vec<Value>, Vec<Value>) =
            rows.drain(..).partition(|row| filter.matches(row));
        *rows = kept;
        for old in removed {
            state.notify_rows(
                table,
                RecordChange {
                    kind: ChangeKind::Delete,
                    old: Some(old),
                    new: None,
                },
            );
        }
        Ok(())
    }

    async fn subscribe(&self, table: &str, filter: &Filter) -> Result<Subscription<RecordChange>> {
        let mut state = self.lock();
        state.record(Call::Subscribe)?;
        let (tx, subscription) = Subscription::channel();
        state.row_listeners.push(RowListener {
            table: table.to_string(),
            filter: filter.clone(),
            tx,
        });
        Ok(subscription)
    }
}

impl ObjectStore for MemoryBackend {
    async fn upload(&self, bucket: &str, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let mut state = self.lock();
        state.record(Call::Upload)?;
        let slot = (bucket.to_string(), key.to_string());
        if state.objects.contains_key(&slot) {
            return Err(Error::Upload("The resource already exists".to_string()));
        }
        state.objects.insert(slot, bytes);
        Ok(())
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{BASE_URL}/{bucket}/{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskRecord};

    fn record(title: &str, email: &str) -> TaskRecord {
        TaskRecord {
            title: title.to_string(),
            description: String::new(),
            email: email.to_string(),
            user_id: "user-1".to_string(),
            image_url: Some(String::new()),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_created_at() {
        let backend = MemoryBackend::new();
        backend.insert("tasks", &record("first", "a@b.com")).await.unwrap();
        backend.insert("tasks", &record("second", "a@b.com")).await.unwrap();

        let tasks: Vec<Task> = backend
            .select("tasks", &Filter::new(), Some(&Order::desc("created_at")))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "second");
        assert_eq!(tasks[0].id, 2);
        assert!(tasks[0].created_at > tasks[1].created_at);
    }

    #[tokio::test]
    async fn test_subscription_receives_only_matching_changes() {
        let backend = MemoryBackend::new();
        let filter = Filter::new().eq("email", "a@b.com");
        let mut changes = backend.subscribe("tasks", &filter).await.unwrap();

        backend.insert("tasks", &record("mine", "a@b.com")).await.unwrap();
        backend.insert("tasks", &record("theirs", "c@d.com")).await.unwrap();
        backend
            .update("tasks", &Filter::new().eq("id", 1), &serde_json::json!({"title": "renamed"}))
            .await
            .unwrap();
        backend.delete("tasks", &Filter::new().eq("id", 1)).await.unwrap();

        let kinds: Vec<ChangeKind> = changes.drain().into_iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_released() {
        let backend = MemoryBackend::new();
        let subscription = backend.subscribe("tasks", &Filter::new()).await.unwrap();
        assert_eq!(backend.row_subscribers(), 1);
        drop(subscription);
        assert_eq!(backend.row_subscribers(), 0);
    }

    #[tokio::test]
    async fn test_fail_next_fails_once() {
        let backend = MemoryBackend::new();
        backend.fail_next(Call::Select, "connection reset");

        let err = backend
            .select::<Task>("tasks", &Filter::new(), None)
            .await
            .unwrap_err();
        assert_eq!(err, Error::Fetch("connection reset".into()));
        assert!(backend.select::<Task>("tasks", &Filter::new(), None).await.is_ok());
        assert_eq!(backend.calls(), vec![Call::Select, Call::Select]);
    }

    #[tokio::test]
    async fn test_sign_in_notifies_listeners() {
        let backend = MemoryBackend::new();
        backend.add_account("a@b.com", "secret1");
        let mut events = backend.on_auth_state_change();

        let session = backend.sign_in("a@b.com", "secret1").await.unwrap();
        assert_eq!(session.email(), Some("a@b.com"));
        backend.sign_out().await.unwrap();

        let kinds: Vec<AuthEventKind> = events.drain().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![AuthEventKind::SignedIn, AuthEventKind::SignedOut]);
        assert!(backend.get_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password_and_unconfirmed() {
        let backend = MemoryBackend::new().with_email_confirmation();
        assert_eq!(backend.sign_up("a@b.com", "secret1").await.unwrap(), None);

        let err = backend.sign_in("a@b.com", "secret1").await.unwrap_err();
        assert_eq!(err, Error::Auth("Email not confirmed".into()));

        backend.confirm_account("a@b.com");
        let err = backend.sign_in("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err, Error::Auth("Invalid login credentials".into()));
        assert!(backend.sign_in("a@b.com", "secret1").await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_and_public_url() {
        let backend = MemoryBackend::new();
        backend
            .upload("task-images", "cat.png-1", vec![1, 2, 3], "image/png")
            .await
            .unwrap();
        assert_eq!(backend.object("task-images", "cat.png-1"), Some(vec![1, 2, 3]));
        assert_eq!(
            backend.public_url("task-images", "cat.png-1"),
            "memory://storage/task-images/cat.png-1"
        );

        let err = backend
            .upload("task-images", "cat.png-1", vec![], "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
    }
}
