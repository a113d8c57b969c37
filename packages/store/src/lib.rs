//! Task domain core: models, collaborator contracts, and the state machines the UI
//! drives. Nothing here talks to the network; the `api` crate supplies the hosted
//! implementation of the [`backend`] traits and [`MemoryBackend`] stands in for it in
//! tests.

pub mod backend;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod subscription;
pub mod task_form;
pub mod task_list;

mod memory;
pub use memory::{Call, MemoryBackend};

pub use backend::{AuthService, ChangeKind, ObjectStore, RecordChange, RecordStore};
pub use config::{AppConfig, TasksConfig};
pub use credentials::{AuthMode, AuthOutcome};
pub use error::{Error, Result};
pub use filter::{Filter, Order};
pub use models::{AuthEvent, AuthEventKind, Owner, Session, Task, TaskId, TaskRecord, User};
pub use session::SessionHolder;
pub use subscription::{Listeners, Subscription};
pub use task_form::{ImageChoice, ImageFile, SubmitOutcome, TaskDraft, TaskForm};
pub use task_list::{DeleteOutcome, InsertPolicy, TaskEvent, TaskList};
