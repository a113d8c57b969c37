//! This crate contains all shared UI for the workspace.

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod backend;
pub use backend::{load_config, make_backend, Backend};

pub mod views;

mod auth;
pub use auth::{use_app_config, use_auth, use_backend, AuthProvider, AuthState, LogoutButton};

pub mod toast;
pub use toast::{notify, notify_error, notify_success, use_toasts, ToastLevel, Toasts};

mod toaster;
pub use toaster::Toaster;

mod credential_form;
pub use credential_form::CredentialForm;

mod user_header;
pub use user_header::UserHeader;

mod task_form;
pub use task_form::TaskFormPanel;

mod task_list;
pub use task_list::{created_label, TaskCards};

mod task_manager;
pub use task_manager::{TaskManager, DELETE_CONFIRMATION};
