//! Authentication context and hooks for the UI.

use dioxus::prelude::*;
use store::{AppConfig, AuthService, SessionHolder};

use crate::backend::{make_backend, Backend};
use crate::icons::FaRightFromBracket;
use crate::toast::{notify_error, use_toasts, Toasts};
use crate::Icon;

/// Authentication state for the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub session: SessionHolder,
    /// True until the startup session fetch has finished.
    pub loading: bool,
}

impl Default for AuthState {
    fn default() -> Self {
        Self {
            session: SessionHolder::new(),
            loading: true,
        }
    }
}

/// Get the current authentication state.
/// Returns a signal that updates on every auth-state change.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// The hosted backend client.
pub fn use_backend() -> Backend {
    use_context::<Backend>()
}

/// The application configuration.
pub fn use_app_config() -> AppConfig {
    use_context::<AppConfig>()
}

/// Provider component that owns the backend client, the session, and the toasts.
///
/// The current session is fetched once on mount; afterwards every auth event from the
/// backend replaces it. The listener is released when the provider unmounts.
#[component]
pub fn AuthProvider(config: AppConfig, children: Element) -> Element {
    let backend = use_hook(|| make_backend(&config));
    use_context_provider(|| backend.clone());
    use_context_provider(|| config.clone());
    use_context_provider(|| Signal::new(Toasts::default()));
    let mut auth_state = use_context_provider(|| Signal::new(AuthState::default()));

    use_future(move || {
        let backend = backend.clone();
        async move {
            let mut events = backend.on_auth_state_change();

            let mut session = SessionHolder::new();
            if let Err(e) = session.initialize(&backend).await {
                tracing::warn!("could not restore session: {e}");
            }
            auth_state.set(AuthState {
                session,
                loading: false,
            });

            while let Some(event) = events.next_event().await {
                auth_state.write().session.on_auth_state_change(event);
            }
        }
    });

    rsx! {
        {children}
    }
}

/// Button to log out the current user.
#[component]
pub fn LogoutButton(
    #[props(default = "Log Out".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let backend = use_backend();
    let mut toasts = use_toasts();
    let mut pending = use_signal(|| false);

    let onclick = move |_| {
        let backend = backend.clone();
        async move {
            pending.set(true);
            // On success the SignedOut event unmounts this button.
            if let Err(e) = SessionHolder::sign_out(&backend).await {
                pending.set(false);
                notify_error(&mut toasts, &e);
            }
        }
    };

    rsx! {
        button {
            class: "{class}",
            disabled: pending(),
            onclick: onclick,
            Icon { icon: FaRightFromBracket, width: 14, height: 14 }
            span { "{label}" }
        }
    }
}
