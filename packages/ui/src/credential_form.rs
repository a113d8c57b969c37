use dioxus::prelude::*;
use store::credentials::{self, AuthMode};

use crate::auth::use_backend;
use crate::toast::{notify_error, notify_success, use_toasts};

/// Email/password form for signing in or creating an account.
#[component]
pub fn CredentialForm() -> Element {
    let backend = use_backend();
    let mut toasts = use_toasts();
    let mut mode = use_signal(AuthMode::default);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut loading = use_signal(|| false);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = backend.clone();
        async move {
            error.set(None);
            loading.set(true);
            let result = credentials::submit(&backend, mode(), &email(), &password()).await;
            match result {
                Ok(outcome) => {
                    loading.set(false);
                    notify_success(&mut toasts, outcome.message());
                }
                Err(e) => {
                    loading.set(false);
                    error.set(Some(e.to_string()));
                    notify_error(&mut toasts, &e);
                }
            }
        }
    };

    let toggle = move |_| {
        mode.set(mode().toggled());
        error.set(None);
    };

    rsx! {
        div {
            class: "auth-card",
            h1 { class: "auth-title", "{mode().title()}" }

            form {
                class: "auth-form",
                onsubmit: onsubmit,

                label { r#for: "auth-email", "Email" }
                input {
                    id: "auth-email",
                    r#type: "email",
                    placeholder: "you@example.com",
                    disabled: loading(),
                    value: email(),
                    oninput: move |evt: FormEvent| email.set(evt.value()),
                }

                label { r#for: "auth-password", "Password" }
                input {
                    id: "auth-password",
                    r#type: "password",
                    placeholder: "••••••",
                    disabled: loading(),
                    value: password(),
                    oninput: move |evt: FormEvent| password.set(evt.value()),
                }

                if let Some(message) = error() {
                    p { class: "form-error", "{message}" }
                }

                button {
                    class: "btn btn-primary",
                    r#type: "submit",
                    disabled: loading(),
                    if loading() { "Loading..." } else { "{mode().submit_label()}" }
                }
            }

            button {
                class: "btn btn-link",
                disabled: loading(),
                onclick: toggle,
                "{mode().toggle_label()}"
            }
        }
    }
}
