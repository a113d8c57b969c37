use dioxus::prelude::*;

use crate::auth::{use_auth, LogoutButton};

/// Avatar initial, display name, email, and the logout button.
#[component]
pub fn UserHeader() -> Element {
    let auth = use_auth();
    let state = auth();
    let Some(session) = state.session.current() else {
        return rsx! {};
    };
    let user = &session.user;
    let email = user.email.clone().unwrap_or_default();

    rsx! {
        header {
            class: "card user-header",
            div {
                class: "user-identity",
                div { class: "avatar", "{user.avatar_initial()}" }
                div {
                    div { class: "user-name", "{user.display_name()}" }
                    div { class: "user-email", "{email}" }
                }
            }
            LogoutButton { class: "btn btn-outline" }
        }
    }
}
