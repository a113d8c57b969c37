use dioxus::prelude::*;
use store::Owner;

use crate::{use_auth, CredentialForm, TaskManager, Toaster, UserHeader};

const VIEWS_CSS: Asset = asset!("/src/views/views.css");

/// The whole app surface: credential form when signed out, tasks when signed in.
#[component]
pub fn BoardView() -> Element {
    let auth = use_auth();
    let state = auth();

    let content = if state.loading {
        rsx! {
            div { class: "page-status", div { class: "spinner" } }
        }
    } else {
        match state.session.current() {
            None => rsx! { CredentialForm {} },
            Some(session) => {
                let tasks = match Owner::from_session(session) {
                    Ok(owner) => rsx! {
                        TaskManager { key: "{owner.email}", owner }
                    },
                    Err(e) => rsx! {
                        p { class: "form-error", "{e}" }
                    },
                };
                rsx! {
                    UserHeader {}
                    {tasks}
                }
            }
        }
    };

    rsx! {
        document::Stylesheet { href: VIEWS_CSS }
        main {
            class: "board",
            {content}
        }
        Toaster {}
    }
}
