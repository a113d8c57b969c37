use dioxus::prelude::*;

use crate::icons::FaXmark;
use crate::toast::{use_toasts, ToastLevel};
use crate::Icon;

/// Stack of transient notifications in the corner of the page.
#[component]
pub fn Toaster() -> Element {
    let mut toasts = use_toasts();
    let entries = toasts().entries.clone();

    if entries.is_empty() {
        return rsx! {};
    }

    rsx! {
        div {
            class: "toaster",
            for toast in entries {
                div {
                    key: "{toast.id}",
                    class: match toast.level {
                        ToastLevel::Success => "toast success",
                        ToastLevel::Info => "toast info",
                        ToastLevel::Error => "toast error",
                    },
                    div {
                        class: "toast-body",
                        div { class: "toast-title", "{toast.title}" }
                        div { class: "toast-message", "{toast.message}" }
                    }
                    button {
                        class: "toast-close",
                        title: "Dismiss",
                        onclick: move |_| toasts.write().dismiss(toast.id),
                        Icon { icon: FaXmark, width: 12, height: 12 }
                    }
                }
            }
        }
    }
}
