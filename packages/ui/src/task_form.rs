use dioxus::prelude::*;
use store::{ImageFile, Owner, TaskForm};

use crate::auth::{use_app_config, use_backend};
use crate::toast::{notify_error, notify_success, use_toasts};

/// Create/edit form. The list is not touched here; it updates from the change feed.
#[component]
pub fn TaskFormPanel(owner: Owner, mut form: Signal<TaskForm>) -> Element {
    let backend = use_backend();
    let config = use_app_config();
    let mut toasts = use_toasts();
    let mut submitting = use_signal(|| false);
    // Bumped to remount the file input, which clears its selection.
    let mut file_input_key = use_signal(|| 0u32);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        let backend = backend.clone();
        let tasks = config.tasks.clone();
        let owner = owner.clone();
        async move {
            submitting.set(true);
            let mut next = form();
            let result = next.submit(&backend, &tasks, &owner).await;
            submitting.set(false);
            match result {
                Ok(outcome) => {
                    form.set(next);
                    file_input_key += 1;
                    notify_success(&mut toasts, outcome.message());
                }
                Err(e) => notify_error(&mut toasts, &e),
            }
        }
    };

    let onfile = move |evt: FormEvent| async move {
        let Some(engine) = evt.files() else {
            return;
        };
        let Some(name) = engine.files().into_iter().next() else {
            return;
        };
        match engine.read_file(&name).await {
            Some(bytes) => form.write().select_image(ImageFile::new(&name, bytes)),
            None => tracing::warn!("could not read selected file {name}"),
        }
    };

    let oncancel = move |_| {
        form.write().cancel();
        file_input_key += 1;
    };

    let state = form();
    let busy = submitting();

    rsx! {
        section {
            class: "card task-form",
            h2 { "{state.title()}" }

            form {
                onsubmit: onsubmit,

                input {
                    r#type: "text",
                    name: "title",
                    placeholder: "Task Title",
                    disabled: busy,
                    value: "{state.draft.title}",
                    oninput: move |evt: FormEvent| form.write().draft.title = evt.value(),
                }

                textarea {
                    name: "description",
                    placeholder: "Task Description",
                    rows: 3,
                    disabled: busy,
                    value: "{state.draft.description}",
                    oninput: move |evt: FormEvent| form.write().draft.description = evt.value(),
                }

                input {
                    key: "{file_input_key}",
                    r#type: "file",
                    accept: "image/*",
                    disabled: busy,
                    onchange: onfile,
                }

                if let Some(src) = state.display_image() {
                    img { class: "image-preview", src: "{src}", alt: "Preview" }
                }

                div {
                    class: "form-actions",
                    button {
                        class: "btn btn-primary",
                        r#type: "submit",
                        disabled: busy,
                        if busy { "Processing..." } else { "{state.submit_label()}" }
                    }
                    if state.is_editing() {
                        button {
                            class: "btn btn-outline",
                            r#type: "button",
                            disabled: busy,
                            onclick: oncancel,
                            "Cancel"
                        }
                    }
                }
            }
        }
    }
}
