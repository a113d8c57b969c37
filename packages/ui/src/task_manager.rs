//! Signed-in task view: loads the owner's tasks, keeps them live, and wires the form
//! and the delete flow.

use dioxus::prelude::*;
use store::{Filter, Owner, RecordStore, TaskEvent, TaskForm, TaskId, TaskList};

use crate::auth::{use_app_config, use_backend};
use crate::task_form::TaskFormPanel;
use crate::task_list::TaskCards;
use crate::toast::{notify_error, notify_success, use_toasts};

pub const DELETE_CONFIRMATION: &str = "Are you sure you want to delete this task?";

#[cfg(target_arch = "wasm32")]
fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[cfg(not(target_arch = "wasm32"))]
fn confirm(_message: &str) -> bool {
    true
}

/// Tasks of `owner`. Mount with `key` set to the owner's email so a new identity
/// gets a fresh list and subscription.
#[component]
pub fn TaskManager(owner: Owner) -> Element {
    let backend = use_backend();
    let config = use_app_config();
    let mut toasts = use_toasts();
    let mut tasks = use_signal(|| TaskList::new(config.sync.insert_policy));
    let mut loading = use_signal(|| true);
    let mut deleting = use_signal(|| false);
    let mut form = use_signal(TaskForm::new);

    // Join the change feed first so nothing committed during the initial load is
    // missed; buffered events are applied on top of the loaded tasks. Dropping the
    // future on unmount drops the subscription, which closes the socket.
    {
        let backend = backend.clone();
        let table = config.tasks.clone();
        let email = owner.email.clone();
        use_future(move || {
            let backend = backend.clone();
            let table = table.clone();
            let email = email.clone();
            async move {
                let filter = Filter::new().eq(&table.owner_column, email.as_str());
                let changes = backend
                    .subscribe(&table.table, &filter)
                    .await
                    .inspect_err(|e| tracing::warn!("live updates unavailable: {e}"))
                    .ok();

                let loaded = TaskList::load(&backend, &table, &email).await;
                let result = tasks.write().replace_loaded(loaded);
                if let Err(e) = result {
                    notify_error(&mut toasts, &e);
                }
                loading.set(false);

                let Some(mut changes) = changes else {
                    return;
                };
                while let Some(change) = changes.next_event().await {
                    match TaskEvent::from_change(change) {
                        Ok(event) => {
                            tracing::debug!(?event, "applying change");
                            tasks.write().apply(event);
                        }
                        Err(e) => tracing::warn!("skipping malformed change: {e}"),
                    }
                }
                tracing::debug!("task change feed closed");
            }
        });
    }

    let on_edit = move |task: store::Task| form.write().begin_edit(&task);

    let on_delete = {
        let owner = owner.clone();
        move |id: TaskId| {
            if deleting() || !confirm(DELETE_CONFIRMATION) {
                return;
            }
            let backend = backend.clone();
            let table = config.tasks.clone();
            let owner = owner.clone();
            deleting.set(true);
            spawn(async move {
                let outcome = TaskList::delete(&backend, &table, id, &owner).await;
                let result = tasks.write().settle_delete(outcome);
                match result {
                    Ok(()) => notify_success(&mut toasts, "Task deleted successfully"),
                    Err(e) => notify_error(&mut toasts, &e),
                }
                deleting.set(false);
            });
        }
    };

    rsx! {
        TaskFormPanel { owner: owner.clone(), form }
        TaskCards {
            tasks,
            loading: loading(),
            busy: deleting(),
            on_edit,
            on_delete,
        }
    }
}
