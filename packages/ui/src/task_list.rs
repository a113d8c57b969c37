use dioxus::prelude::*;
use store::{Task, TaskId, TaskList};

use crate::icons::{FaImage, FaPen, FaTrash};
use crate::Icon;

/// "Created: May 1, 2024" for a task card.
pub fn created_label(task: &Task) -> String {
    format!("Created: {}", task.created_at.format("%b %-d, %Y"))
}

/// The owner's tasks as cards, newest first.
#[component]
pub fn TaskCards(
    tasks: Signal<TaskList>,
    loading: bool,
    /// Disables the card actions while a delete is in flight.
    busy: bool,
    on_edit: EventHandler<Task>,
    on_delete: EventHandler<TaskId>,
) -> Element {
    let list = tasks();

    rsx! {
        section {
            class: "task-list",
            h2 { "Your Tasks" }

            if loading && list.is_empty() {
                div {
                    class: "task-list-status",
                    div { class: "spinner" }
                    p { "Loading tasks..." }
                }
            } else if list.is_empty() {
                p { class: "task-list-status", "No tasks yet. Create your first task above!" }
            } else {
                div {
                    class: "task-grid",
                    for task in list.iter().cloned() {
                        TaskCard {
                            key: "{task.id}",
                            task,
                            busy,
                            on_edit,
                            on_delete,
                        }
                    }
                }
            }
        }
    }
}

#[component]
fn TaskCard(
    task: Task,
    busy: bool,
    on_edit: EventHandler<Task>,
    on_delete: EventHandler<TaskId>,
) -> Element {
    let id = task.id;
    let created = created_label(&task);
    let editable = task.clone();

    rsx! {
        article {
            class: "card task-card",
            if let Some(src) = task.image() {
                img { class: "task-image", src: "{src}", alt: "{task.title}" }
            } else {
                div {
                    class: "task-image placeholder",
                    Icon { icon: FaImage, width: 20, height: 20 }
                    span { "No Image Available" }
                }
            }
            div {
                class: "task-body",
                h3 { "{task.title}" }
                p { class: "task-description", "{task.description}" }
                p { class: "task-date", "{created}" }
            }
            div {
                class: "task-actions",
                button {
                    class: "btn btn-outline",
                    disabled: busy,
                    onclick: move |_| on_edit.call(editable.clone()),
                    Icon { icon: FaPen, width: 12, height: 12 }
                    span { "Edit" }
                }
                button {
                    class: "btn btn-danger",
                    disabled: busy,
                    onclick: move |_| on_delete.call(id),
                    Icon { icon: FaTrash, width: 12, height: 12 }
                    span { "Delete" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_label() {
        let task = Task {
            id: 1,
            title: "Buy milk".into(),
            description: "2%".into(),
            image_url: Some(String::new()),
            email: "a@b.com".into(),
            user_id: "u1".into(),
            created_at: "2024-05-01T10:00:00Z".parse().unwrap(),
        };
        assert_eq!(created_label(&task), "Created: May 1, 2024");
    }
}
