use dioxus::prelude::*;

/// How long a toast stays up before dismissing itself.
pub const TOAST_TIMEOUT_MS: u32 = 5_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct Toasts {
    pub entries: Vec<Toast>,
    next_id: u64,
}

impl Toasts {
    pub fn push(&mut self, level: ToastLevel, title: &str, message: &str) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Toast {
            id,
            level,
            title: title.to_string(),
            message: message.to_string(),
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.entries.retain(|t| t.id != id);
    }
}

pub fn use_toasts() -> Signal<Toasts> {
    use_context::<Signal<Toasts>>()
}

/// Show a toast. In the browser it dismisses itself after [`TOAST_TIMEOUT_MS`].
pub fn notify(toasts: &mut Signal<Toasts>, level: ToastLevel, title: &str, message: &str) {
    let id = toasts.write().push(level, title, message);
    schedule_dismiss(*toasts, id);
}

pub fn notify_success(toasts: &mut Signal<Toasts>, message: &str) {
    notify(toasts, ToastLevel::Success, "Success", message);
}

/// Show an operation failure with its message verbatim.
pub fn notify_error(toasts: &mut Signal<Toasts>, err: &store::Error) {
    tracing::error!("{}: {err}", err.title());
    notify(toasts, ToastLevel::Error, err.title(), &err.to_string());
}

#[cfg(target_arch = "wasm32")]
fn schedule_dismiss(mut toasts: Signal<Toasts>, id: u64) {
    spawn(async move {
        gloo_timers::future::TimeoutFuture::new(TOAST_TIMEOUT_MS).await;
        toasts.write().dismiss(id);
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn schedule_dismiss(_toasts: Signal<Toasts>, _id: u64) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_increasing_ids() {
        let mut toasts = Toasts::default();
        let first = toasts.push(ToastLevel::Success, "Success", "Task added successfully");
        let second = toasts.push(ToastLevel::Error, "Error", "boom");
        assert!(second > first);
        assert_eq!(toasts.entries.len(), 2);
        assert_eq!(toasts.entries[0].message, "Task added successfully");
    }

    #[test]
    fn test_dismiss_removes_only_that_toast() {
        let mut toasts = Toasts::default();
        let first = toasts.push(ToastLevel::Info, "Info", "a");
        let second = toasts.push(ToastLevel::Info, "Info", "b");
        toasts.dismiss(first);
        toasts.dismiss(first);
        assert_eq!(toasts.entries.len(), 1);
        assert_eq!(toasts.entries[0].id, second);
    }
}
