//! # Task form: create and edit submissions
//!
//! [`TaskForm`] holds the transient state of the create/edit form: the draft text,
//! the selected image and its preview, and which task (if any) is being edited.
//! [`TaskForm::submit`] uploads the image if one was selected, resolves the
//! `image_url` through [`ImageChoice`], and issues an insert or an owner-scoped
//! update. The form is reset only when every step succeeded.
//!
//! The visible task list is not touched here; it changes when the resulting change
//! event arrives through the subscription.

use base64::Engine as _;

use crate::backend::{ObjectStore, RecordStore};
use crate::clock::now_millis;
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::models::{Owner, Task, TaskId, TaskRecord, EMPTY_IMAGE_MARKER};

/// Title and description being typed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
}

impl TaskDraft {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.description.trim().is_empty() {
            return Err(Error::Validation("Please fill in all fields".to_string()));
        }
        Ok(())
    }
}

/// An image picked in the file input.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ImageFile {
    /// Wrap file contents, guessing the content type from the file name.
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name: name.to_string(),
            bytes,
            content_type,
        }
    }

    /// Object key: file name plus submission time, e.g. `cat.png-1714557600000`.
    pub fn object_key(&self, timestamp_ms: i64) -> String {
        format!("{}-{timestamp_ms}", self.name)
    }

    /// Inline `data:` URL used as the preview before upload.
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.content_type)
    }
}

/// How the submitted record's `image_url` is chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageChoice {
    /// A new image was uploaded to this URL.
    NewImage(String),
    /// Editing without a new image: keep whatever the task had.
    KeepExisting(Option<String>),
    /// Creating without an image.
    NoImage,
}

impl ImageChoice {
    pub fn resolve(uploaded: Option<String>, editing: Option<&Editing>) -> Self {
        match (uploaded, editing) {
            (Some(url), _) => ImageChoice::NewImage(url),
            (None, Some(editing)) => ImageChoice::KeepExisting(editing.existing_image_url.clone()),
            (None, None) => ImageChoice::NoImage,
        }
    }

    pub fn into_image_url(self) -> Option<String> {
        match self {
            ImageChoice::NewImage(url) => Some(url),
            ImageChoice::KeepExisting(url) => url,
            ImageChoice::NoImage => Some(EMPTY_IMAGE_MARKER.to_string()),
        }
    }
}

/// The task currently loaded into the form for editing.
#[derive(Clone, Debug, PartialEq)]
pub struct Editing {
    pub id: TaskId,
    pub existing_image_url: Option<String>,
}

/// What a successful submit did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

impl SubmitOutcome {
    pub fn message(self) -> &'static str {
        match self {
            SubmitOutcome::Created => "Task added successfully",
            SubmitOutcome::Updated => "Task updated successfully",
        }
    }
}

/// Transient create/edit form state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskForm {
    pub draft: TaskDraft,
    image: Option<ImageFile>,
    preview: Option<String>,
    editing: Option<Editing>,
}

impl TaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<&Editing> {
        self.editing.as_ref()
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// The image to show under the file input: the new preview, else the image of
    /// the task being edited.
    pub fn display_image(&self) -> Option<&str> {
        self.preview.as_deref().or_else(|| {
            self.editing
                .as_ref()
                .and_then(|e| e.existing_image_url.as_deref())
                .filter(|url| *url != EMPTY_IMAGE_MARKER)
        })
    }

    pub fn title(&self) -> &'static str {
        if self.is_editing() {
            "Edit Task"
        } else {
            "Create New Task"
        }
    }

    pub fn submit_label(&self) -> &'static str {
        if self.is_editing() {
            "Update Task"
        } else {
            "Add Task"
        }
    }

    /// Select an image and build its preview.
    pub fn select_image(&mut self, file: ImageFile) {
        self.preview = Some(file.data_url());
        self.image = Some(file);
    }

    /// Load an existing task into the form.
    pub fn begin_edit(&mut self, task: &Task) {
        self.draft = TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
        };
        self.image = None;
        self.preview = None;
        self.editing = Some(Editing {
            id: task.id,
            existing_image_url: task.image_url.clone(),
        });
    }

    /// Abandon the current draft or edit.
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Submit using the current time for the image key.
    pub async fn submit<B: RecordStore + ObjectStore>(
        &mut self,
        backend: &B,
        config: &TasksConfig,
        owner: &Owner,
    ) -> Result<SubmitOutcome> {
        self.submit_at(backend, config, owner, now_millis()).await
    }

    /// Upload, compose, insert or update. Resets the form only on success.
    pub async fn submit_at<B: RecordStore + ObjectStore>(
        &mut self,
        backend: &B,
        config: &TasksConfig,
        owner: &Owner,
        timestamp_ms: i64,
    ) -> Result<SubmitOutcome> {
        self.draft.validate()?;

        let uploaded = match &self.image {
            Some(file) => {
                let key = file.object_key(timestamp_ms);
                backend
                    .upload(&config.bucket, &key, file.bytes.clone(), &file.content_type)
                    .await?;
                tracing::debug!(%key, "uploaded task image");
                Some(backend.public_url(&config.bucket, &key))
            }
            None => None,
        };

        let record = TaskRecord {
            title: self.draft.title.clone(),
            description: self.draft.description.clone(),
            email: owner.email.clone(),
            user_id: owner.id.clone(),
            image_url: ImageChoice::resolve(uploaded, self.editing.as_ref()).into_image_url(),
        };

        let outcome = match &self.editing {
            Some(editing) => {
                let filter = Filter::new()
                    .eq("id", editing.id)
                    .eq(&config.owner_column, owner.email.as_str());
                backend.update(&config.table, &filter, &record).await?;
                SubmitOutcome::Updated
            }
            None => {
                backend.insert(&config.table, &record).await?;
                SubmitOutcome::Created
            }
        };

        self.reset();
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Call, MemoryBackend};

    fn owner() -> Owner {
        Owner {
            id: "user-1".to_string(),
            email: "a@b.com".to_string(),
        }
    }

    fn draft(title: &str, description: &str) -> TaskDraft {
        TaskDraft {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    fn only_task(backend: &MemoryBackend) -> Task {
        let rows = backend.rows("tasks");
        assert_eq!(rows.len(), 1);
        serde_json::from_value(rows[0].clone()).unwrap()
    }

    #[tokio::test]
    async fn test_create_without_image_uses_empty_marker() {
        let backend = MemoryBackend::new();
        let mut form = TaskForm::new();
        form.draft = draft("Buy milk", "2%");

        let outcome = form
            .submit(&backend, &TasksConfig::default(), &owner())
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Created);
        let task = only_task(&backend);
        assert_eq!(task.image_url, Some(EMPTY_IMAGE_MARKER.to_string()));
        assert_eq!(backend.rows("tasks")[0]["image_url"], serde_json::json!(""));
        assert_eq!(task.email, "a@b.com");
        assert_eq!(task.user_id, "user-1");
        assert_eq!(form, TaskForm::default());
    }

    #[tokio::test]
    async fn test_create_with_image_uploads_first() {
        let backend = MemoryBackend::new();
        let config = TasksConfig::default();
        let mut form = TaskForm::new();
        form.draft = draft("Cat", "feed");
        form.select_image(ImageFile::new("cat.png", vec![1, 2, 3]));
        assert_eq!(form.display_image(), Some("data:image/png;base64,AQID"));

        form.submit_at(&backend, &config, &owner(), 1_714_557_600_000)
            .await
            .unwrap();

        assert_eq!(backend.calls(), vec![Call::Upload, Call::Insert]);
        assert_eq!(
            backend.object("task-images", "cat.png-1714557600000"),
            Some(vec![1, 2, 3])
        );
        assert_eq!(
            only_task(&backend).image_url.as_deref(),
            Some("memory://storage/task-images/cat.png-1714557600000")
        );
    }

    #[tokio::test]
    async fn test_edit_without_new_image_keeps_previous_url() {
        let backend = MemoryBackend::new();
        let config = TasksConfig::default();
        let mut form = TaskForm::new();
        form.draft = draft("Cat", "feed");
        form.select_image(ImageFile::new("cat.png", vec![9]));
        form.submit_at(&backend, &config, &owner(), 1).await.unwrap();
        let created = only_task(&backend);

        form.begin_edit(&created);
        assert!(form.is_editing());
        assert_eq!(form.display_image(), created.image_url.as_deref());
        form.draft.title = "Cat (fed)".to_string();
        let outcome = form.submit_at(&backend, &config, &owner(), 2).await.unwrap();

        assert_eq!(outcome, SubmitOutcome::Updated);
        let updated = only_task(&backend);
        assert_eq!(updated.title, "Cat (fed)");
        assert_eq!(updated.image_url, created.image_url);
        assert!(!form.is_editing());
    }

    #[tokio::test]
    async fn test_edit_with_new_image_replaces_url() {
        let backend = MemoryBackend::new();
        let config = TasksConfig::default();
        let mut form = TaskForm::new();
        form.draft = draft("Dog", "walk");
        form.submit_at(&backend, &config, &owner(), 1).await.unwrap();

        form.begin_edit(&only_task(&backend));
        form.select_image(ImageFile::new("dog.jpg", vec![4]));
        form.submit_at(&backend, &config, &owner(), 5).await.unwrap();

        assert_eq!(
            only_task(&backend).image_url.as_deref(),
            Some("memory://storage/task-images/dog.jpg-5")
        );
    }

    #[tokio::test]
    async fn test_update_is_scoped_to_owner() {
        let backend = MemoryBackend::new();
        let config = TasksConfig::default();
        let theirs = backend.seed(
            "tasks",
            &TaskRecord {
                title: "theirs".into(),
                description: "x".into(),
                email: "c@d.com".into(),
                user_id: "user-2".into(),
                image_url: None,
            },
        );
        let theirs: Task = serde_json::from_value(theirs).unwrap();

        let mut form = TaskForm::new();
        form.begin_edit(&theirs);
        form.draft.title = "hijacked".into();
        form.submit_at(&backend, &config, &owner(), 1).await.unwrap();

        assert_eq!(only_task(&backend).title, "theirs");
    }

    #[tokio::test]
    async fn test_upload_failure_keeps_form_and_skips_insert() {
        let backend = MemoryBackend::new();
        let mut form = TaskForm::new();
        form.draft = draft("Cat", "feed");
        form.select_image(ImageFile::new("cat.png", vec![1]));
        let before = form.clone();

        backend.fail_next(Call::Upload, "Payload too large");
        let err = form
            .submit(&backend, &TasksConfig::default(), &owner())
            .await
            .unwrap_err();

        assert_eq!(err, Error::Upload("Payload too large".into()));
        assert_eq!(form, before);
        assert_eq!(backend.calls(), vec![Call::Upload]);
        assert!(backend.rows("tasks").is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_keeps_form() {
        let backend = MemoryBackend::new();
        let mut form = TaskForm::new();
        form.draft = draft("Buy milk", "2%");
        let before = form.clone();

        backend.fail_next(Call::Insert, "new row violates row-level security policy");
        let err = form
            .submit(&backend, &TasksConfig::default(), &owner())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Mutation(_)));
        assert_eq!(form, before);
    }

    #[tokio::test]
    async fn test_blank_fields_rejected_locally() {
        let backend = MemoryBackend::new();
        let mut form = TaskForm::new();
        form.draft = draft("  ", "2%");
        let err = form
            .submit(&backend, &TasksConfig::default(), &owner())
            .await
            .unwrap_err();
        assert_eq!(err, Error::Validation("Please fill in all fields".into()));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_cancel_resets_edit_state() {
        let mut form = TaskForm::new();
        let task = Task {
            id: 3,
            title: "t".into(),
            description: "d".into(),
            image_url: Some("https://img".into()),
            email: "a@b.com".into(),
            user_id: "user-1".into(),
            created_at: chrono::Utc::now(),
        };
        form.begin_edit(&task);
        assert_eq!(form.title(), "Edit Task");
        assert_eq!(form.submit_label(), "Update Task");
        assert_eq!(form.editing().map(|e| e.id), Some(3));

        form.cancel();
        assert_eq!(form, TaskForm::default());
        assert_eq!(form.title(), "Create New Task");
    }

    #[test]
    fn test_image_choice_resolution() {
        let editing = Editing {
            id: 1,
            existing_image_url: Some("old".into()),
        };
        assert_eq!(
            ImageChoice::resolve(Some("new".into()), Some(&editing)),
            ImageChoice::NewImage("new".into())
        );
        assert_eq!(
            ImageChoice::resolve(None, Some(&editing)).into_image_url(),
            Some("old".into())
        );
        assert_eq!(ImageChoice::resolve(None, None).into_image_url(), Some(String::new()));
    }
}
