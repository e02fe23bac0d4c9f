use chrono::Utc;
use iced::event::{self, Event};
use iced::widget::image::Handle;
use iced::widget::{row, text_editor, text_input};
use iced::{keyboard, window, Element, Length, Subscription, Task, Theme};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod media;
mod publish;
mod state;
mod ui;

use config::{
    AppConfig, NARROW_WINDOW_WIDTH, PUBLISH_SUCCESS_DURATION, SAVE_ACK_DURATION,
};
use media::ingest;
use media::preview::{self, Preview};
use state::data::Draft;
use state::library::LocalStorage;
use state::session::{DeleteOutcome, DraftForm, Session};
use state::settings;
use state::store::DraftStore;
use ui::form::PreviewView;

/// Progress of the most recent publish request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishStatus {
    Sending,
    Sent,
    Failed,
}

/// Blocking native dialogs the app raises
#[derive(Clone, Copy)]
struct Dialogs {
    alert: fn(&str),
    confirm_delete: fn() -> bool,
}

impl Dialogs {
    fn native() -> Self {
        Dialogs {
            alert,
            confirm_delete,
        }
    }
}

/// Main application state
struct DraftWriter {
    /// Drafts and the endpoint setting
    storage: LocalStorage,
    /// Which draft is checked out into the form
    session: Session,
    /// Metadata fields as currently shown
    form: DraftForm,
    /// Body editor buffer; copied into `form.content` on every save
    editor: text_editor::Content,
    /// Draft list in display order
    drafts: Vec<Draft>,
    /// Publish endpoint field
    endpoint: String,
    preview: PreviewView,
    /// Set while the save button shows its acknowledgment
    save_ack: Option<u64>,
    publish_status: Option<PublishStatus>,
    /// Bumped per explicit save so stale acknowledgment timers are ignored
    save_generation: u64,
    /// Bumped per successful publish, same purpose for the status timer
    publish_generation: u64,
    /// Last storage or ingestion problem, shown above the editor
    notice: Option<String>,
    window_width: f32,
    /// Draft list overlay in narrow windows
    sidebar_open: bool,
    dialogs: Dialogs,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    NewDraft,
    SelectDraft(String),
    DeleteDraft(String),
    TitleChanged(String),
    TagsChanged(String),
    SlugChanged(String),
    CategoryChanged(String),
    ImageChanged(String),
    EditorAction(text_editor::Action),
    EndpointChanged(String),
    /// Explicit save (button or Ctrl/Cmd+S)
    Save,
    SaveAckExpired(u64),
    PickImage,
    ImageIngested(Result<String, String>),
    /// Bytes fetched for a remote image field, tagged with the URL asked for
    RemotePreviewLoaded(String, Result<Vec<u8>, String>),
    ClearImage,
    Publish,
    PublishFinished(Result<(), String>),
    PublishStatusExpired(u64),
    ToggleSidebar,
    WindowResized(f32),
}

impl DraftWriter {
    /// Create the application around an opened storage area
    fn new(storage: LocalStorage) -> (Self, Task<Message>) {
        Self::with_dialogs(storage, Dialogs::native())
    }

    fn with_dialogs(storage: LocalStorage, dialogs: Dialogs) -> (Self, Task<Message>) {
        let endpoint = settings::load_endpoint(&storage).unwrap_or_default();

        let mut app = DraftWriter {
            storage,
            session: Session::new(),
            form: DraftForm::default(),
            editor: text_editor::Content::new(),
            drafts: Vec::new(),
            endpoint,
            preview: PreviewView::Hidden,
            save_ack: None,
            publish_status: None,
            save_generation: 0,
            publish_generation: 0,
            notice: None,
            window_width: 1024.0,
            sidebar_open: false,
            dialogs,
        };

        let store = DraftStore::new(&app.storage);
        match app.session.open_initial(&store, &mut app.form) {
            Ok(id) => tracing::info!("Opened draft {}", id),
            Err(e) => {
                tracing::error!("Could not open a draft: {}", e);
                app.notice = Some(format!("Could not open a draft: {}", e));
            }
        }
        let preview = app.sync_from_form();

        tracing::info!(
            "Draft Writer started with {} drafts (storage: {:?})",
            app.drafts.len(),
            app.storage.path()
        );
        (app, preview)
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::NewDraft => {
                let store = DraftStore::new(&self.storage);
                match self.session.create_new(&store, &mut self.form) {
                    Ok(_) => {
                        let preview = self.sync_from_form();
                        self.dismiss_overlay();
                        return Task::batch([preview, text_input::focus(ui::form::title_input_id())]);
                    }
                    Err(e) => self.report("Could not create a draft", e),
                }
                Task::none()
            }
            Message::SelectDraft(id) => {
                let store = DraftStore::new(&self.storage);
                if self.session.load(&store, &mut self.form, &id) {
                    self.dismiss_overlay();
                    return self.sync_from_form();
                }
                Task::none()
            }
            Message::DeleteDraft(id) => {
                let store = DraftStore::new(&self.storage);
                let outcome = self
                    .session
                    .delete(&store, &mut self.form, &id, self.dialogs.confirm_delete);

                match outcome {
                    Ok(DeleteOutcome::Declined) => {}
                    Ok(DeleteOutcome::Removed) => self.refresh_list(),
                    Ok(DeleteOutcome::Switched(next)) => {
                        tracing::info!("Now editing draft {}", next);
                        self.dismiss_overlay();
                        return self.sync_from_form();
                    }
                    Ok(DeleteOutcome::Replaced(fresh)) => {
                        tracing::info!("Now editing new draft {}", fresh);
                        self.dismiss_overlay();
                        let preview = self.sync_from_form();
                        return Task::batch([preview, text_input::focus(ui::form::title_input_id())]);
                    }
                    Err(e) => self.report("Could not delete the draft", e),
                }
                Task::none()
            }
            Message::TitleChanged(value) => {
                self.form.title = value;
                self.save(true)
            }
            Message::TagsChanged(value) => {
                self.form.tags = value;
                self.save(true)
            }
            Message::SlugChanged(value) => {
                self.form.slug = value;
                self.save(true)
            }
            Message::CategoryChanged(value) => {
                self.form.category = value;
                self.save(true)
            }
            Message::ImageChanged(value) => {
                self.form.image = value;
                let preview = self.refresh_preview();
                Task::batch([preview, self.save(true)])
            }
            Message::EditorAction(action) => {
                let is_edit = action.is_edit();
                self.editor.perform(action);
                if is_edit {
                    return self.save(true);
                }
                Task::none()
            }
            Message::EndpointChanged(value) => {
                if let Err(e) = settings::save_endpoint(&self.storage, &value) {
                    self.report("Could not store the endpoint", e);
                }
                self.endpoint = value;
                Task::none()
            }
            Message::Save => self.save(false),
            Message::SaveAckExpired(generation) => {
                if self.save_ack == Some(generation) {
                    self.save_ack = None;
                }
                Task::none()
            }
            Message::PickImage => {
                let file = FileDialog::new()
                    .set_title("Select Hero Image")
                    .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                    .pick_file();

                match file {
                    Some(path) => self.ingest(path),
                    None => Task::none(),
                }
            }
            Message::ImageIngested(Ok(uri)) => {
                self.form.image = uri;
                let preview = self.refresh_preview();
                Task::batch([preview, self.save(true)])
            }
            Message::ImageIngested(Err(e)) => {
                tracing::error!("Image ingestion failed: {}", e);
                self.notice = Some(format!("Could not use that image: {}", e));
                Task::none()
            }
            Message::RemotePreviewLoaded(url, result) => {
                // The field may have moved on while the fetch was in flight
                if self.form.image != url {
                    return Task::none();
                }
                match result {
                    Ok(bytes) => self.preview = PreviewView::Picture(Handle::from_bytes(bytes)),
                    Err(e) => tracing::debug!("Showing {} as a link: {}", url, e),
                }
                Task::none()
            }
            Message::ClearImage => {
                self.form.image.clear();
                let preview = self.refresh_preview();
                Task::batch([preview, self.save(true)])
            }
            Message::Publish => self.publish(),
            Message::PublishFinished(Ok(())) => {
                self.publish_status = Some(PublishStatus::Sent);
                self.publish_generation += 1;
                let generation = self.publish_generation;
                Task::perform(tokio::time::sleep(PUBLISH_SUCCESS_DURATION), move |_| {
                    Message::PublishStatusExpired(generation)
                })
            }
            Message::PublishFinished(Err(e)) => {
                tracing::error!("Publish failed: {}", e);
                self.publish_status = Some(PublishStatus::Failed);
                Task::none()
            }
            Message::PublishStatusExpired(generation) => {
                if generation == self.publish_generation
                    && self.publish_status == Some(PublishStatus::Sent)
                {
                    self.publish_status = None;
                }
                Task::none()
            }
            Message::ToggleSidebar => {
                self.sidebar_open = !self.sidebar_open;
                Task::none()
            }
            Message::WindowResized(width) => {
                self.window_width = width;
                if !self.is_narrow() {
                    self.sidebar_open = false;
                }
                Task::none()
            }
        }
    }

    /// Harvest the form into the current draft.
    ///
    /// Silent saves are the autosave path; explicit saves also flash the
    /// save button for a moment.
    fn save(&mut self, silent: bool) -> Task<Message> {
        self.form.content = self.editor_text();

        let store = DraftStore::new(&self.storage);
        if let Err(e) = self.session.save(&store, &self.form) {
            self.report("Could not save the draft", e);
            return Task::none();
        }
        self.refresh_list();

        if silent {
            return Task::none();
        }

        self.save_generation += 1;
        let generation = self.save_generation;
        self.save_ack = Some(generation);
        Task::perform(tokio::time::sleep(SAVE_ACK_DURATION), move |_| {
            Message::SaveAckExpired(generation)
        })
    }

    fn ingest(&mut self, path: PathBuf) -> Task<Message> {
        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if ingest::exceeds_size_advisory(size) {
            tracing::warn!("Selected image is {} bytes", size);
            MessageDialog::new()
                .set_level(MessageLevel::Warning)
                .set_title("Large image")
                .set_description("This file is large. Images under 5 MB are recommended.")
                .set_buttons(MessageButtons::Ok)
                .show();
        }

        Task::perform(ingest::ingest_file(path), |result| {
            Message::ImageIngested(result.map_err(|e| e.to_string()))
        })
    }

    fn publish(&mut self) -> Task<Message> {
        if let Err(e) = publish::validate(&self.endpoint, &self.form.title) {
            (self.dialogs.alert)(&e.to_string());
            return Task::none();
        }

        let Some(id) = self.session.current_id().map(str::to_owned) else {
            (self.dialogs.alert)(&error::PublishError::NoCurrentDraft.to_string());
            return Task::none();
        };

        // Local state and the published document must agree
        let _ = self.save(true);

        let stored = DraftStore::new(&self.storage).find(&id);
        let request =
            match publish::prepare(&self.endpoint, &id, &self.form, stored.as_ref(), Utc::now()) {
                Ok(request) => request,
                Err(e) => {
                    (self.dialogs.alert)(&e.to_string());
                    return Task::none();
                }
            };

        self.publish_status = Some(PublishStatus::Sending);
        Task::perform(publish::send(request), |result| {
            Message::PublishFinished(result.map_err(|e| e.to_string()))
        })
    }

    /// Push form values into the widgets that keep their own copy
    fn sync_from_form(&mut self) -> Task<Message> {
        self.editor = text_editor::Content::with_text(&self.form.content);
        self.refresh_list();
        self.refresh_preview()
    }

    /// Rebuild the preview from the image field. Remote images show as a
    /// link until their bytes arrive.
    fn refresh_preview(&mut self) -> Task<Message> {
        let preview = Preview::from_field(&self.form.image);
        let fetch = preview.fetchable_url().map(str::to_owned);
        self.preview = preview.into();

        match fetch {
            Some(url) => Task::perform(preview::fetch_remote(url.clone()), move |result| {
                Message::RemotePreviewLoaded(url.clone(), result.map_err(|e| e.to_string()))
            }),
            None => Task::none(),
        }
    }

    fn refresh_list(&mut self) {
        self.drafts = DraftStore::new(&self.storage).list_recent();
    }

    fn editor_text(&self) -> String {
        strip_appended_newline(self.editor.text(), self.editor.line_count())
    }

    fn report(&mut self, context: &str, error: error::StoreError) {
        tracing::error!("{}: {}", context, error);
        self.notice = Some(format!("{}: {}", context, error));
    }

    fn is_narrow(&self) -> bool {
        self.window_width <= NARROW_WINDOW_WIDTH
    }

    fn dismiss_overlay(&mut self) {
        if self.is_narrow() {
            self.sidebar_open = false;
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let current = self.session.current_id();

        if !self.is_narrow() {
            return row![
                ui::sidebar::view(&self.drafts, current, &self.endpoint, Length::Fixed(260.0)),
                ui::form::view(self),
            ]
            .into();
        }

        if self.sidebar_open {
            ui::sidebar::view(&self.drafts, current, &self.endpoint, Length::Fill)
        } else {
            ui::form::view(self)
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(handle_event)
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn handle_event(event: Event, _status: event::Status, _window: window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) => {
            match key.as_ref() {
                keyboard::Key::Character("s") if modifiers.command() => Some(Message::Save),
                _ => None,
            }
        }
        Event::Window(window::Event::Resized(size)) => Some(Message::WindowResized(size.width)),
        _ => None,
    }
}

/// Drop the newline the editor appends to its text.
///
/// The buffer reports `line_count` lines and only adds a newline of its own
/// when the last line is not already empty, so one is extra exactly when
/// the text holds as many newlines as lines.
fn strip_appended_newline(mut text: String, line_count: usize) -> String {
    if text.ends_with('\n') && text.matches('\n').count() == line_count {
        text.pop();
    }
    text
}

fn confirm_delete() -> bool {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Delete draft")
        .set_description("Delete this draft? This cannot be undone.")
        .set_buttons(MessageButtons::YesNo)
        .show()
        == MessageDialogResult::Yes
}

fn alert(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Cannot publish")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn main() -> iced::Result {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("draft_writer=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // The app cannot function without its storage
    let storage = match AppConfig::from_env().and_then(|config| LocalStorage::open(config.db_path())) {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!("Failed to open draft storage: {}", e);
            std::process::exit(1);
        }
    };

    iced::application("Draft Writer", DraftWriter::update, DraftWriter::view)
        .subscription(DraftWriter::subscription)
        .theme(DraftWriter::theme)
        .centered()
        .run_with(move || DraftWriter::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::widget::text_editor::{Action, Edit};

    fn quiet_dialogs() -> Dialogs {
        Dialogs {
            alert: |_: &str| {},
            confirm_delete: || true,
        }
    }

    fn app() -> DraftWriter {
        let storage = LocalStorage::in_memory().unwrap();
        DraftWriter::with_dialogs(storage, quiet_dialogs()).0
    }

    fn current(app: &DraftWriter) -> Draft {
        let id = app.session.current_id().unwrap();
        DraftStore::new(&app.storage).find(id).unwrap()
    }

    #[test]
    fn test_metadata_edits_are_autosaved() {
        let mut app = app();

        let _ = app.update(Message::TitleChanged("Launch notes".to_string()));
        let _ = app.update(Message::TagsChanged("rust, gui".to_string()));
        let _ = app.update(Message::SlugChanged("launch-notes".to_string()));
        let _ = app.update(Message::CategoryChanged("news".to_string()));
        let _ = app.update(Message::ImageChanged("cover.png".to_string()));

        let stored = current(&app);
        assert_eq!(stored.title, "Launch notes");
        assert_eq!(stored.tags, "rust, gui");
        assert_eq!(stored.slug, "launch-notes");
        assert_eq!(stored.category, "news");
        assert_eq!(stored.image, "cover.png");
        assert_eq!(app.drafts[0].title, "Launch notes");
    }

    #[test]
    fn test_editor_edit_is_autosaved() {
        let mut app = app();

        let _ = app.update(Message::EditorAction(Action::Edit(Edit::Insert('x'))));

        assert_eq!(current(&app).content, "x");
    }

    #[test]
    fn test_clear_image_empties_stored_field() {
        let mut app = app();
        let _ = app.update(Message::ImageChanged("cover.png".to_string()));

        let _ = app.update(Message::ClearImage);

        assert_eq!(current(&app).image, "");
        assert!(matches!(app.preview, PreviewView::Hidden));
    }

    #[test]
    fn test_publish_without_title_sends_nothing() {
        let mut app = app();
        let _ = app.update(Message::EndpointChanged("http://127.0.0.1:9/hook".to_string()));

        let _ = app.update(Message::Publish);

        assert_eq!(app.publish_status, None);
    }

    #[test]
    fn test_publish_without_endpoint_sends_nothing() {
        let mut app = app();
        let _ = app.update(Message::TitleChanged("Ready".to_string()));

        let _ = app.update(Message::Publish);

        assert_eq!(app.publish_status, None);
    }

    #[test]
    fn test_valid_publish_starts_sending() {
        let mut app = app();
        let _ = app.update(Message::EndpointChanged("http://127.0.0.1:9/hook".to_string()));
        let _ = app.update(Message::TitleChanged("Ready".to_string()));

        let _ = app.update(Message::Publish);

        assert_eq!(app.publish_status, Some(PublishStatus::Sending));
    }

    #[tokio::test]
    async fn test_explicit_save_does_not_pin_publish_status() {
        let mut app = app();

        let _ = app.update(Message::PublishFinished(Ok(())));
        let generation = app.publish_generation;
        let _ = app.update(Message::Save);
        let _ = app.update(Message::PublishStatusExpired(generation));

        assert_eq!(app.publish_status, None);
        assert!(app.save_ack.is_some());
    }

    #[tokio::test]
    async fn test_stale_publish_timer_is_ignored() {
        let mut app = app();

        let _ = app.update(Message::PublishFinished(Ok(())));
        let stale = app.publish_generation;
        let _ = app.update(Message::PublishFinished(Ok(())));
        let _ = app.update(Message::PublishStatusExpired(stale));

        assert_eq!(app.publish_status, Some(PublishStatus::Sent));
    }

    #[test]
    fn test_remote_preview_shows_fetched_image() {
        let mut app = app();
        let url = "https://example.com/cover.png".to_string();
        let _ = app.update(Message::ImageChanged(url.clone()));
        assert!(matches!(app.preview, PreviewView::Link(_)));

        let _ = app.update(Message::RemotePreviewLoaded(url, Ok(vec![0x89, b'P', b'N', b'G'])));

        assert!(matches!(app.preview, PreviewView::Picture(_)));
    }

    #[test]
    fn test_stale_remote_preview_is_ignored() {
        let mut app = app();
        let _ = app.update(Message::ImageChanged("https://example.com/old.png".to_string()));
        let _ = app.update(Message::ImageChanged("https://example.com/new.png".to_string()));

        let _ = app.update(Message::RemotePreviewLoaded(
            "https://example.com/old.png".to_string(),
            Ok(vec![1, 2, 3]),
        ));

        assert!(matches!(app.preview, PreviewView::Link(ref url) if url == "https://example.com/new.png"));
    }

    #[test]
    fn test_failed_remote_preview_keeps_link() {
        let mut app = app();
        let url = "https://example.com/cover.png".to_string();
        let _ = app.update(Message::ImageChanged(url.clone()));

        let _ = app.update(Message::RemotePreviewLoaded(url, Err("404".to_string())));

        assert!(matches!(app.preview, PreviewView::Link(_)));
    }

    #[test]
    fn test_deleting_current_draft_closes_narrow_sidebar() {
        let mut app = app();
        let first = app.session.current_id().unwrap().to_string();
        let _ = app.update(Message::NewDraft);
        let second = app.session.current_id().unwrap().to_string();

        let _ = app.update(Message::WindowResized(500.0));
        let _ = app.update(Message::ToggleSidebar);
        assert!(app.sidebar_open);

        let _ = app.update(Message::DeleteDraft(second));

        assert_eq!(app.session.current_id(), Some(first.as_str()));
        assert!(!app.sidebar_open);
    }

    #[test]
    fn test_deleting_last_draft_closes_narrow_sidebar() {
        let mut app = app();
        let only = app.session.current_id().unwrap().to_string();
        let _ = app.update(Message::WindowResized(500.0));
        let _ = app.update(Message::ToggleSidebar);

        let _ = app.update(Message::DeleteDraft(only.clone()));

        assert_ne!(app.session.current_id(), Some(only.as_str()));
        assert!(!app.sidebar_open);
    }

    #[test]
    fn test_appended_newline_is_stripped() {
        assert_eq!(strip_appended_newline("body\n".to_string(), 1), "body");
        assert_eq!(strip_appended_newline("\n".to_string(), 1), "");
    }

    #[test]
    fn test_trailing_blank_line_is_kept() {
        // "body\n" as typed: two lines, the second empty
        assert_eq!(strip_appended_newline("body\n".to_string(), 2), "body\n");
        assert_eq!(strip_appended_newline("a\n\n".to_string(), 3), "a\n\n");
    }

    #[test]
    fn test_body_ending_in_blank_line_survives_reload() {
        let mut app = app();
        app.editor = text_editor::Content::with_text("first line\n");

        let _ = app.save(true);
        let id = app.session.current_id().unwrap().to_string();
        let _ = app.update(Message::SelectDraft(id));

        assert_eq!(current(&app).content, "first line\n");
        assert_eq!(app.editor_text(), "first line\n");
    }
}
