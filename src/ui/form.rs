use iced::widget::{
    button, column, horizontal_space, row, text, text_editor, text_input, Column,
};
use iced::widget::image::Handle;
use iced::{Alignment, Element, Length};

use crate::media::preview::Preview;
use crate::{DraftWriter, Message, PublishStatus};

/// Widget id of the title field, focused after a new draft is created
pub fn title_input_id() -> text_input::Id {
    text_input::Id::new("post-title")
}

/// Renderable form of [`Preview`]; the image handle is built once per
/// change of the image field, not once per frame.
#[derive(Debug, Clone)]
pub enum PreviewView {
    Hidden,
    Picture(Handle),
    Link(String),
}

impl From<Preview> for PreviewView {
    fn from(preview: Preview) -> Self {
        match preview {
            Preview::Hidden => PreviewView::Hidden,
            Preview::Embedded(bytes) => PreviewView::Picture(Handle::from_bytes(bytes)),
            Preview::Remote(url) => PreviewView::Link(url),
        }
    }
}

pub fn view(app: &DraftWriter) -> Element<'_, Message> {
    let form = &app.form;

    let mut content = Column::new()
        .spacing(12)
        .padding(16)
        .push(toolbar(app))
        .push(
            text_input("Title", &form.title)
                .id(title_input_id())
                .on_input(Message::TitleChanged)
                .size(22),
        )
        .push(
            row![
                text_input("Tags (comma separated)", &form.tags).on_input(Message::TagsChanged),
                text_input("Category", &form.category).on_input(Message::CategoryChanged),
            ]
            .spacing(8),
        )
        .push(text_input("Slug (defaults to the draft id)", &form.slug).on_input(Message::SlugChanged))
        .push(
            row![
                text_input("Hero image URL", &form.image).on_input(Message::ImageChanged),
                button(text("Upload…")).on_press(Message::PickImage),
            ]
            .spacing(8)
            .align_y(Alignment::Center),
        );

    if let Some(preview) = preview(&app.preview) {
        content = content.push(preview);
    }

    if let Some(notice) = &app.notice {
        content = content.push(text(notice.as_str()).size(13).style(text::danger));
    }

    content
        .push(
            text_editor(&app.editor)
                .placeholder("Start writing…")
                .on_action(Message::EditorAction)
                .height(Length::Fill),
        )
        .width(Length::Fill)
        .into()
}

fn toolbar(app: &DraftWriter) -> Element<'_, Message> {
    let mut bar = row![].spacing(8).align_y(Alignment::Center);

    if app.is_narrow() {
        bar = bar.push(button(text("☰ Drafts")).on_press(Message::ToggleSidebar));
    }

    bar = bar.push(horizontal_space());

    if let Some(status) = &app.publish_status {
        let label = match status {
            PublishStatus::Sending => text("⏳ Sending…"),
            PublishStatus::Sent => text("✅ Request sent").style(text::success),
            PublishStatus::Failed => text("❌ Send failed").style(text::danger),
        };
        bar = bar.push(label.size(14));
    }

    let save_label = if app.save_ack.is_some() {
        "✅ Saved"
    } else {
        "Save"
    };

    bar.push(button(text(save_label)).on_press(Message::Save).style(button::secondary))
        .push(button(text("Publish")).on_press(Message::Publish))
        .into()
}

fn preview(view: &PreviewView) -> Option<Element<'_, Message>> {
    let clear = button(text("Clear image"))
        .on_press(Message::ClearImage)
        .style(button::danger);

    let shown: Element<'_, Message> = match view {
        PreviewView::Hidden => return None,
        PreviewView::Picture(handle) => iced::widget::image(handle.clone())
            .height(Length::Fixed(160.0))
            .into(),
        PreviewView::Link(url) => text(url.as_str()).size(12).into(),
    };

    Some(column![shown, clear].spacing(6).into())
}
