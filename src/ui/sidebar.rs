use chrono::Local;
use iced::widget::{button, column, row, scrollable, text, text_input, Column};
use iced::{Alignment, Element, Length, Theme};

use crate::state::data::Draft;
use crate::Message;

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

/// Draft list with the endpoint setting underneath
///
/// `drafts` is expected in display order (most recent first).
pub fn view<'a>(
    drafts: &'a [Draft],
    current: Option<&str>,
    endpoint: &'a str,
    width: Length,
) -> Element<'a, Message> {
    let items = drafts.iter().fold(Column::new().spacing(4), |list, draft| {
        list.push(item(draft, current == Some(draft.id.as_str())))
    });

    column![
        button(text("+ New draft"))
            .on_press(Message::NewDraft)
            .width(Length::Fill)
            .padding(8),
        scrollable(items).height(Length::Fill),
        text("Publish endpoint").size(12),
        text_input("https://script.google.com/...", endpoint)
            .on_input(Message::EndpointChanged)
            .size(12),
    ]
    .spacing(12)
    .padding(12)
    .width(width)
    .into()
}

fn item(draft: &Draft, active: bool) -> Element<'_, Message> {
    let updated = draft
        .updated_at
        .with_timezone(&Local)
        .format("%m/%d %H:%M")
        .to_string();

    let style: ButtonStyle = if active {
        button::primary
    } else {
        button::secondary
    };

    let select = button(
        column![text(draft.display_title()).size(15), text(updated).size(11)].spacing(2),
    )
    .on_press(Message::SelectDraft(draft.id.clone()))
    .width(Length::Fill)
    .style(style);

    let delete = button(text("×"))
        .on_press(Message::DeleteDraft(draft.id.clone()))
        .style(button::danger);

    row![select, delete]
        .spacing(4)
        .align_y(Alignment::Center)
        .into()
}
