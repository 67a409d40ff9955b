//! Chat screen - the transcript, the input line and the quit overlay.

use crate::app::App;
use crate::screens::Screen;
use crate::ui::theme::{spinner_frame, Styles};
use crate::ui::widgets::{KeyHint, StatusBar};
use crate::ui::{centered_fixed, chat_layout, main_layout};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};
use textwrap::core::display_width;

/// Window title.
pub const TITLE: &str = "Stock Data Chat";

/// Placeholder shown in the empty input.
pub const INPUT_PLACEHOLDER: &str = "Ask a question about stock data...";

/// The chat screen.
pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (main_area, status_area) = main_layout(area);
        let (title_area, transcript_area, input_area) = chat_layout(main_area);

        Paragraph::new(Line::from(Span::styled(TITLE, Styles::title())))
            .alignment(Alignment::Center)
            .style(Styles::default())
            .render(title_area, buf);

        render_transcript(app, transcript_area, buf);
        render_input(app, input_area, buf);

        let hints = vec![
            KeyHint::new("Enter", "Send"),
            KeyHint::new("F1", "Help"),
            KeyHint::new("Esc", "Quit"),
        ];
        let status_bar = StatusBar::new("Chat").hints(hints);
        let status_bar = if app.is_busy() {
            status_bar.right_warning("waiting for response")
        } else {
            status_bar.right(&app.endpoint)
        };
        status_bar.render(status_area, buf);
    }
}

/// Build the transcript as display lines for the given inner width.
///
/// Each message is wrapped to at most four fifths of the width and drawn as
/// a padded bubble: user messages on the right, system messages on the
/// left, a blank line between messages.
pub(crate) fn transcript_lines(app: &App, width: u16) -> Vec<Line<'static>> {
    let bubble_width = usize::from(width) * 4 / 5;
    let text_width = bubble_width.saturating_sub(2).max(1);
    let mut lines = Vec::new();

    for message in app.conversation() {
        let (style, alignment) = if message.is_user {
            (Styles::user_message(), Alignment::Right)
        } else {
            (Styles::system_message(), Alignment::Left)
        };

        let wrapped = textwrap::wrap(&message.content, text_width);
        let widest = wrapped.iter().map(|l| display_width(l)).max().unwrap_or(0);
        for line in &wrapped {
            let pad = widest - display_width(line);
            let text = format!(" {line}{} ", " ".repeat(pad));
            lines.push(Line::from(Span::styled(text, style)).alignment(alignment));
        }
        lines.push(Line::default());
    }

    if app.is_busy() {
        lines.push(
            Line::from(Span::styled(
                format!("{} Thinking...", spinner_frame(app.tick)),
                Styles::dim(),
            ))
            .alignment(Alignment::Center),
        );
    }

    lines
}

fn render_transcript(app: &App, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::border())
        .style(Styles::default());

    let inner = block.inner(area);
    block.render(area, buf);

    if app.conversation().is_empty() && !app.is_busy() {
        app.scroll_limit.set(0);
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Ask about prices, volumes or trends in the stock data.",
                Styles::dim(),
            )),
            Line::from(Span::styled(
                "Example: \"What was the highest price for each stock?\"",
                Styles::dim(),
            )),
        ])
        .alignment(Alignment::Center)
        .style(Styles::default());
        hint.render(inner, buf);
        return;
    }

    let lines = transcript_lines(app, inner.width);
    let height = usize::from(inner.height);
    let max_offset = lines.len().saturating_sub(height);
    app.scroll_limit.set(max_offset);
    let offset = max_offset - app.scroll_from_bottom.min(max_offset);

    let visible: Vec<Line<'_>> = lines.into_iter().skip(offset).take(height).collect();
    Paragraph::new(visible)
        .style(Styles::default())
        .render(inner, buf);
}

fn render_input(app: &App, area: Rect, buf: &mut Buffer) {
    let busy = app.is_busy();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if busy {
            Styles::dim()
        } else {
            Styles::border_active()
        })
        .style(Styles::default());

    let inner = block.inner(area);
    block.render(area, buf);

    app.input_state
        .widget()
        .focused(!busy)
        .placeholder(INPUT_PLACEHOLDER)
        .render(inner, buf);
}

/// Quit confirmation overlay.
pub struct QuitConfirmScreen;

impl Screen for QuitConfirmScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        ChatScreen.render(app, area, buf);

        let width = 44.min(area.width.saturating_sub(4));
        let height = 8.min(area.height.saturating_sub(4));
        let overlay_area = centered_fixed(width, height, area);

        Clear.render(overlay_area, buf);

        let block = Block::default()
            .title(" Quit ")
            .title_style(Styles::title())
            .borders(Borders::ALL)
            .border_style(Styles::border_active())
            .style(Styles::default());

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled("  Leave the chat?", Styles::default())),
        ];
        if app.is_busy() {
            lines.push(Line::from(Span::styled(
                "  A request is still outstanding.",
                Styles::warning(),
            )));
        } else {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  ", Styles::default()),
            Span::styled("[Enter]", Styles::key_hint()),
            Span::styled(" Quit   ", Styles::default()),
            Span::styled("[Esc]", Styles::key_hint()),
            Span::styled(" Cancel", Styles::default()),
        ]));

        Paragraph::new(lines)
            .block(block)
            .style(Styles::default())
            .render(overlay_area, buf);
    }
}
