//! Test utilities for rendering screens into buffers.

use crate::app::App;
use crate::screens::Screen as ScreenTrait;
use ratatui::{buffer::Buffer, layout::Rect};
use stockchat_engine::{QueryError, QueryResponse};

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Endpoint label used by test apps.
pub const TEST_ENDPOINT: &str = "http://localhost:5001/api/query";

/// Create a test app with an empty conversation.
pub fn create_test_app() -> App {
    App::new(TEST_ENDPOINT)
}

/// Create a test app that has completed the given exchanges.
///
/// `None` as the answer settles that exchange as a failure.
pub fn create_test_app_with_exchanges(exchanges: &[(&str, Option<&str>)]) -> App {
    let mut app = create_test_app();
    for (question, answer) in exchanges {
        app.input_state.insert_str(question);
        app.submit_input().expect("test question must be accepted");
        let outcome = match answer {
            Some(summary) => Ok(QueryResponse::summary(*summary)),
            None => Err(QueryError::Status {
                status: 500,
                message: "Internal Server Error".into(),
            }),
        };
        app.settle(outcome);
    }
    app
}

/// Convert a buffer to a string, one line per row, trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut rows = Vec::with_capacity(usize::from(area.height));

    for y in area.y..area.y + area.height {
        let row: String = (area.x..area.x + area.width)
            .map(|x| buffer[(x, y)].symbol().to_string())
            .collect();
        rows.push(row.trim_end().to_string());
    }

    rows.join("\n")
}

/// Render a screen to a buffer and return it as a string.
pub fn render_screen_to_string<S: ScreenTrait>(screen: &S, app: &App) -> String {
    render_screen_to_string_sized(screen, app, TEST_WIDTH, TEST_HEIGHT)
}

/// Render a screen with custom dimensions and return it as a string.
pub fn render_screen_to_string_sized<S: ScreenTrait>(
    screen: &S,
    app: &App,
    width: u16,
    height: u16,
) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);
    screen.render(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }

    #[test]
    fn test_create_test_app_with_exchanges() {
        let app = create_test_app_with_exchanges(&[("q1", Some("a1")), ("q2", None)]);
        assert_eq!(app.conversation().len(), 4);
        assert!(!app.is_busy());
    }
}
