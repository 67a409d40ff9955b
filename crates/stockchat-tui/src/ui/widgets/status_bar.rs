//! Status bar widget.

use crate::ui::theme::{Palette, Styles};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Widget,
};

/// A key hint for the status bar.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub label: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, label: &'static str) -> Self {
        Self { key, label }
    }
}

/// Status bar widget displayed at the bottom of the screen.
#[derive(Debug, Clone)]
pub struct StatusBar<'a> {
    mode: &'a str,
    hints: Vec<KeyHint>,
    right: Option<(&'a str, Style)>,
}

impl<'a> StatusBar<'a> {
    /// Create a new status bar.
    pub fn new(mode: &'a str) -> Self {
        Self {
            mode,
            hints: Vec::new(),
            right: None,
        }
    }

    /// Add key hints.
    #[must_use]
    pub fn hints(mut self, hints: Vec<KeyHint>) -> Self {
        self.hints = hints;
        self
    }

    /// Set right-aligned text.
    #[must_use]
    pub fn right(mut self, text: &'a str) -> Self {
        self.right = Some((text, Styles::status_bar()));
        self
    }

    /// Set right-aligned text drawn with a warning color.
    #[must_use]
    pub fn right_warning(mut self, text: &'a str) -> Self {
        self.right = Some((text, Styles::status_bar().fg(Palette::WARNING)));
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        buf.set_style(
            Rect::new(area.x, area.y, area.width, 1),
            Styles::status_bar(),
        );

        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.mode),
                Style::default().bg(Palette::ACCENT).fg(Palette::BG),
            ),
            Span::styled(" ", Styles::status_bar()),
        ];
        for hint in &self.hints {
            spans.push(Span::styled(format!(" {} ", hint.key), Styles::key_hint()));
            spans.push(Span::styled(format!(" {} ", hint.label), Styles::key_label()));
        }
        let left = Line::from(spans);
        let (_, left_end) = buf.set_line(area.x, area.y, &left, area.width);

        if let Some((text, style)) = self.right {
            let len = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
            let right_edge = area.x + area.width;
            // Only draw when it fits after the hints with a one-cell gap.
            if len.saturating_add(1) < area.width {
                let x = right_edge - len - 1;
                if x > left_end {
                    buf.set_string(x, area.y, text, style);
                }
            }
        }
    }
}
