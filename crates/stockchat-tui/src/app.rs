//! Application state and update logic for the chat TUI.

use crate::event::Action;
use crate::ui::widgets::TextInputState;
use std::cell::Cell;
use stockchat_engine::{Conversation, Dispatcher, PendingQuery, QueryError, QueryResponse};

/// Lines moved by PageUp/PageDown.
const PAGE_LINES: usize = 10;

/// The current screen being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Chat,
    QuitConfirm,
}

/// Application state.
#[derive(Debug)]
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Whether the help overlay is visible.
    pub show_help: bool,

    /// Current screen.
    pub screen: Screen,

    /// Conversation and busy flag.
    pub dispatcher: Dispatcher,

    /// Text input state for the chat input.
    pub input_state: TextInputState,

    /// How far the transcript is scrolled up from the newest line.
    /// Zero follows the latest message.
    pub scroll_from_bottom: usize,

    /// Largest useful `scroll_from_bottom`, recorded by the last transcript
    /// draw. Unbounded until the first draw.
    pub scroll_limit: Cell<usize>,

    /// Endpoint shown in the status bar.
    pub endpoint: String,

    /// Tick counter for animations.
    pub tick: usize,
}

impl App {
    /// Create a new app instance talking to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            show_help: false,
            screen: Screen::Chat,
            dispatcher: Dispatcher::new(),
            input_state: TextInputState::new(),
            scroll_from_bottom: 0,
            scroll_limit: Cell::new(usize::MAX),
            endpoint: endpoint.into(),
            tick: 0,
        }
    }

    /// The conversation so far.
    pub fn conversation(&self) -> &Conversation {
        self.dispatcher.conversation()
    }

    /// Whether a request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.dispatcher.is_busy()
    }

    /// Submit the current input.
    ///
    /// Returns the query to send, or `None` when the input is blank or a
    /// request is already outstanding. The input is only cleared when the
    /// submission is accepted.
    pub fn submit_input(&mut self) -> Option<PendingQuery> {
        let pending = self.dispatcher.begin(self.input_state.content())?;
        self.input_state.submit();
        self.scroll_from_bottom = 0;
        Some(pending)
    }

    /// Record the outcome of the outstanding request.
    pub fn settle(&mut self, outcome: Result<QueryResponse, QueryError>) {
        self.dispatcher.settle(outcome);
        self.scroll_from_bottom = 0;
    }

    /// Advance animations.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    /// Handle an action.
    pub fn handle_action(&mut self, action: Action) {
        // Global actions
        match action {
            Action::Quit => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                return;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return;
            }
            _ => {}
        }

        // If help is showing, any key closes it
        if self.show_help {
            self.show_help = false;
            return;
        }

        match self.screen {
            Screen::Chat => self.handle_chat_action(action),
            Screen::QuitConfirm => self.handle_quit_confirm_action(action),
        }
    }

    fn handle_chat_action(&mut self, action: Action) {
        match action {
            Action::Back => self.screen = Screen::QuitConfirm,
            Action::Up => self.scroll_up(1),
            Action::Down => self.scroll_down(1),
            Action::PageUp => self.scroll_up(PAGE_LINES),
            Action::PageDown => self.scroll_down(PAGE_LINES),
            _ => {}
        }
    }

    fn handle_quit_confirm_action(&mut self, action: Action) {
        match action {
            Action::Select => self.should_quit = true,
            Action::Back => self.screen = Screen::Chat,
            _ => {}
        }
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_from_bottom = self
            .scroll_from_bottom
            .saturating_add(lines)
            .min(self.scroll_limit.get());
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_from_bottom = self
            .scroll_from_bottom
            .min(self.scroll_limit.get())
            .saturating_sub(lines);
    }
}
