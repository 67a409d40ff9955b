//! stockchat-tui: terminal chat front end for the stock data query service
//!
//! This crate provides the interactive layer on top of `stockchat-engine`:
//! - A chat screen with a scrollable transcript and single-line input
//! - Single-flight request dispatch running on the tokio runtime
//! - A quit confirmation overlay and a help overlay

mod app;
mod event;
mod screens;
#[cfg(test)]
pub mod test_utils;
mod ui;

use screens::Screen as ScreenTrait;

pub use app::{App, Screen};
pub use event::{Action, Event, EventHandler};
pub use stockchat_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use std::sync::Arc;
use stockchat_engine::{Config, HttpQueryClient, QueryClient, QueryError, QueryResponse};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Handle of the outstanding request, if any.
type InFlight = Option<JoinHandle<Result<QueryResponse, QueryError>>>;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the chat TUI against the backend named in `config`.
///
/// Sets up the terminal, runs the event loop and restores the terminal on
/// exit, including when the loop fails.
pub async fn run_tui(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpQueryClient::from_config(config)?;
    let endpoint = client.endpoint().to_string();
    info!(endpoint = %endpoint, "starting chat");
    let client: Arc<dyn QueryClient> = Arc::new(client);

    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(endpoint);

    // 4 Hz drives the spinner
    let mut events = EventHandler::new(250);

    let result = run_loop(&mut terminal, &mut app, &mut events, &client).await;

    terminal.show_cursor()?;
    info!(messages = app.conversation().len(), "chat closed");

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
    client: &Arc<dyn QueryClient>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut in_flight: InFlight = None;

    loop {
        terminal.draw(|frame| {
            let area = frame.area();
            let buf = frame.buffer_mut();

            match app.screen {
                Screen::Chat => screens::chat::ChatScreen.render(app, area, buf),
                Screen::QuitConfirm => screens::chat::QuitConfirmScreen.render(app, area, buf),
            }

            if app.show_help {
                screens::render_help_overlay(area, buf);
            }
        })?;

        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    let consumed = app.screen == Screen::Chat
                        && !app.show_help
                        && handle_chat_key(app, key, client, &mut in_flight);
                    if !consumed {
                        app.handle_action(event::key_to_action(key));
                    }
                }
                Event::Mouse(mouse) => {
                    use crossterm::event::MouseEventKind;
                    match mouse.kind {
                        MouseEventKind::ScrollUp => app.handle_action(Action::Up),
                        MouseEventKind::ScrollDown => app.handle_action(Action::Down),
                        _ => {}
                    }
                }
                Event::Tick => app.tick(),
                Event::Resize(_, _) => {}
            }
        }

        finish_request(app, &mut in_flight).await;

        if app.should_quit {
            if let Some(handle) = in_flight.take() {
                debug!("aborting outstanding request");
                handle.abort();
            }
            break;
        }
    }

    Ok(())
}

/// Settle the outstanding request once its task has finished.
async fn finish_request(app: &mut App, in_flight: &mut InFlight) {
    if !in_flight.as_ref().is_some_and(JoinHandle::is_finished) {
        return;
    }
    let Some(handle) = in_flight.take() else {
        return;
    };
    let outcome = match handle.await {
        Ok(outcome) => outcome,
        Err(e) => Err(QueryError::Interrupted(e.to_string())),
    };
    app.settle(outcome);
}

/// Handle a key on the chat screen.
/// Returns true if the key was consumed by the input.
fn handle_chat_key(
    app: &mut App,
    key: KeyEvent,
    client: &Arc<dyn QueryClient>,
    in_flight: &mut InFlight,
) -> bool {
    // Ctrl+C and friends go to the action handler
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    match key.code {
        KeyCode::Esc => false,

        KeyCode::Enter => {
            if let Some(pending) = app.submit_input() {
                let client = Arc::clone(client);
                *in_flight = Some(tokio::spawn(async move {
                    pending.send(client.as_ref()).await
                }));
            }
            true
        }

        // Typing is disabled while waiting
        KeyCode::Char(_) if app.is_busy() => true,
        KeyCode::Char(c) => {
            app.input_state.insert(c);
            true
        }
        KeyCode::Backspace => {
            app.input_state.backspace();
            true
        }
        KeyCode::Delete => {
            app.input_state.delete();
            true
        }
        KeyCode::Left => {
            app.input_state.move_left();
            true
        }
        KeyCode::Right => {
            app.input_state.move_right();
            true
        }
        KeyCode::Home => {
            app.input_state.move_home();
            true
        }
        KeyCode::End => {
            app.input_state.move_end();
            true
        }
        KeyCode::Up if can_recall_history(app) => {
            app.input_state.history_prev();
            true
        }
        KeyCode::Down if !app.is_busy() && app.input_state.is_browsing_history() => {
            app.input_state.history_next();
            true
        }

        _ => false,
    }
}

/// Up recalls history on an empty input or while already recalling.
/// With nothing to recall it scrolls the transcript instead.
fn can_recall_history(app: &App) -> bool {
    let input = &app.input_state;
    !app.is_busy()
        && input.has_history()
        && (input.is_empty() || input.is_browsing_history())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
