//! soudan-tui: Terminal chat widget for soudan
//!
//! This crate provides the interactive layer:
//! - The chat controller (request lifecycle and follow-up)
//! - Transcript rendering with markdown conversion
//! - The message form and key handling
//! - The terminal event loop

mod app;
pub mod controller;
mod event;
pub mod form;
#[cfg(test)]
pub mod test_utils;
pub mod text;
pub mod theme;
pub mod transcript;
mod widgets;

pub use app::App;
pub use controller::{ChatController, ControllerEvent, InitError, RequestPhase};
pub use event::{Action, Event, EventHandler};
pub use soudan_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use soudan_engine::{Config, GeminiService};
use std::io::{self, stdout};

use crate::theme::Theme;

/// Tick interval for animations (4 Hz).
const TICK_RATE_MS: u64 = 250;

/// RAII guard for terminal state restoration.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableMouseCapture, LeaveAlternateScreen, ShowCursor);
    }
}

/// Run the chat widget until the user quits.
///
/// Sets up the terminal, initializes the conversation, runs the event loop,
/// and restores the terminal on exit. A missing credential is not an error
/// here: the widget opens in its disabled state and shows the message.
pub async fn run_tui(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Theme::resolve(&config.theme));
    let service = GeminiService::new(config.base_url.clone());
    if let Err(err) = app.controller.initialize(&config, &service) {
        tracing::warn!(error = %err, "chat widget started disabled");
    }

    let mut events = EventHandler::new(TICK_RATE_MS);
    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    app.controller.dispose();
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| app.draw(frame))?;

        tokio::select! {
            Some(event) = events.next() => match event {
                Event::Key(key) => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Tick => app.tick(),
                Event::Resize(_, _) => {}
            },
            Some(event) = app.controller.next_event() => {
                app.controller.handle_event(event);
            }
            else => break,
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
