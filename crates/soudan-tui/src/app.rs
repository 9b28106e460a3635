//! Application state and update logic for the soudan TUI.

use crossterm::event::{KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

use crate::controller::ChatController;
use crate::event::{key_to_action, Action};
use crate::text::MarkdownStyles;
use crate::theme::Theme;
use crate::transcript::{TranscriptWidget, SCROLL_SPEED};
use crate::widgets::{hints_for_state, phase_status, FooterHints, InputBar};

/// Input bar height, borders included.
const INPUT_HEIGHT: u16 = 5;

/// Main application state.
pub struct App {
    /// Chat state and request lifecycle.
    pub controller: ChatController,
    pub theme: Theme,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Animation frame counter.
    pub tick: u64,
    /// Transcript rows visible at the last draw, used as the page size.
    page_rows: usize,
}

impl App {
    /// Create the app with an uninitialized controller.
    pub fn new(theme: Theme) -> Self {
        let controller = ChatController::new(MarkdownStyles::from_theme(&theme));
        Self {
            controller,
            theme,
            should_quit: false,
            tick: 0,
            page_rows: 10,
        }
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        self.handle_action(key_to_action(key));
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.controller.transcript_mut().scroll_up(SCROLL_SPEED),
            MouseEventKind::ScrollDown => {
                self.controller.transcript_mut().scroll_down(SCROLL_SPEED);
            }
            _ => {}
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::Submit => {
                self.controller.submit();
            }
            Action::PageUp => {
                let rows = self.page_rows.max(1);
                self.controller.transcript_mut().scroll_up(rows);
            }
            Action::PageDown => {
                let rows = self.page_rows.max(1);
                self.controller.transcript_mut().scroll_down(rows);
            }
            edit if edit.is_edit() => self.edit(edit),
            _ => {}
        }
    }

    /// Apply an editing action. Ignored while the form is disabled.
    fn edit(&mut self, action: Action) {
        let Some(input) = self.controller.form_mut().input_mut() else {
            return;
        };
        // History recall only on single-line input
        let single_line = !input.content().contains('\n');

        match action {
            Action::Insert(ch) => input.insert(ch),
            Action::Newline => input.insert('\n'),
            Action::Backspace => input.backspace(),
            Action::Delete => input.delete(),
            Action::Left => input.move_left(),
            Action::Right => input.move_right(),
            Action::Home => input.move_home(),
            Action::End => input.move_end(),
            Action::HistoryPrev if single_line => input.history_prev(),
            Action::HistoryNext if single_line => input.history_next(),
            _ => {}
        }
    }

    /// Draw the transcript, input bar and footer.
    pub fn draw(&mut self, frame: &mut Frame) {
        let [transcript_area, input_area, footer_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let (total_rows, visible_rows) =
            TranscriptWidget::new(self.controller.transcript(), &self.theme).viewport(transcript_area);
        self.page_rows = visible_rows;
        self.controller
            .transcript_mut()
            .set_viewport(total_rows, visible_rows);

        let form = self.controller.form();
        let status = phase_status(self.controller.phase());
        let hints = hints_for_state(form.is_disabled());

        frame.render_widget(
            TranscriptWidget::new(self.controller.transcript(), &self.theme).tick(self.tick),
            transcript_area,
        );
        frame.render_widget(
            InputBar::new(form, &self.theme).waiting(waiting_text(&self.controller)),
            input_area,
        );
        frame.render_widget(
            FooterHints::new(&hints, &self.theme).status(status),
            footer_area,
        );
    }
}

fn waiting_text(controller: &ChatController) -> &'static str {
    if controller.has_session() {
        "返信を待っています…"
    } else {
        "利用できません"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{buffer_to_string, create_test_terminal, ScriptedService, ScriptedSession};
    use crate::transcript::Role;
    use crossterm::event::{KeyCode, KeyModifiers};
    use soudan_engine::Config;
    use std::sync::Arc;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    async fn ready_app(replies: Vec<crate::test_utils::Script>) -> (App, Arc<ScriptedSession>) {
        let session = ScriptedSession::new(replies);
        let service = ScriptedService::new(Arc::clone(&session));
        let mut app = App::new(Theme::default());
        let config = Config {
            api_key: Some("k".into()),
            ..Config::default()
        };
        app.controller.initialize(&config, &service).unwrap();
        app.controller.run_until_idle().await;
        (app, session)
    }

    #[test]
    fn test_quit_action() {
        let mut app = App::new(Theme::default());
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[test]
    fn test_tick_wraps() {
        let mut app = App::new(Theme::default());
        app.tick = u64::MAX;
        app.tick();
        assert_eq!(app.tick, 0);
    }

    #[tokio::test]
    async fn test_typing_and_enter_sends() {
        let (mut app, session) = ready_app(vec![vec![], vec![Ok("hello back".into())]]).await;

        type_str(&mut app, "hi there");
        press(&mut app, KeyCode::Enter);
        assert!(app.controller.form().is_disabled());

        // Typing while disabled is dropped
        type_str(&mut app, "x");
        assert!(app.controller.form().input().is_empty());

        app.controller.run_until_idle().await;
        assert_eq!(session.prompts().last().map(String::as_str), Some("hi there"));
        assert!(!app.controller.form().is_disabled());
    }

    #[tokio::test]
    async fn test_history_recall() {
        let (mut app, _session) = ready_app(vec![vec![], vec![]]).await;

        type_str(&mut app, "first");
        press(&mut app, KeyCode::Enter);
        app.controller.run_until_idle().await;

        press(&mut app, KeyCode::Up);
        assert_eq!(app.controller.form().input().content(), "first");
        press(&mut app, KeyCode::Down);
        assert!(app.controller.form().input().is_empty());
    }

    #[tokio::test]
    async fn test_draw_renders_all_regions() {
        let (mut app, _session) = ready_app(vec![vec![Ok("welcome aboard".into())]]).await;

        let mut terminal = create_test_terminal();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let content = buffer_to_string(terminal.backend().buffer());

        assert!(content.contains("welcome aboard"));
        assert!(content.contains("[Esc] quit"));
        assert!(content.contains("> "));
        assert_eq!(app.page_rows, 24 - 5 - 1 - 2);
    }

    #[test]
    fn test_draw_without_session_shows_unavailable() {
        let session = ScriptedSession::new(vec![]);
        let service = ScriptedService::new(session);
        let mut app = App::new(Theme::default());
        let config = Config {
            api_key: None,
            ..Config::default()
        };
        assert!(app.controller.initialize(&config, &service).is_err());

        let mut terminal = create_test_terminal();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let content = buffer_to_string(terminal.backend().buffer());
        assert!(content.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_page_keys_scroll_transcript() {
        let (mut app, _session) = ready_app(vec![vec![]]).await;
        for i in 0..20 {
            app.controller
                .transcript_mut()
                .display_message(Role::User, &format!("note-{i}"), false);
        }
        let mut terminal = create_test_terminal();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        app.page_rows = 7;

        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.controller.transcript().scroll_from_bottom(), 7);
        assert!(!app.controller.transcript().is_following());
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.controller.transcript().scroll_from_bottom(), 0);
        assert!(app.controller.transcript().is_following());
    }

    #[tokio::test]
    async fn test_page_up_past_top_is_clamped() {
        let (mut app, _session) = ready_app(vec![vec![]]).await;
        for i in 0..20 {
            app.controller
                .transcript_mut()
                .display_message(Role::User, &format!("note-{i}"), false);
        }
        let mut terminal = create_test_terminal();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        for _ in 0..30 {
            press(&mut app, KeyCode::PageUp);
        }
        assert_eq!(app.controller.transcript().scroll_offset(), 0);

        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.controller.transcript().scroll_offset(), app.page_rows);
    }
}
