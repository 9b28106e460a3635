//! Message form state: the text input, its history, and the disabled flag.
//!
//! The form is disabled while a request is in flight. A disabled form
//! rejects edits and submissions but keeps whatever was typed.

/// Editable text with a cursor counted in characters.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    content: String,
    /// Cursor position (character index).
    cursor: usize,
    /// Previously submitted inputs, oldest first.
    history: Vec<String>,
    /// Position in `history` while browsing, counted from the newest.
    history_index: Option<usize>,
    /// Input saved when history browsing started.
    saved_input: String,
}

impl TextInputState {
    /// Create a new empty text input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(offset, _)| offset)
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert(offset, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert_str(offset, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let offset = self.byte_offset(self.cursor);
            self.content.remove(offset);
        }
    }

    /// Delete the character at the cursor (delete).
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let offset = self.byte_offset(self.cursor);
            self.content.remove(offset);
        }
    }

    /// Move cursor left.
    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    /// Move cursor to start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Take the content into history and clear.
    pub fn submit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.history_index = None;
        self.saved_input.clear();
        content
    }

    /// Navigate to previous history entry.
    pub fn history_prev(&mut self) {
        let next = self.history_index.map_or(0, |index| index + 1);
        if next >= self.history.len() {
            return;
        }
        if self.history_index.is_none() {
            self.saved_input = self.content.clone();
        }
        self.history_index = Some(next);
        self.content = self.history[self.history.len() - 1 - next].clone();
        self.move_end();
    }

    /// Navigate to next history entry, restoring the saved input at the end.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => return,
            Some(0) => {
                self.history_index = None;
                self.content = std::mem::take(&mut self.saved_input);
            }
            Some(index) => {
                self.history_index = Some(index - 1);
                self.content = self.history[self.history.len() - index].clone();
            }
        }
        self.move_end();
    }
}

/// The message form: input plus enabled state and focus.
#[derive(Debug, Clone)]
pub struct FormState {
    input: TextInputState,
    disabled: bool,
    focused: bool,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            input: TextInputState::new(),
            disabled: false,
            focused: true,
        }
    }
}

impl FormState {
    /// Create an enabled, focused, empty form.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &TextInputState {
        &self.input
    }

    /// Mutable access to the input. Edits are dropped while disabled.
    pub fn input_mut(&mut self) -> Option<&mut TextInputState> {
        if self.disabled {
            None
        } else {
            Some(&mut self.input)
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Enable or disable the input and submit control together.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.focused = false;
        }
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Move keyboard focus to the input. No-op while disabled.
    pub fn focus_input(&mut self) {
        if !self.disabled {
            self.focused = true;
        }
    }

    /// Take the trimmed input for sending.
    ///
    /// Returns `None` and leaves the input untouched when the form is
    /// disabled or the input is blank. Otherwise the input is cleared.
    pub fn take_submission(&mut self) -> Option<String> {
        if self.disabled {
            return None;
        }
        let trimmed = self.input.content().trim();
        if trimmed.is_empty() {
            return None;
        }
        let text = trimmed.to_string();
        self.input.submit();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_input_state_basic() {
        let mut state = TextInputState::new();
        assert!(state.is_empty());

        state.insert('H');
        state.insert('i');
        assert_eq!(state.content(), "Hi");
        assert_eq!(state.cursor(), 2);

        state.backspace();
        assert_eq!(state.content(), "H");

        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn test_text_input_multibyte_editing() {
        let mut state = TextInputState::new();
        state.insert_str("こんにちは");
        assert_eq!(state.cursor(), 5);

        state.move_left();
        state.move_left();
        state.insert('X');
        assert_eq!(state.content(), "こんにXちは");

        state.backspace();
        state.delete();
        assert_eq!(state.content(), "こんには");

        state.move_home();
        state.delete();
        assert_eq!(state.content(), "んには");

        state.move_end();
        assert_eq!(state.cursor(), 3);
    }

    #[test]
    fn test_text_input_state_history() {
        let mut state = TextInputState::new();

        state.insert_str("first");
        state.submit();
        state.insert_str("second");
        state.submit();

        state.insert_str("draft");
        state.history_prev();
        assert_eq!(state.content(), "second");
        state.history_prev();
        assert_eq!(state.content(), "first");
        state.history_prev();
        assert_eq!(state.content(), "first");

        state.history_next();
        assert_eq!(state.content(), "second");
        state.history_next();
        assert_eq!(state.content(), "draft");
    }

    #[test]
    fn test_take_submission_trims_and_clears() {
        let mut form = FormState::new();
        form.input_mut().unwrap().insert_str("  悩みがあります \n");
        assert_eq!(form.take_submission().as_deref(), Some("悩みがあります"));
        assert!(form.input().is_empty());
    }

    #[test]
    fn test_take_submission_blank_is_noop() {
        let mut form = FormState::new();
        form.input_mut().unwrap().insert_str("   ");
        assert_eq!(form.take_submission(), None);
        assert_eq!(form.input().content(), "   ");
    }

    #[test]
    fn test_disabled_form_rejects_edits_and_submit() {
        let mut form = FormState::new();
        form.input_mut().unwrap().insert_str("待って");
        form.set_disabled(true);

        assert!(form.input_mut().is_none());
        assert_eq!(form.take_submission(), None);
        assert_eq!(form.input().content(), "待って");
        assert!(!form.is_focused());

        form.focus_input();
        assert!(!form.is_focused());

        form.set_disabled(false);
        form.focus_input();
        assert!(form.is_focused());
        assert_eq!(form.take_submission().as_deref(), Some("待って"));
    }
}
