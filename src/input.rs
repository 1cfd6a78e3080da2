use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Contents of the on-screen input box.
///
/// Every edit produces the full text, which is what the session consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBox {
    text: String,
}

impl InputBox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn backspace(&mut self) -> bool {
        self.text.pop().is_some()
    }

    /// Remove trailing whitespace and then the word before it
    pub fn delete_word(&mut self) -> bool {
        let trimmed = self.text.trim_end_matches(char::is_whitespace);
        let cut = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(idx, c)| idx + c.len_utf8())
            .unwrap_or(0);
        let changed = cut != self.text.len();
        self.text.truncate(cut);
        changed
    }

    /// Apply an editing key. Returns true if the text changed.
    ///
    /// Keys with other modifiers than shift are left for the caller.
    pub fn apply_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('w') if ctrl => self.delete_word(),
            KeyCode::Backspace if ctrl || alt => self.delete_word(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c) if !ctrl && !alt => {
                self.push(c);
                true
            }
            KeyCode::Enter => {
                self.push('\n');
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_typing_appends() {
        let mut input = InputBox::new();
        assert!(input.apply_key(key(KeyCode::Char('h'))));
        assert!(input.apply_key(KeyEvent::new(KeyCode::Char('I'), KeyModifiers::SHIFT)));
        assert_eq!(input.as_str(), "hI");
    }

    #[test]
    fn test_backspace() {
        let mut input = InputBox::new();
        input.push('a');
        input.push('é');

        assert!(input.apply_key(key(KeyCode::Backspace)));
        assert_eq!(input.as_str(), "a");
        assert!(input.apply_key(key(KeyCode::Backspace)));
        assert!(!input.apply_key(key(KeyCode::Backspace)));
        assert_eq!(input.as_str(), "");
    }

    #[test]
    fn test_enter_is_a_newline() {
        let mut input = InputBox::new();
        assert!(input.apply_key(key(KeyCode::Enter)));
        assert_eq!(input.as_str(), "\n");
    }

    #[test]
    fn test_delete_word() {
        let mut input = InputBox::new();
        for c in "the quick fox  ".chars() {
            input.push(c);
        }

        assert!(input.apply_key(ctrl('w')));
        assert_eq!(input.as_str(), "the quick ");
        assert!(input.apply_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::CONTROL)));
        assert_eq!(input.as_str(), "the ");
        assert!(input.delete_word());
        assert_eq!(input.as_str(), "");
        assert!(!input.delete_word());
    }

    #[test]
    fn test_control_chords_are_not_text() {
        let mut input = InputBox::new();
        assert!(!input.apply_key(ctrl('r')));
        assert!(!input.apply_key(ctrl('c')));
        assert!(!input.apply_key(key(KeyCode::Tab)));
        assert!(!input.apply_key(key(KeyCode::Left)));
        assert_eq!(input.as_str(), "");
    }

    #[test]
    fn test_clear() {
        let mut input = InputBox::new();
        input.push('x');
        input.clear();
        assert_eq!(input, InputBox::new());
    }
}
