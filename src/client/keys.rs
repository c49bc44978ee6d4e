#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Submit the current input; the newline is not inserted.
    Submit,
    /// Modified Enter, or any Enter while a request is outstanding.
    InsertNewline,
    Passthrough,
}

pub fn key_action(key: Key, modifiers: Modifiers, submitting: bool) -> KeyAction {
    match key {
        Key::Enter if modifiers.any() => KeyAction::InsertNewline,
        Key::Enter if submitting => KeyAction::InsertNewline,
        Key::Enter => KeyAction::Submit,
        _ => KeyAction::Passthrough,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_enter_submits_when_idle() {
        assert_eq!(key_action(Key::Enter, Modifiers::default(), false), KeyAction::Submit);
    }

    #[test]
    fn plain_enter_inserts_newline_while_submitting() {
        assert_eq!(key_action(Key::Enter, Modifiers::default(), true), KeyAction::InsertNewline);
    }

    #[test]
    fn modified_enter_inserts_newline() {
        let shift = Modifiers { shift: true, ..Modifiers::default() };
        assert_eq!(key_action(Key::Enter, shift, false), KeyAction::InsertNewline);
        assert_eq!(key_action(Key::Enter, shift, true), KeyAction::InsertNewline);
    }

    #[test]
    fn other_keys_pass_through() {
        assert_eq!(key_action(Key::Char('a'), Modifiers::default(), false), KeyAction::Passthrough);
        assert_eq!(key_action(Key::Other, Modifiers::default(), true), KeyAction::Passthrough);
    }
}
