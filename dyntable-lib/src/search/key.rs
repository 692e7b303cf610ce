//! Keystroke classification

/// A key released in the search input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// A printable character.
    Char(char),
    Backspace,
    Delete,
    /// Any other key (modifiers, arrows, escape, function keys, ...).
    Other,
}

impl KeyInput {
    /// Returns true if this key edits the query and must (re)start the
    /// debounce timer.
    pub fn triggers_search(&self) -> bool {
        match self {
            Self::Char(c) => !c.is_control(),
            Self::Backspace | Self::Delete => true,
            Self::Other => false,
        }
    }
}
