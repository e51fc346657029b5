use iced::keyboard::Key;
use iced::keyboard::Modifiers;
use iced::keyboard::key::Named;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Escape,
    /// Any other key, named like the browser's `KeyboardEvent.key`.
    Key(String),
}

impl Keystroke {
    pub fn convert(key: Key, _mods: Modifiers) -> Option<Self> {
        match key {
            Key::Named(Named::Escape) => Some(Self::Escape),
            Key::Named(Named::Space) => Some(Self::Key(" ".to_owned())),
            // The named keys share their names with the web ones: `ArrowUp`, `Enter`, ...
            Key::Named(named) => Some(Self::Key(format!("{named:?}"))),
            Key::Character(c) => Some(Self::Key(c.to_string())),
            Key::Unidentified => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key) -> Option<Keystroke> {
        Keystroke::convert(key, Modifiers::empty())
    }

    #[test]
    fn browser_names() {
        assert_eq!(key(Key::Named(Named::Escape)), Some(Keystroke::Escape));
        assert_eq!(
            key(Key::Named(Named::ArrowUp)),
            Some(Keystroke::Key("ArrowUp".to_owned()))
        );
        assert_eq!(
            key(Key::Named(Named::Enter)),
            Some(Keystroke::Key("Enter".to_owned()))
        );
        assert_eq!(
            key(Key::Named(Named::Space)),
            Some(Keystroke::Key(" ".to_owned()))
        );
        assert_eq!(
            key(Key::Character("a".into())),
            Some(Keystroke::Key("a".to_owned()))
        );
        assert_eq!(key(Key::Unidentified), None);
    }
}
