use serde::Serialize;

use crate::links::LinkEditState;

pub const DEFAULT_PLACEHOLDER: &str = "Enter link...";

/// Accessible label of the href input
pub const FORM_LABEL: &str = "Link (href)";

/// Keys the edit form understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKey {
    Char(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Enter,
    Escape,
}

/// What a key press means for the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormIntent {
    /// The href now reads this
    Edit(String),
    Moved,
    Submit,
    Cancel,
    Ignored,
}

/// Render model of the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormView {
    pub visible: bool,
    pub value: String,
    pub placeholder: String,
    /// Caret position in characters
    pub caret: usize,
    pub label: &'static str,
}

impl FormView {
    pub fn shows_placeholder(&self) -> bool {
        self.value.is_empty()
    }
}

/// The floating href input.
///
/// The href itself lives in the session draft; the form only keeps its caret
/// and turns keys into intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    caret: usize,
    placeholder: String,
}

impl Default for EditForm {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEHOLDER)
    }
}

impl EditForm {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            caret: 0,
            placeholder: placeholder.into(),
        }
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Start a session with the caret after the existing href
    pub fn open(&mut self, href: &str) {
        self.caret = href.chars().count();
    }

    pub fn handle_key(&mut self, value: &str, key: FormKey) -> FormIntent {
        let mut chars: Vec<char> = value.chars().collect();
        let caret = self.caret.min(chars.len());

        match key {
            FormKey::Enter => FormIntent::Submit,
            FormKey::Escape => FormIntent::Cancel,
            FormKey::Char(c) if !c.is_control() => {
                chars.insert(caret, c);
                self.caret = caret + 1;
                FormIntent::Edit(chars.into_iter().collect())
            }
            FormKey::Backspace if caret > 0 => {
                chars.remove(caret - 1);
                self.caret = caret - 1;
                FormIntent::Edit(chars.into_iter().collect())
            }
            FormKey::Delete if caret < chars.len() => {
                chars.remove(caret);
                self.caret = caret;
                FormIntent::Edit(chars.into_iter().collect())
            }
            FormKey::Left if caret > 0 => {
                self.caret = caret - 1;
                FormIntent::Moved
            }
            FormKey::Right if caret < chars.len() => {
                self.caret = caret + 1;
                FormIntent::Moved
            }
            FormKey::Home => {
                self.caret = 0;
                FormIntent::Moved
            }
            FormKey::End => {
                self.caret = chars.len();
                FormIntent::Moved
            }
            _ => FormIntent::Ignored,
        }
    }

    pub fn view(&self, state: &LinkEditState) -> FormView {
        let value = state.href().to_string();
        FormView {
            visible: state.is_editing(),
            caret: self.caret.min(value.chars().count()),
            value,
            placeholder: self.placeholder.clone(),
            label: FORM_LABEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LinkDraft;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn press_all(form: &mut EditForm, value: &str, keys: &[FormKey]) -> String {
        let mut value = value.to_string();
        for key in keys {
            if let FormIntent::Edit(next) = form.handle_key(&value, *key) {
                value = next;
            }
        }
        value
    }

    #[test]
    fn typing_inserts_at_caret() {
        let mut form = EditForm::default();
        form.open("https://a.com");

        let value = press_all(
            &mut form,
            "https://a.com",
            &[
                FormKey::Home,
                FormKey::Right,
                FormKey::Right,
                FormKey::Right,
                FormKey::Right,
                FormKey::Char('s'),
            ],
        );

        assert_eq!(value, "httpss://a.com");
        assert_eq!(form.caret(), 5);
    }

    #[test]
    fn backspace_and_delete_remove_around_caret() {
        let mut form = EditForm::default();
        form.open("héllo");

        let value = press_all(
            &mut form,
            "héllo",
            &[FormKey::Backspace, FormKey::Home, FormKey::Delete],
        );

        assert_eq!(value, "éll");
        assert_eq!(form.caret(), 0);
    }

    #[rstest]
    #[case::enter(FormKey::Enter, FormIntent::Submit)]
    #[case::escape(FormKey::Escape, FormIntent::Cancel)]
    #[case::backspace_at_start(FormKey::Backspace, FormIntent::Ignored)]
    #[case::left_at_start(FormKey::Left, FormIntent::Ignored)]
    #[case::control_char(FormKey::Char('\u{7}'), FormIntent::Ignored)]
    fn special_keys(#[case] key: FormKey, #[case] expected: FormIntent) {
        let mut form = EditForm::default();
        assert_eq!(form.handle_key("abc", key), expected);
    }

    #[test]
    fn view_reflects_session() {
        let mut form = EditForm::new("Paste a URL");
        let idle = form.view(&LinkEditState::Idle);
        assert!(!idle.visible);
        assert!(idle.shows_placeholder());

        form.open("https://a.com");
        let view = form.view(&LinkEditState::Editing(LinkDraft {
            href: "https://a.com".to_string(),
            range: None,
        }));

        assert_eq!(
            view,
            FormView {
                visible: true,
                value: "https://a.com".to_string(),
                placeholder: "Paste a URL".to_string(),
                caret: 13,
                label: "Link (href)",
            }
        );
    }
}
