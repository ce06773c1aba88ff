use std::ops::Range;
use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use markdown_linkedit_config::Config;
use markdown_linkedit_engine::editing::{Cmd, Document, SelectionRange};
use markdown_linkedit_engine::links::{
    CommitOutcome, FormKey, GridLayout, LinkEditor, LinkEditorOptions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub editor: LinkEditor,
    pub path: Option<PathBuf>,
    pub wrap_width: u16,
    pub status: String,
    /// Width of the text area as last drawn
    text_width: Option<u16>,
    /// Fixed end of a keyboard selection
    anchor: usize,
    /// Moving end of a keyboard selection
    head: usize,
}

impl App {
    pub fn new(doc: Document, path: Option<PathBuf>, config: &Config) -> Self {
        let options = LinkEditorOptions {
            autolink: config.autolink,
            placeholder: config.placeholder.clone(),
        };
        let mut editor = LinkEditor::with_options(doc, options);
        editor.init();
        let selection = editor.selection();

        Self {
            editor,
            path,
            wrap_width: config.wrap_width,
            status: String::new(),
            text_width: None,
            anchor: selection.from,
            head: selection.to,
        }
    }

    /// Load `path` as Markdown, or start empty when it doesn't exist yet
    pub fn open(path: Option<PathBuf>, config: &Config) -> Result<Self> {
        let doc = match &path {
            Some(path) if path.exists() => {
                let source = std::fs::read_to_string(path)?;
                log::info!("Opened {}", path.display());
                Document::from_markdown(&source)
            }
            _ => Document::new(),
        };
        Ok(Self::new(doc, path, config))
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// Record the width the text is drawn in, so cursor movement follows the
    /// rows on screen
    pub fn set_text_width(&mut self, width: u16) {
        self.text_width = Some(width);
    }

    /// Rows wrap at `wrap_width`, or earlier when the text area is narrower
    pub fn layout(&self) -> GridLayout {
        let columns = self
            .text_width
            .map_or(self.wrap_width, |width| self.wrap_width.min(width));
        GridLayout::new(columns.max(1))
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Char('s') => {
                    if let Err(e) = self.save() {
                        log::error!("Save failed: {e}");
                        self.status = format!("Save failed: {e}");
                    }
                }
                KeyCode::Char('k') => self.editor.trigger_shortcut(),
                KeyCode::Char('e') => self.editor.click_edit(),
                KeyCode::Char('u') => {
                    if self.editor.remove_link() {
                        self.status = "Link removed".to_string();
                    }
                }
                _ => {}
            }
        } else if self.editor.is_editing() {
            if let Some(form_key) = form_key(key.code)
                && let Some(outcome) = self.editor.handle_form_key(form_key)
            {
                self.status = describe(outcome);
            }
        } else {
            self.handle_text_key(key);
        }

        self.sync_selection();
        Flow::Continue
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        let selection = self.editor.selection();
        let prev = self.editor.document().prev_offset(self.head);
        let next = self.editor.document().next_offset(self.head);

        match key.code {
            KeyCode::Left if !extend && !selection.is_empty() => {
                self.move_to(selection.from, false)
            }
            KeyCode::Right if !extend && !selection.is_empty() => {
                self.move_to(selection.to, false)
            }
            KeyCode::Left => self.move_to(prev, extend),
            KeyCode::Right => self.move_to(next, extend),
            KeyCode::Up => self.move_rows(-1, extend),
            KeyCode::Down => self.move_rows(1, extend),
            KeyCode::Home => {
                let row = self.current_row();
                self.move_to(row.start, extend);
            }
            KeyCode::End => {
                let row = self.current_row();
                self.move_to(row.end, extend);
            }
            KeyCode::Char(c) => self.type_text(&c.to_string()),
            KeyCode::Enter => self.type_text("\n"),
            KeyCode::Backspace => {
                let range = if selection.is_empty() {
                    prev..selection.from
                } else {
                    selection.as_range()
                };
                self.editor.edit(Cmd::DeleteRange { range });
            }
            KeyCode::Delete => {
                let range = if selection.is_empty() {
                    selection.from..next
                } else {
                    selection.as_range()
                };
                self.editor.edit(Cmd::DeleteRange { range });
            }
            _ => {}
        }
    }

    fn type_text(&mut self, text: &str) {
        let selection = self.editor.selection();
        self.editor.edit(Cmd::ReplaceRange {
            range: selection.as_range(),
            text: text.to_string(),
        });
    }

    fn move_to(&mut self, offset: usize, extend: bool) {
        if !extend {
            self.anchor = offset;
        }
        self.head = offset;
        self.editor.edit(Cmd::Select {
            range: SelectionRange::new(self.anchor, self.head),
        });
    }

    fn current_row(&self) -> Range<usize> {
        let text = self.editor.document().text();
        let layout = self.layout();
        let (row, _) = layout.cell_of(&text, self.head);
        layout.rows(&text).swap_remove(row)
    }

    fn move_rows(&mut self, delta: isize, extend: bool) {
        let text = self.editor.document().text();
        let layout = self.layout();
        let rows = layout.rows(&text);
        let (row, column) = layout.cell_of(&text, self.head);

        let Some(target) = row.checked_add_signed(delta).filter(|row| *row < rows.len()) else {
            return;
        };
        let target = rows[target].clone();
        let offset = text[target.clone()]
            .char_indices()
            .nth(column)
            .map_or(target.end, |(index, _)| target.start + index);
        self.move_to(offset, extend);
    }

    /// Follow selection changes made by the editor itself (commits, link selection)
    fn sync_selection(&mut self) {
        let selection = self.editor.selection();
        if SelectionRange::new(self.anchor, self.head) != selection {
            self.anchor = selection.from;
            self.head = selection.to;
        }
    }

    fn save(&mut self) -> Result<()> {
        let Some(path) = &self.path else {
            self.status = "No file to save to".to_string();
            return Ok(());
        };
        std::fs::write(path, self.editor.document().to_markdown())?;
        log::info!("Saved {}", path.display());
        self.status = format!("Saved {}", path.display());
        Ok(())
    }
}

fn form_key(code: KeyCode) -> Option<FormKey> {
    Some(match code {
        KeyCode::Char(c) => FormKey::Char(c),
        KeyCode::Backspace => FormKey::Backspace,
        KeyCode::Delete => FormKey::Delete,
        KeyCode::Left => FormKey::Left,
        KeyCode::Right => FormKey::Right,
        KeyCode::Home => FormKey::Home,
        KeyCode::End => FormKey::End,
        KeyCode::Enter => FormKey::Enter,
        KeyCode::Esc => FormKey::Escape,
        _ => return None,
    })
}

fn describe(outcome: CommitOutcome) -> String {
    match outcome {
        CommitOutcome::Linked { .. } => "Link saved".to_string(),
        CommitOutcome::Unlinked { .. } => "Link removed".to_string(),
        CommitOutcome::Inserted { .. } => "Link inserted".to_string(),
        CommitOutcome::Degraded => "Link target moved; nothing changed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_linkedit_engine::DocumentEngine;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn app(markdown: &str) -> App {
        App::new(Document::from_markdown(markdown), None, &Config::default())
    }

    fn press(app: &mut App, code: KeyCode) -> Flow {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn press_with(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Flow {
        app.handle_key(KeyEvent::new(code, modifiers))
    }

    fn type_keys(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn shift_arrows_select_then_ctrl_k_links() {
        let mut app = app("hello world");
        for _ in 0..5 {
            press_with(&mut app, KeyCode::Left, KeyModifiers::SHIFT);
        }
        assert_eq!(app.editor.selection(), SelectionRange::new(6, 11));

        press_with(&mut app, KeyCode::Char('k'), KeyModifiers::CONTROL);
        type_keys(&mut app, "https://w.org");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.editor.document().to_markdown(), "hello [world](https://w.org)");
        assert_eq!(app.status, "Link saved");
        assert_eq!(app.head(), 11);
    }

    #[test]
    fn escape_closes_the_form() {
        let mut app = app("hello");
        press_with(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert!(app.editor.is_editing());

        press(&mut app, KeyCode::Esc);

        assert!(!app.editor.is_editing());
        assert!(app.editor.document().links().is_empty());
    }

    #[test]
    fn ctrl_u_removes_link_under_cursor() {
        let mut app = app("a [link](https://a.com) b");
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Right);

        press_with(&mut app, KeyCode::Char('u'), KeyModifiers::CONTROL);

        assert!(app.editor.document().links().is_empty());
        assert_eq!(app.status, "Link removed");
    }

    #[test]
    fn typing_and_backspace_edit_text() {
        let mut app = app("");
        type_keys(&mut app, "abc");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);
        type_keys(&mut app, "d");

        assert_eq!(app.editor.document().text(), "ab\nd");
    }

    #[test]
    fn up_and_down_keep_the_column() {
        let mut app = app("first line\nsecond line");
        press(&mut app, KeyCode::Up);
        assert_eq!(app.head(), 10);

        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.head(), 11);
    }

    #[test]
    fn up_and_home_follow_rows_of_a_narrow_text_area() {
        let mut app = app("abcdefghij");
        app.set_text_width(4);

        press(&mut app, KeyCode::Up);
        assert_eq!(app.head(), 6);

        press(&mut app, KeyCode::Home);
        assert_eq!(app.head(), 4);
    }

    #[test]
    fn ctrl_q_quits() {
        let mut app = app("");
        assert_eq!(press_with(&mut app, KeyCode::Char('q'), KeyModifiers::CONTROL), Flow::Quit);
    }

    #[test]
    fn ctrl_s_writes_markdown() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("note.md");
        let mut app = App::open(Some(path.clone()), &Config::default()).unwrap();
        type_keys(&mut app, "see https://a.io ");

        press_with(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "see <https://a.io> ");
    }
}
