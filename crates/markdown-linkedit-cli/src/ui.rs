use std::ops::Range;

use markdown_linkedit_engine::editing::{DocumentEngine, LinkSet, SelectionRange};
use markdown_linkedit_engine::links::{Anchor, AnchorRect, Surface};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::App;

pub fn draw(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(outer[0]);

    let title = app
        .path
        .as_ref()
        .map_or_else(|| "untitled".to_string(), |path| path.display().to_string());
    let editor_block = Block::default().borders(Borders::ALL).title(title);
    let inner = editor_block.inner(panes[0]);
    f.render_widget(editor_block, panes[0]);
    app.set_text_width(inner.width);
    let app = &*app;

    let doc = app.editor.document();
    let text = doc.text();
    let grid = app.layout();
    let rows = grid.rows(&text);
    let (cursor_row, cursor_column) = grid.cell_of(&text, app.head());
    let scroll = cursor_row.saturating_sub(usize::from(inner.height.saturating_sub(1)));

    let lines: Vec<Line> = rows
        .iter()
        .skip(scroll)
        .take(usize::from(inner.height))
        .map(|row| row_line(&text, row.clone(), app.editor.selection(), doc.links()))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);

    if !app.editor.is_editing() && inner.width > 0 && inner.height > 0 {
        let x = inner.x + (cursor_column as u16).min(inner.width - 1);
        let y = inner.y + (cursor_row - scroll) as u16;
        f.set_cursor_position((x, y));
    }

    let preview = Paragraph::new(doc.to_markdown())
        .block(Block::default().borders(Borders::ALL).title("Markdown"))
        .wrap(Wrap { trim: false });
    f.render_widget(preview, panes[1]);

    let layout = grid.with_origin(f32::from(inner.x), f32::from(inner.y) - scroll as f32);
    if let Some(anchor) = app.editor.anchor(&layout) {
        draw_surface(f, app, &anchor, inner);
    }

    let help = Line::from(vec![
        Span::raw("^Q: Quit | "),
        Span::raw("^S: Save | "),
        Span::raw("^K: Link | "),
        Span::raw("^E: Edit link | "),
        Span::raw("^U: Unlink | "),
        Span::raw("Shift+arrows: Select"),
    ]);
    f.render_widget(Paragraph::new(help), outer[1]);
    f.render_widget(
        Paragraph::new(app.status.as_str()).style(Style::default().fg(Color::Yellow)),
        outer[2],
    );
}

fn row_line<'a>(
    text: &'a str,
    row: Range<usize>,
    selection: SelectionRange,
    links: &LinkSet,
) -> Line<'a> {
    let spans: Vec<Span> = text[row.clone()]
        .char_indices()
        .map(|(index, c)| {
            let offset = row.start + index;
            let mut style = Style::default();
            if links
                .iter()
                .any(|mark| mark.range.start <= offset && offset < mark.range.end)
            {
                style = style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED);
            }
            if selection.from <= offset && offset < selection.to {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Span::styled(&text[offset..offset + c.len_utf8()], style)
        })
        .collect();
    Line::from(spans)
}

fn draw_surface(f: &mut Frame, app: &App, anchor: &Anchor, viewport: Rect) {
    match anchor.surface {
        Surface::SelectionToolbar => {
            let label = " ^K Link ";
            let area = place(anchor, label.len() as u16, 1, viewport);
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(label).style(Style::default().bg(Color::Yellow).fg(Color::Black)),
                area,
            );
        }
        Surface::LinkToolbar => {
            let href = app
                .editor
                .document()
                .links()
                .iter()
                .find(|mark| mark.range == anchor.range.as_range())
                .map(|mark| mark.attrs.href.clone())
                .unwrap_or_default();
            let label = format!(" {href}  ^E Edit  ^U Unlink ");
            let area = place(anchor, label.chars().count() as u16, 1, viewport);
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(label).style(Style::default().bg(Color::Blue).fg(Color::White)),
                area,
            );
        }
        Surface::EditForm => {
            let view = app.editor.form_view();
            let text_width = view.value.chars().count().max(view.placeholder.chars().count());
            let width = (text_width as u16 + 4).max(30);
            let area = place(anchor, width, 3, viewport);
            let block = Block::default().borders(Borders::ALL).title(view.label);
            let content = if view.shows_placeholder() {
                Span::styled(view.placeholder.clone(), Style::default().fg(Color::DarkGray))
            } else {
                Span::raw(view.value.clone())
            };
            f.render_widget(Clear, area);
            f.render_widget(Paragraph::new(Line::from(content)).block(block), area);
            if area.width > 2 {
                let x = area.x + 1 + (view.caret as u16).min(area.width - 3);
                f.set_cursor_position((x, area.y + 1));
            }
        }
    }
}

/// Screen area for a floating box of `width` x `height` next to `anchor`
fn place(anchor: &Anchor, width: u16, height: u16, viewport: Rect) -> Rect {
    let width = width.min(viewport.width);
    let height = height.min(viewport.height);
    let bounds = AnchorRect::new(
        f32::from(viewport.x),
        f32::from(viewport.y),
        f32::from(viewport.width),
        f32::from(viewport.height),
    );
    let (x, y) = anchor.popup_origin(f32::from(width), f32::from(height), bounds);
    Rect::new(x as u16, y as u16, width, height)
}
