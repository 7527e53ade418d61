use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::board::{Card, Column};
use crate::task::TaskStatus;

use super::app::{AppState, StatusKind};
use super::editor::{EditorFieldId, EditorKind, EditorState};

const LABEL_WIDTH: usize = 12;
const HELP_KEY_WIDTH: usize = 14;
const COLOR_TEXT: Color = Color::Rgb(234, 236, 239);
const COLOR_MUTED: Color = Color::Rgb(160, 165, 172);
const COLOR_MUTED_DARK: Color = Color::Rgb(118, 124, 130);
const COLOR_BG_MUTED: Color = Color::Rgb(52, 56, 60);
const COLOR_INFO: Color = Color::Rgb(116, 198, 219);
const COLOR_WARNING: Color = Color::Rgb(244, 200, 98);
const COLOR_ERROR: Color = Color::Rgb(255, 107, 107);
const COLOR_SUCCESS: Color = Color::Rgb(126, 210, 146);
const COLOR_ACCENT: Color = Color::Rgb(122, 170, 255);
const COLOR_BORDER_LIST: Color = Color::Rgb(92, 126, 166);
const COLOR_BORDER_DETAIL: Color = Color::Rgb(180, 156, 92);

pub fn render(frame: &mut Frame, app: &AppState) {
    let area = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(area);
    let main = chunks[0];
    let footer = chunks[1];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
                Constraint::Ratio(1, 3),
            ]
            .as_ref(),
        )
        .split(main);
    for (column, area) in app.board().columns().iter().zip(columns.iter()) {
        let selected = (column.status == app.column).then_some(app.row);
        render_column(frame, column, selected, *area);
    }

    render_footer(frame, app, footer);

    if let Some(editor) = app.session.state() {
        render_editor_modal(frame, area, editor);
    } else if app.show_help {
        render_help_modal(frame, area);
    }
}

fn render_column(frame: &mut Frame, column: &Column, selected: Option<usize>, area: Rect) {
    let focused = selected.is_some();
    let border_color = if focused {
        COLOR_BORDER_DETAIL
    } else {
        COLOR_BORDER_LIST
    };
    let title_style = Style::default()
        .fg(status_color(column.status))
        .add_modifier(Modifier::BOLD);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(column.header().to_string(), title_style));

    let inner_width = area.width.saturating_sub(2) as usize;
    let height = area.height.saturating_sub(2) as usize;
    let cards = column.cards();

    let lines: Vec<Line<'static>> = if cards.is_empty() {
        vec![Line::from(Span::styled(
            "(empty)",
            Style::default().fg(COLOR_MUTED_DARK),
        ))]
    } else {
        let (start, end) = list_window(cards.len(), selected, height);
        cards[start..end]
            .iter()
            .enumerate()
            .map(|(offset, card)| {
                render_card_row(card, selected == Some(start + offset), inner_width)
            })
            .collect()
    };

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_card_row(card: &Card, selected: bool, width: usize) -> Line<'static> {
    let id_text = format!("#{} ", card.id);
    let title_width = width.saturating_sub(id_text.len());
    let title = pad_text(&card.title, title_width);
    let mut spans = vec![
        Span::styled(id_text, id_style()),
        Span::styled(title, Style::default().fg(COLOR_TEXT)),
    ];
    if selected {
        for span in &mut spans {
            span.style = span
                .style
                .bg(COLOR_BG_MUTED)
                .add_modifier(Modifier::REVERSED);
        }
    }
    Line::from(spans)
}

fn render_footer(frame: &mut Frame, app: &AppState, area: Rect) {
    let hint = app.footer_hint();
    let hint_span = Span::styled(hint, Style::default().fg(COLOR_INFO));
    let line = if let Some((status, kind)) = app.status_line() {
        let status_style = match kind {
            StatusKind::Error => Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
            StatusKind::Info => Style::default().fg(COLOR_WARNING),
        };
        Line::from(vec![
            hint_span,
            Span::raw("  |  "),
            Span::styled(status.to_string(), status_style),
        ])
    } else {
        Line::from(hint_span)
    };
    let counts_line = Line::from(Span::styled(
        app.count_summary(),
        Style::default().fg(COLOR_ACCENT),
    ));
    let widget = Paragraph::new(vec![line, counts_line])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(Style::default().fg(COLOR_BORDER_LIST)),
        );
    frame.render_widget(widget, area);
}

fn render_editor_modal(frame: &mut Frame, area: Rect, editor: &EditorState) {
    let content_width = area.width.saturating_sub(8).min(72);
    let height = 12u16.min(area.height.saturating_sub(4));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);

    let title = match editor.kind() {
        EditorKind::NewTask => "New Task".to_string(),
        EditorKind::EditTask => match editor.task_id() {
            Some(id) => format!("Edit Task #{id}"),
            None => "Edit Task".to_string(),
        },
    };
    let width = content_width.saturating_sub(2) as usize;
    let lines = if editor.confirming_delete() {
        build_delete_confirm_lines(editor, width)
    } else {
        build_editor_lines(editor, width)
    };
    let widget = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(COLOR_BORDER_DETAIL))
                .title(title),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, modal);
}

fn build_editor_lines(editor: &EditorState, width: usize) -> Vec<Line<'static>> {
    let value_width = width.saturating_sub(LABEL_WIDTH + 2);
    let mut lines: Vec<Line<'static>> = Vec::new();
    for field in editor.fields() {
        let is_active = *field == editor.active_field();
        let marker = if is_active { ">" } else { " " };
        let label = format!("{:<width$}", field.label(), width = LABEL_WIDTH);
        let (value, value_style) = match field {
            EditorFieldId::Title => {
                let style = if editor.title_error().is_some() {
                    Style::default().fg(COLOR_ERROR)
                } else {
                    Style::default().fg(COLOR_TEXT)
                };
                (editor.title().to_string(), style)
            }
            EditorFieldId::Description if editor.description().is_empty() && !is_active => {
                ("(optional)".to_string(), Style::default().fg(COLOR_MUTED))
            }
            EditorFieldId::Description => (
                editor.description().to_string(),
                Style::default().fg(COLOR_TEXT),
            ),
            EditorFieldId::Status => (
                format!("< {} >", editor.status()),
                Style::default().fg(status_color(editor.status())),
            ),
        };
        let mut spans = vec![
            Span::styled(marker.to_string(), Style::default().fg(COLOR_ACCENT)),
            Span::styled(label, Style::default().fg(COLOR_TEXT)),
            Span::raw(" "),
            Span::styled(truncate_text(&value, value_width), value_style),
        ];
        if is_active && *field != EditorFieldId::Status {
            spans.push(Span::styled("_", Style::default().fg(COLOR_ACCENT)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    if let Some(error) = editor.title_error() {
        lines.push(Line::from(Span::styled(
            error.to_string(),
            Style::default()
                .fg(COLOR_ERROR)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(Span::styled(
        "enter save  esc cancel  tab next field",
        Style::default().fg(COLOR_MUTED_DARK),
    )));
    lines
}

fn build_delete_confirm_lines(editor: &EditorState, width: usize) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    lines.push(Line::from(Span::styled(
        "Delete task?",
        Style::default()
            .fg(COLOR_ERROR)
            .add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));
    if let Some(id) = editor.task_id() {
        lines.push(Line::from(vec![
            label_span("ID: "),
            Span::styled(format!("#{id}"), id_style()),
        ]));
    }
    if !editor.title().trim().is_empty() {
        lines.push(Line::from(vec![
            label_span("Title: "),
            Span::styled(
                truncate_text(editor.title(), width.saturating_sub(8)),
                Style::default().fg(COLOR_TEXT),
            ),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "y/enter confirm  n/esc keep",
        Style::default().fg(COLOR_MUTED_DARK),
    )));
    lines
}

fn render_help_modal(frame: &mut Frame, area: Rect) {
    let content_width = area.width.saturating_sub(8).min(56);
    let lines = build_help_lines(content_width.saturating_sub(2) as usize);
    let height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let modal = centered_rect(content_width, height, area);
    frame.render_widget(Clear, modal);
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(COLOR_BORDER_LIST))
            .title("Help"),
    );
    frame.render_widget(widget, modal);
}

fn build_help_lines(width: usize) -> Vec<Line<'static>> {
    vec![
        help_header("Board"),
        help_line("h/l  left/right", "switch column", width),
        help_line("j/k  up/down", "move selection", width),
        help_line("1 2 3", "jump to column", width),
        help_line("n", "new task in this column", width),
        help_line("enter/e", "edit selected task", width),
        help_line("> <", "move task to next/previous column", width),
        help_line("d", "delete selected task", width),
        help_line("q/esc", "quit", width),
        Line::from(""),
        help_header("Editor"),
        help_line("tab/shift-tab", "next/previous field", width),
        help_line("left/right", "change status", width),
        help_line("ctrl-u", "clear field", width),
        help_line("ctrl-d", "delete task", width),
        help_line("enter", "save", width),
        help_line("esc", "cancel", width),
    ]
}

fn help_header(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default().fg(COLOR_INFO).add_modifier(Modifier::BOLD),
    ))
}

fn help_line(keys: &str, desc: &str, width: usize) -> Line<'static> {
    let key_text = pad_text(keys, HELP_KEY_WIDTH.min(width));
    let desc_width = width.saturating_sub(HELP_KEY_WIDTH + 1);
    let desc_text = truncate_text(desc, desc_width);
    Line::from(vec![
        Span::styled(
            key_text,
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(desc_text, Style::default().fg(COLOR_MUTED)),
    ])
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

/// Visible `[start, end)` slice of a list that keeps `selected` in view
fn list_window(total: usize, selected: Option<usize>, height: usize) -> (usize, usize) {
    if total == 0 || height == 0 {
        return (0, 0);
    }
    if total <= height {
        return (0, total);
    }
    let selected = selected.unwrap_or(0);
    let mut start = selected.saturating_sub(height / 2);
    if start + height > total {
        start = total - height;
    }
    (start, start + height)
}

fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => COLOR_INFO,
        TaskStatus::Doing => COLOR_WARNING,
        TaskStatus::Done => COLOR_SUCCESS,
    }
}

fn pad_text(value: &str, width: usize) -> String {
    let text = truncate_text(value, width);
    format!("{text:width$}")
}

fn truncate_text(value: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= max {
        return value.to_string();
    }
    if max <= 3 {
        return chars[..max].iter().collect();
    }
    let mut out: String = chars[..(max - 3)].iter().collect();
    out.push_str("...");
    out
}

fn label_span(label: &str) -> Span<'static> {
    Span::styled(label.to_string(), Style::default().fg(COLOR_MUTED_DARK))
}

fn id_style() -> Style {
    Style::default()
        .fg(COLOR_MUTED)
        .add_modifier(Modifier::BOLD)
}
