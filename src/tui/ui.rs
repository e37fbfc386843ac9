use chrono::{Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use super::app::{App, Column, InputMode};
use crate::lifecycle::is_overdue;
use crate::models::{hate_label, hate_tone, Chore, Priority, Tone};

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Stats
            Constraint::Min(0),    // Board
            Constraint::Length(3), // Help
        ].as_ref())
        .split(f.area());

    let filters = if app.filters.is_empty() {
        "all categories".to_string()
    } else {
        app.filters.iter().map(|c| c.name()).collect::<Vec<_>>().join(", ")
    };
    let header = Paragraph::new(app.stats.to_string())
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title(format!(
            "{} | sort: {} {} | filter: {}",
            app.household.name,
            app.sort.by,
            app.sort.direction.arrow(),
            filters
        )));
    f.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(chunks[1]);

    let open_focused = app.column == Column::Open;
    render_column(f, columns[0], "Open Chores", &app.open, &mut app.open_state, open_focused);
    render_column(f, columns[1], "Recently Done", &app.done, &mut app.done_state, !open_focused);

    let help_style = if app.status.is_some() && app.input_mode != InputMode::Normal {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let help_text = footer_text(app);

    let help = Paragraph::new(help_text)
        .style(help_style)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(help, chunks[2]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area());
        f.render_widget(Clear, area);

        let title = match app.input_mode {
            InputMode::Adding => match app.add_state.step {
                0 => "Add Chore: Enter Title",
                1 => "Add Chore: Category (Cleaning, Cooking, Shopping, Maintenance, Outdoor, Pet Care)",
                2 => "Add Chore: Hate Points 1-7",
                3 => "Add Chore: Repeat (none, daily, weekly, monthly)",
                _ => "Add Chore: Due Date (YYYY-MM-DD, Optional)",
            },
            _ => "Edit Title",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

/// Footer line: key help, prefixed by the last status message. While an
/// input is open the status is the reason the last value was rejected.
pub fn footer_text(app: &App) -> String {
    let keys = match app.input_mode {
        InputMode::Normal => {
            "q: Quit | Space: Done/Undo | a: Add | e: Edit | d: Del | Tab: Column | s/S: Sort | f/F/x: Filter"
        }
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    match (&app.status, &app.input_mode) {
        (Some(status), InputMode::Normal) => status.clone(),
        (Some(status), _) => format!("{} | {}", status, keys),
        (None, _) => keys.to_string(),
    }
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Blue => Color::Blue,
        Tone::Orange => Color::Rgb(255, 165, 0),
        Tone::Magenta => Color::Magenta,
        Tone::Gray => Color::Gray,
        Tone::Green => Color::Green,
        Tone::Yellow => Color::Yellow,
        Tone::Red => Color::Red,
    }
}

fn render_column(
    f: &mut Frame,
    area: Rect,
    title: &str,
    chores: &[Chore],
    state: &mut TableState,
    focused: bool,
) {
    let now = Utc::now();
    let rows: Vec<Row> = chores
        .iter()
        .map(|c| {
            let due = c
                .due_date
                .map(|d| d.with_timezone(&Local).format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            let overdue = !c.is_completed && is_overdue(c, now);
            let marker = match c.priority {
                Priority::High => "!!",
                Priority::Medium => "!",
                Priority::Low => "",
            };
            let style = if c.is_completed {
                Style::default().fg(Color::DarkGray)
            } else if overdue {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };

            Row::new(vec![
                Cell::from(format!("{} {}", c.icon, c.title)),
                Cell::from(c.category.name()).style(Style::default().fg(tone_color(c.category.tone()))),
                Cell::from(marker),
                Cell::from(format!("{}/7", c.hate_points))
                    .style(Style::default().fg(tone_color(hate_tone(c.hate_points)))),
                Cell::from(due),
                Cell::from(if c.recurring.is_recurring() { c.recurring.as_str() } else { "" }),
                Cell::from(c.assignees.iter().map(|a| a.initials()).collect::<Vec<_>>().join(" ")),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(3),
        Constraint::Length(5),
        Constraint::Length(11),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let border_style = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let selected_hint = state
        .selected()
        .and_then(|i| chores.get(i))
        .filter(|_| focused)
        .map(|c| format!(" | {}", hate_label(c.hate_points)))
        .unwrap_or_default();

    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Chore", "Category", "Pri", "Hate", "Due", "Repeat", "Who"])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .bottom_margin(1))
        .block(Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!("{} ({}){}", title, chores.len(), selected_hint)))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(if focused { ">> " } else { "   " });

    f.render_stateful_widget(table, area, state);
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(r.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Length(r.height.saturating_sub(height) / 2),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
