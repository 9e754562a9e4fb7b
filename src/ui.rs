use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use throbber_widgets_tui::{BRAILLE_SIX, Throbber, WhichUse};

use crate::app::App;
use crate::model::{Screen, StatusInfo, Template};

/// Draw router
pub fn draw_ui(f: &mut Frame<'_>, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(6), // status card
            Constraint::Min(6),    // body
            Constraint::Length(3), // message footer
        ])
        .split(f.area());

    draw_header(f, chunks[0]);
    draw_status_card(f, app, chunks[1]);

    match app.screen {
        Screen::Dashboard | Screen::DeleteConfirm => draw_dashboard_body(f, app, chunks[2]),
        Screen::Settings => draw_settings_body(f, app, chunks[2]),
        Screen::ManualStatus | Screen::EditCurrent | Screen::CreateTemplate => {
            draw_form_body(f, app, chunks[2])
        }
    }

    draw_footer(f, app, chunks[3]);

    if app.screen == Screen::DeleteConfirm {
        draw_delete_confirm(f, app);
    }

    if app.loading {
        let throbber = Throbber::default()
            .label(" Working...")
            .style(Style::default().fg(Color::Yellow))
            .throbber_set(BRAILLE_SIX)
            .use_type(WhichUse::Spin);
        let spinner_area = Rect {
            x: chunks[3].x + 2,
            y: chunks[3].y.saturating_sub(1),
            width: 16.min(chunks[3].width),
            height: 1,
        };
        f.render_stateful_widget(throbber, spinner_area, &mut app.throbber_state);
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect) {
    let title = Span::styled(
        "Slack Status TUI",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let header = Paragraph::new(Line::from(title))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_status_card(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut lines = status_lines(&app.status);
    if let Some(err) = &app.err {
        lines.push(Line::from(Span::styled(
            err.to_string(),
            Style::default().fg(Color::Red),
        )));
    }
    let card = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Current Status"));
    f.render_widget(card, area);
}

/// Status card content with `unknown`/`-`/`none` fallbacks for blank values.
fn status_lines(status: &StatusInfo) -> Vec<Line<'static>> {
    vec![
        Line::from(format!("User: {}", missing(&status.user, "unknown"))),
        Line::from(format!(
            "Status: {} {}",
            missing(&status.text, "-"),
            status.emoji
        )),
        Line::from(format!("Expires: {}", missing(&status.expiration, "none"))),
    ]
}

fn draw_dashboard_body(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let title = if app.templates.is_empty() {
        "Status Templates (empty - press c to add)"
    } else {
        "Status Templates"
    };
    let items: Vec<ListItem> = app.templates.iter().map(template_item).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, columns[0], &mut app.list_state);

    let hints = "enter use template\n\
        a manual status\n\
        e edit current\n\
        c create template\n\
        x delete template\n\
        s settings\n\
        r refresh\n\
        q quit";
    let help = Paragraph::new(hints)
        .style(Style::default().fg(Color::Blue))
        .block(Block::default().borders(Borders::ALL).title("Actions"));
    f.render_widget(help, columns[1]);
}

fn template_item(t: &Template) -> ListItem<'static> {
    let mut detail: Vec<String> = Vec::new();
    if !t.text.is_empty() {
        detail.push(t.text.clone());
    }
    if let Some(minutes) = t.duration_in_minutes {
        detail.push(format!("{minutes}m"));
    }
    if !t.until_time.is_empty() {
        detail.push(format!("until {}", t.until_time));
    }
    ListItem::new(vec![
        Line::from(Span::styled(
            t.label.clone(),
            Style::default().fg(Color::Magenta),
        )),
        Line::from(Span::styled(
            format!("  {}", detail.join(" | ")),
            Style::default().fg(Color::Blue),
        )),
    ])
}

fn draw_form_body(f: &mut Frame<'_>, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::EditCurrent => "Edit Current Status",
        Screen::CreateTemplate => "Create Template",
        _ => "Manual Status",
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(form) = &app.form else {
        return;
    };
    let mut constraints: Vec<Constraint> =
        form.fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Min(1));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (i, field) in form.fields.iter().enumerate() {
        let style = if field.focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        let content = if field.value.is_empty() {
            Span::styled(field.placeholder, Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(field.value.clone(), style)
        };
        let input = Paragraph::new(Line::from(content))
            .block(Block::default().borders(Borders::ALL).title(field.placeholder))
            .style(style);
        f.render_widget(input, rows[i]);
    }

    let help = Paragraph::new("Enter to submit | Esc to cancel | Tab to switch fields")
        .style(Style::default().fg(Color::Blue))
        .alignment(Alignment::Center);
    f.render_widget(help, rows[form.fields.len()]);
}

fn draw_settings_body(f: &mut Frame<'_>, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Settings");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // token input
            Constraint::Length(2), // confirm delete
            Constraint::Length(2), // config path
            Constraint::Min(1),    // help
        ])
        .split(inner);

    if let Some(form) = &app.form {
        let token = Paragraph::new(form.fields[0].value.clone())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Slack token"));
        f.render_widget(token, rows[0]);
    }

    let confirm = if app.confirm_delete { "yes" } else { "no" };
    let toggle = Paragraph::new(format!("Confirm deletions: {confirm} (toggle with t)"));
    f.render_widget(toggle, rows[1]);

    let path = Paragraph::new(format!("Config path: {}", app.config_path.display()))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(path, rows[2]);

    let help = Paragraph::new("Enter to save | Esc to cancel")
        .style(Style::default().fg(Color::Blue))
        .alignment(Alignment::Center);
    f.render_widget(help, rows[3]);
}

fn draw_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let footer = Paragraph::new(app.message.clone())
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title("Message"));
    f.render_widget(footer, area);
}

fn draw_delete_confirm(f: &mut Frame<'_>, app: &App) {
    let label = app
        .selected_template()
        .map(|t| t.label.clone())
        .unwrap_or_default();
    let area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Confirm Delete")
        .style(Style::default().bg(Color::Red));
    let text = format!(
        "\nDelete all templates labeled\n'{label}'?\n\n(y) Yes / any other key No"
    );
    let p = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(p, area);
}

fn missing<'a>(v: &'a str, fallback: &'a str) -> &'a str {
    if v.trim().is_empty() { fallback } else { v }
}

/// Helper to center a rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
