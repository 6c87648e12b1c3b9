//! Screen layout: status bar, live waveform, the current case view, and the
//! assistant action log.

use crate::app::App;
use liveguide::case::Page;
use liveguide::live::SessionState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Sparkline, Wrap};
use ratatui::Frame;

pub fn draw(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Length(4), // waveform
            Constraint::Min(6),    // page + action log
            Constraint::Length(1), // key help
        ])
        .split(frame.size());

    draw_status_bar(frame, app, rows[0]);
    draw_waveform(frame, app, rows[1]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[2]);
    draw_page(frame, app, columns[0]);
    draw_action_log(frame, app, columns[1]);

    draw_help(frame, rows[3]);
}

fn state_span(app: &App) -> Span<'static> {
    match app.session_state {
        SessionState::Connecting => Span::styled("CONNECTING", Style::default().fg(Color::Yellow)),
        SessionState::Connected => {
            let muted = app
                .session
                .as_ref()
                .map(|session| session.is_muted())
                .unwrap_or(false);
            if muted {
                Span::styled("MUTED", Style::default().fg(Color::Magenta))
            } else {
                Span::styled(
                    "LIVE",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )
            }
        }
        SessionState::Disconnected => Span::styled("OFFLINE", Style::default().fg(Color::DarkGray)),
    }
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let latest = app
        .status_log
        .back()
        .cloned()
        .unwrap_or_else(|| "Press c to start a voice session.".to_string());
    let line = Line::from(vec![
        Span::styled(" LiveGuide ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("| "),
        state_span(app),
        Span::raw(" | "),
        Span::raw(latest),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_waveform(frame: &mut Frame, app: &App, area: Rect) {
    let data: Vec<u64> = app.meter_history.iter().copied().collect();
    let sparkline = Sparkline::default()
        .block(Block::default().borders(Borders::ALL).title("voice"))
        .data(&data)
        .max(100)
        .style(Style::default().fg(Color::Cyan));
    frame.render_widget(sparkline, area);
}

fn draw_page(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(app.page.title());
    match app.page {
        Page::Dashboard => {
            let open_tasks = app.snapshot.tasks.iter().filter(|t| !t.completed).count();
            let text = vec![
                Line::from(app.context.summary()),
                Line::from(""),
                Line::from(format!(
                    "{open_tasks} open tasks · {} evidence entries · {} contacts · {} expenses",
                    app.snapshot.evidence.len(),
                    app.snapshot.contacts.len(),
                    app.snapshot.expenses.len(),
                )),
            ];
            frame.render_widget(
                Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
                area,
            );
        }
        Page::Tasks => {
            let items: Vec<ListItem> = app
                .snapshot
                .tasks
                .iter()
                .map(|task| {
                    let mark = if task.completed { "x" } else { " " };
                    ListItem::new(format!(
                        "[{mark}] ({}) {} — {}",
                        task.priority, task.task, task.category
                    ))
                })
                .collect();
            frame.render_widget(empty_or(items, "No tasks yet.").block(block), area);
        }
        Page::Evidence => {
            let items: Vec<ListItem> = app
                .snapshot
                .evidence
                .iter()
                .map(|entry| {
                    ListItem::new(format!(
                        "{} {} [{}] {}",
                        entry.date, entry.time, entry.kind, entry.description
                    ))
                })
                .collect();
            frame.render_widget(empty_or(items, "No evidence logged yet.").block(block), area);
        }
        Page::Contacts => {
            let items: Vec<ListItem> = app
                .snapshot
                .contacts
                .iter()
                .map(|contact| {
                    ListItem::new(format!("{} — {} {}", contact.name, contact.role, contact.phone))
                })
                .collect();
            frame.render_widget(empty_or(items, "No contacts saved yet.").block(block), area);
        }
        Page::Expenses => {
            let total: f64 = app.snapshot.expenses.iter().map(|e| e.amount).sum();
            let mut items: Vec<ListItem> = app
                .snapshot
                .expenses
                .iter()
                .map(|entry| {
                    ListItem::new(format!(
                        "{} ${:.2} [{}] {}",
                        entry.date, entry.amount, entry.category, entry.description
                    ))
                })
                .collect();
            items.push(ListItem::new(format!("— total ${total:.2}")));
            frame.render_widget(List::new(items).block(block), area);
        }
    }
}

fn empty_or<'a>(items: Vec<ListItem<'a>>, placeholder: &'static str) -> List<'a> {
    if items.is_empty() {
        List::new(vec![ListItem::new(placeholder)])
    } else {
        List::new(items)
    }
}

fn draw_action_log(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("assistant actions");
    // Newest first; the cap keeps this bounded.
    let mut items: Vec<ListItem> = app
        .action_log
        .entries()
        .map(|entry| ListItem::new(format!("{} {}", entry.glyph, entry.text)))
        .collect();
    items.reverse();
    if items.is_empty() {
        items.push(ListItem::new(Span::styled(
            "Tool calls will show up here.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        " c connect · d disconnect · m mute · 1-5 views · q quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, area);
}
