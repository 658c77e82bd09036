//! Screen layout.
//!
//! ```text
//! Harness localhost:9092
//!
//! Kafka Topics                      (or the selected topic's name)
//! message copied to your clipboard! (alert line, blank once expired)
//! ┌───────────────────────────────┐
//! │ table                         │
//! └───────────────────────────────┘
//! q to quit  j/k up/down  ...
//! ```

use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use super::app::{AlertKind, HarnessApp, Screen};
use super::dashboard::{format_bytes, header_line};

const TOPICS_FOOTER: &str = "q quit | j/k up/down | enter open topic";
const MESSAGES_FOOTER: &str = "q quit | j/k up/down | esc/ctrl+o back | y copy message";

/// Draw the full TUI layout.
pub fn draw(f: &mut Frame, app: &mut HarnessApp, now: Instant) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Length(1), // spacer
            Constraint::Length(1), // sub-header
            Constraint::Length(1), // alert
            Constraint::Min(3),    // table
            Constraint::Length(1), // footer
        ])
        .split(f.area());

    f.render_widget(
        Paragraph::new(header_line(&app.brokers))
            .style(Style::default().add_modifier(Modifier::BOLD)),
        outer[0],
    );

    let sub_header = match &app.screen {
        Screen::Topics => "Kafka Topics".to_string(),
        Screen::Messages { topic } => topic.clone(),
    };
    f.render_widget(
        Paragraph::new(sub_header).style(Style::default().fg(Color::Cyan)),
        outer[2],
    );

    draw_alert(f, app, now, outer[3]);

    let footer = match app.screen {
        Screen::Topics => {
            draw_topics(f, app, outer[4]);
            TOPICS_FOOTER
        }
        Screen::Messages { .. } => {
            draw_messages(f, app, outer[4]);
            MESSAGES_FOOTER
        }
    };
    f.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        outer[5],
    );
}

fn draw_alert(f: &mut Frame, app: &HarnessApp, now: Instant, area: Rect) {
    let Some(alert) = app.visible_alert(now) else {
        return;
    };
    let style = match alert.kind {
        AlertKind::Info => Style::default().fg(Color::Green),
        AlertKind::Error => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(alert.text.clone(), style))),
        area,
    );
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn header_row<'a>(titles: &'a [&'a str]) -> Row<'a> {
    Row::new(titles.iter().copied())
        .style(Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
}

fn draw_topics(f: &mut Frame, app: &mut HarnessApp, area: Rect) {
    let rows = app.topics.iter().map(|t| {
        Row::new(vec![
            t.name.clone(),
            t.partitions.to_string(),
            t.message_count.to_string(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ],
    )
    .header(header_row(&["Topic", "Partitions", "# Messages"]))
    .block(Block::default().borders(Borders::ALL))
    .row_highlight_style(highlight());

    f.render_stateful_widget(table, area, &mut app.topics_state);
}

fn draw_messages(f: &mut Frame, app: &mut HarnessApp, area: Rect) {
    let rows = app.messages.iter().map(|m| {
        Row::new(vec![
            m.index.to_string(),
            m.partition.to_string(),
            m.offset.to_string(),
            m.key.clone(),
            format_bytes(m.size),
            m.preview.clone(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["#", "Partition", "Offset", "Key", "Size", "Preview"]))
    .block(Block::default().borders(Borders::ALL))
    .row_highlight_style(highlight());

    f.render_stateful_widget(table, area, &mut app.messages_state);
}
