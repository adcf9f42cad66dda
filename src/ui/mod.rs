mod components;

use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::{App, InputMode, Popup, Section};
use crate::theme::Theme;
use crate::widgets::countdown::{format_hms, Field};
use components::{centered_rect, key_hints, section_block};

static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),  // Info line
            Constraint::Length(8),  // Countdown box
            Constraint::Min(12),    // Lottery box
            Constraint::Length(1),  // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_timer_box(f, app, chunks[1]);
    draw_lottery_box(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    if app.popup == Popup::Help {
        draw_help_popup(f);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > draw in progress > running countdown > ready
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(warning())))
    } else if app.lottery.is_drawing() {
        Line::from(Span::styled("Drawing a name...", Style::default().fg(text_dim())))
    } else if app.countdown.is_running() {
        Line::from(vec![
            Span::styled("󰔟 ", Style::default().fg(accent())),
            Span::styled(format_hms(app.countdown.time_left()), Style::default().fg(text_dim())),
        ])
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_timer_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Timer;
    let block = section_block(" Countdown Timer ", is_active);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // HH:MM:SS
            Constraint::Length(1), // Progress
            Constraint::Length(1), // Duration fields
            Constraint::Length(1), // Controls
            Constraint::Length(1), // Time's up
            Constraint::Min(0),
        ])
        .split(inner);

    let countdown = &app.countdown;
    let time_color = if countdown.is_finished() { danger() } else { text() };
    let time = Paragraph::new(Span::styled(
        format_hms(countdown.time_left()),
        Style::default().fg(time_color).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    f.render_widget(time, rows[0]);

    if countdown.total_seconds() > 0 {
        let gauge_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(4)])
            .split(rows[1])[1];
        let progress = countdown.progress();
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(success()).bg(bg_selected()))
            .ratio(progress)
            .label(format!("{:.0}%", progress * 100.0));
        f.render_widget(gauge, gauge_area);
    }

    let fields = Paragraph::new(Line::from(duration_field_spans(app, is_active)))
        .alignment(Alignment::Center);
    f.render_widget(fields, rows[2]);

    let toggle = if countdown.is_running() { "Pause" } else { "Start" };
    let controls = Paragraph::new(Line::from(key_hints(&[
        ("Space", toggle),
        ("r", "Reset"),
    ])))
    .alignment(Alignment::Center);
    f.render_widget(controls, rows[3]);

    if countdown.is_finished() {
        let done = Paragraph::new(Span::styled(
            "Time's up! ⏰",
            Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center);
        f.render_widget(done, rows[4]);
    }
}

fn duration_field_spans(app: &App, is_active: bool) -> Vec<Span<'static>> {
    let editable = app.countdown.is_editable();
    let mut spans = Vec::new();

    for (i, field) in [Field::Hours, Field::Minutes, Field::Seconds].into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" : ", Style::default().fg(text_dim())));
        }

        let value_style = if !editable {
            Style::default().fg(inactive())
        } else if is_active && field == app.selected_field {
            Style::default()
                .fg(accent())
                .bg(bg_selected())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text())
        };

        spans.push(Span::styled(format!("{} ", field.label()), Style::default().fg(text_dim())));
        spans.push(Span::styled(format!("[{:02}]", app.countdown.field(field)), value_style));
    }

    spans
}

fn draw_lottery_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Lottery;
    let block = section_block(" Name Lottery ", is_active);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    draw_name_entry(f, app, columns[0], is_active);
    draw_draw_panel(f, app, columns[1]);
}

fn draw_name_entry(f: &mut Frame, app: &App, area: Rect, is_active: bool) {
    let input_height = match app.input_mode {
        InputMode::Single => 3,
        InputMode::Bulk => 6,
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),            // Tabs
            Constraint::Length(input_height), // Input box
            Constraint::Min(3),               // Pool
        ])
        .split(area);

    let selected_tab: usize = match app.input_mode {
        InputMode::Single => 0,
        InputMode::Bulk => 1,
    };
    let tabs = Tabs::new(vec!["Single Name", "Bulk Input"])
        .select(selected_tab)
        .style(Style::default().fg(text_dim()))
        .highlight_style(Style::default().fg(accent()).add_modifier(Modifier::BOLD))
        .divider("│");
    f.render_widget(tabs, rows[0]);

    let (title, value, placeholder) = match app.input_mode {
        InputMode::Single => (" Name (Enter adds) ", app.name_input.as_str(), "Enter a name..."),
        InputMode::Bulk => (
            " Names (F2 adds group) ",
            app.bulk_input.as_str(),
            "Alice, Bob, Charlie\nDavid\nEve",
        ),
    };
    let input_text = if value.is_empty() {
        Text::styled(placeholder, Style::default().fg(text_dim()))
    } else {
        let mut content = value.to_string();
        if is_active {
            content.push('▏');
        }
        Text::styled(content, Style::default().fg(text()))
    };
    let border = if is_active { accent() } else { inactive() };
    let input = Paragraph::new(input_text).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(title, Style::default().fg(text_dim())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    );
    f.render_widget(input, rows[1]);

    draw_pool(f, app, rows[2], is_active);
}

fn draw_pool(f: &mut Frame, app: &App, area: Rect, is_active: bool) {
    let lottery = &app.lottery;
    let block = Block::default()
        .title(Span::styled(
            format!(" Names Pool ({}) ", lottery.pool().len()),
            Style::default().fg(header()),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    if lottery.pool().is_empty() {
        let message = if lottery.all_drawn() {
            "All names drawn! Ctrl+R to start over."
        } else {
            "No names added yet"
        };
        let empty = Paragraph::new(Span::styled(message, Style::default().fg(text_dim())))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = lottery
        .pool()
        .iter()
        .map(|name| ListItem::new(Span::styled(format!("{} ×", name), Style::default().fg(text()))))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(bg_selected()).fg(danger()));

    let mut state = ListState::default();
    if is_active {
        state.select(Some(app.selected_name));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_draw_panel(f: &mut Frame, app: &App, area: Rect) {
    let lottery = &app.lottery;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    let result: Vec<Line> = if lottery.is_drawing() {
        vec![
            Line::from(Span::styled(spinner_frame(), Style::default().fg(accent()))),
            Line::from(Span::styled("Drawing a name...", Style::default().fg(text_dim()))),
        ]
    } else if let Some(name) = lottery.drawn() {
        vec![
            Line::from(Span::styled("Winner:", Style::default().fg(text_dim()))),
            Line::from(Span::styled(
                name.to_string(),
                Style::default().fg(success()).add_modifier(Modifier::BOLD),
            )),
        ]
    } else if lottery.pool().is_empty() {
        vec![Line::from(Span::styled("Add names to draw", Style::default().fg(text_dim())))]
    } else {
        vec![Line::from(Span::styled("Ctrl+D to draw a name", Style::default().fg(text_dim())))]
    };

    let draw_border = if lottery.is_drawing() { accent() } else { inactive() };
    let panel = Paragraph::new(result).alignment(Alignment::Center).block(
        Block::default()
            .title(Span::styled(" Draw ", Style::default().fg(header())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(draw_border)),
    );
    f.render_widget(panel, rows[0]);

    if lottery.all_drawn() {
        let group = lottery.original_group();
        let lines = vec![
            Line::from(Span::styled("🎉 All names have been drawn!", Style::default().fg(success()))),
            Line::from(Span::styled(
                "Ctrl+R starts a new round with the same group.",
                Style::default().fg(text_dim()),
            )),
            Line::from(""),
            Line::from(Span::styled(group.join(", "), Style::default().fg(text()))),
        ];
        let original = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(Span::styled(
                    format!(" Original Group ({}) ", group.len()),
                    Style::default().fg(header()),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(inactive())),
        );
        f.render_widget(original, rows[1]);
    }
}

fn spinner_frame() -> &'static str {
    let tick = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() / 100)
        .unwrap_or(0);
    SPINNER[(tick % SPINNER.len() as u128) as usize]
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.section {
        Section::Timer => vec![
            ("←→", "Field"),
            ("0-9", "Edit"),
            ("↑↓", "Step"),
            ("Space", "Start/Pause"),
            ("r", "Reset"),
            ("Tab", "Lottery"),
            ("q", "Quit"),
        ],
        Section::Lottery => vec![
            ("^B", "Single/Bulk"),
            ("^D", "Draw"),
            ("Del", "Remove"),
            ("^X", "Clear"),
            ("^R", "Reset"),
            ("Tab", "Timer"),
            ("F1", "Help"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 80 { 5 } else { hints.len() };
    let shown: Vec<(&str, &str)> = hints.into_iter().take(max_hints).collect();

    let footer = Paragraph::new(Line::from(key_hints(&shown))).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let heading = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |key: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(key, Style::default().fg(accent())),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        heading("═══ General ═══"),
        entry("  Tab       ", "Switch between timer and lottery"),
        entry("  F1        ", "This help"),
        entry("  Ctrl+C    ", "Quit (q also quits from the timer)"),
        Line::from(""),
        heading("═══ Countdown Timer ═══"),
        entry("  ←/→       ", "Select hours / minutes / seconds"),
        entry("  0-9       ", "Type into the selected field"),
        entry("  ↑/↓ Bksp  ", "Step the field / drop last digit"),
        entry("  Space     ", "Start, pause or resume"),
        entry("  r         ", "Reset (unlocks the duration)"),
        Line::from(""),
        heading("═══ Name Lottery ═══"),
        entry("  Ctrl+B    ", "Switch Single Name / Bulk Input"),
        entry("  Enter     ", "Add name (single) / new line (bulk)"),
        entry("  F2        ", "Add group from bulk input"),
        entry("  Ctrl+D    ", "Draw a name"),
        entry("  ↑/↓ Del   ", "Select / remove a name from the pool"),
        entry("  Ctrl+X    ", "Clear all names"),
        entry("  Ctrl+R    ", "Restore the group after all are drawn"),
        Line::from(""),
        Line::from(Span::raw("  Bulk input accepts names separated by commas or new lines.")),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" timedraw Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}
