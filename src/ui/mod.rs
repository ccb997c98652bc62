use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::feed::{Category, DisplayImage};

/// Seconds left at which the countdown turns to the warning color
const COUNTDOWN_WARN_SECS: u32 = 5;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Title / status line
            Constraint::Length(3), // Countdown + total
            Constraint::Min(6),    // Category columns
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_counters(f, app, chunks[1]);
    draw_columns(f, app, chunks[2]);
    draw_footer(f, app, chunks[3]);

    if app.popup == Popup::Help {
        draw_help_popup(f, app);
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    // Status message wins over the title
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(theme.accent)))
    } else {
        Line::from(vec![
            Span::styled("Cat and Dog Images", Style::default().fg(theme.header).add_modifier(Modifier::BOLD)),
            Span::styled(" │ ", Style::default().fg(theme.text_dim)),
            Span::styled(app.poller.endpoint(), Style::default().fg(theme.text_dim)),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_counters(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let state = app.poller.state();
    let remaining = state.seconds_remaining();

    let countdown_color = if remaining <= COUNTDOWN_WARN_SECS { theme.warning } else { theme.accent };

    let mut spans = vec![
        Span::styled("󰔟 Next image in: ", Style::default().fg(theme.text)),
        Span::styled(remaining.to_string(), Style::default().fg(countdown_color).add_modifier(Modifier::BOLD)),
        Span::styled(" seconds", Style::default().fg(theme.text)),
        Span::styled("  │  ", Style::default().fg(theme.inactive)),
        Span::styled("Total images retrieved: ", Style::default().fg(theme.text)),
        Span::styled(state.total_retrieved.to_string(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    ];
    if app.poller.in_flight() {
        spans.push(Span::styled("  │  ", Style::default().fg(theme.inactive)));
        spans.push(Span::styled("fetching…", Style::default().fg(theme.text_dim)));
    }

    let counters = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.inactive)),
        );

    f.render_widget(counters, area);
}

fn draw_columns(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)])
        .split(area);

    for (category, chunk) in Category::ALL.into_iter().zip(chunks.iter()) {
        draw_category_column(f, app, category, *chunk);
    }
}

fn draw_category_column(f: &mut Frame, app: &App, category: Category, area: Rect) {
    let theme = &app.theme;
    let feed = app.poller.state().feed(category);
    let is_active = app.focus == category;
    let column_color = theme.category(category);

    let border_color = if is_active { column_color } else { theme.inactive };
    let title_style = if is_active {
        Style::default().fg(column_color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.inactive)
    };

    let title = match feed.latest() {
        Some(latest) => format!(" {} ({}/{}) · last {} ", category.title(), feed.len(), feed.capacity(), latest.captured_at),
        None => format!(" {} ({}/{}) ", category.title(), feed.len(), feed.capacity()),
    };

    let block = Block::default()
        .title(Span::styled(title, title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    // Responsive: drop the source preview on narrow columns
    let show_src = area.width > 50;

    let header = {
        let mut cells = vec![
            Span::styled("#", Style::default().fg(theme.header)),
            Span::styled("Captured", Style::default().fg(theme.header)),
            Span::styled("Size", Style::default().fg(theme.header)),
        ];
        if show_src {
            cells.push(Span::styled("Source", Style::default().fg(theme.header)));
        }
        Row::new(cells)
    };

    let rows: Vec<Row> = if feed.is_empty() {
        vec![Row::new(vec![
            Span::raw(""),
            Span::styled(format!("No {} yet", category.title().to_lowercase()), Style::default().fg(theme.text_dim)),
        ])]
    } else {
        let src_width = area.width.saturating_sub(32) as usize;
        feed.iter()
            .enumerate()
            .map(|(i, image)| {
                let row_style = if is_active && i == app.selected(category) {
                    Style::default().bg(theme.bg_selected).fg(theme.text)
                } else {
                    Style::default()
                };

                let mut cells = vec![
                    Span::styled(format!("{}", i + 1), Style::default().fg(column_color)),
                    Span::styled(image.captured_at.clone(), Style::default().fg(theme.text)),
                    Span::styled(format_bytes(image.approx_bytes()), Style::default().fg(theme.text_dim)),
                ];
                if show_src {
                    cells.push(Span::styled(src_preview(image, src_width), Style::default().fg(theme.text_dim)));
                }
                Row::new(cells).style(row_style)
            })
            .collect()
    };

    let widths = if show_src {
        vec![
            Constraint::Length(3),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Min(10),
        ]
    } else {
        vec![
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(10),
        ]
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(block);

    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let key = |k: &'static str| Span::styled(k, Style::default().fg(theme.accent));
    let label = |l: &'static str| Span::styled(l, Style::default().fg(theme.text_dim));

    let footer = Paragraph::new(Line::from(vec![
        key("Tab"), label(" column  "),
        key("↑↓"), label(" select  "),
        key("R"), label(" fetch now  "),
        key("?"), label(" help  "),
        key("q"), label(" quit"),
    ]))
    .alignment(Alignment::Center);

    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 60 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(theme.header).add_modifier(Modifier::BOLD)))
    };
    let entry = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(k, Style::default().fg(theme.accent)),
            Span::raw(what),
        ])
    };

    let period = app.poller.state().countdown.period();
    let help_text = vec![
        section("═══ Navigation ═══"),
        entry("  Tab ←/→   ", "Switch between Cats and Dogs"),
        entry("  ↑/↓ j/k   ", "Move up/down in the focused column"),
        Line::from(""),
        section("═══ Polling ═══"),
        entry("  R         ", "Fetch the next image now"),
        Line::from(Span::raw(format!(
            "            A new image is requested every {}s.",
            period
        ))),
        Line::from(Span::raw("            A rate-limited backend sets the countdown itself.")),
        Line::from(""),
        section("═══ Modes ═══"),
        entry("  pawpoll             ", "Launch this TUI"),
        entry("  pawpoll --headless  ", "Poll and log without a UI"),
        entry("  pawpoll --once      ", "Fetch one image, print JSON"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(theme.text_dim)),
            Span::styled("h", Style::default().fg(theme.accent)),
            Span::styled("/", Style::default().fg(theme.text_dim)),
            Span::styled("?", Style::default().fg(theme.accent)),
            Span::styled("/", Style::default().fg(theme.text_dim)),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::styled(" to close", Style::default().fg(theme.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 pawpoll Help ", Style::default().fg(theme.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

/// Data URI cut down to fit a column
fn src_preview(image: &DisplayImage, width: usize) -> String {
    let src = image.src();
    if src.len() <= width {
        return src;
    }
    let keep = width.saturating_sub(1);
    let mut preview: String = src.chars().take(keep).collect();
    preview.push('…');
    preview
}

/// Format bytes to human-readable string
fn format_bytes(bytes: usize) -> String {
    const KIB: usize = 1024;
    const MIB: usize = KIB * 1024;

    if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

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
