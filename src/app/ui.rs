use std::cmp::Ordering;

use tui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Span, Spans},
    widgets::{
        canvas::{Canvas, Line},
        Block, Borders, Cell, Paragraph, Row, Table, Wrap,
    },
    Frame,
};

use crate::app::state::{App, InputMode, SortColumn, Status};
use crate::models::market::MarketRecord;
use crate::utils::formatters::{
    format_compact_currency, format_currency, format_percent, format_supply,
};
use crate::utils::sparkline::{scale_series, SparklineConfig, SparklineGeometry};

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(if app.input_mode == InputMode::Editing {
            vec![
                Constraint::Min(10),   // Markets + detail
                Constraint::Length(3), // Help text
                Constraint::Length(3), // Search input
            ]
        } else {
            vec![
                Constraint::Min(10),   // Markets + detail
                Constraint::Length(3), // Help text
            ]
        })
        .split(size);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[0]);

    draw_markets(f, app, body[0]);
    draw_detail(f, app, body[1]);
    draw_help(f, app, chunks[1]);

    if app.input_mode == InputMode::Editing {
        draw_input(f, app, chunks[2]);
    }
}

fn change_style(value: Option<f64>) -> Style {
    match value {
        Some(v) if v > 0.0 => Style::default().fg(Color::Green),
        Some(v) if v < 0.0 => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Gray),
    }
}

fn markets_title(app: &App) -> Span<'static> {
    let scope = match &app.query {
        Some(q) => format!("Search \"{}\"", q),
        None => "Markets".to_string(),
    };

    match &app.status {
        Status::Loading => Span::raw(format!("{} (Loading…)", scope)),
        Status::Error(error) => Span::styled(
            format!("{} (Error: {})", scope, error),
            Style::default().fg(Color::Red),
        ),
        Status::NoResults(q) => Span::styled(
            format!("No results for \"{}\"", q),
            Style::default().fg(Color::Yellow),
        ),
        Status::Idle => match &app.last_update {
            Some(time) => Span::raw(format!(
                "{} (Last Updated: {})",
                scope,
                time.format("%H:%M:%S")
            )),
            None => Span::raw(format!("{} (Not Updated Yet)", scope)),
        },
    }
}

fn draw_markets<B: Backend>(f: &mut Frame<B>, app: &mut App, area: Rect) {
    let header_cells = [
        ("#", Some(SortColumn::Rank)),
        ("Symbol", None),
        ("Price", Some(SortColumn::Price)),
        ("24h %", Some(SortColumn::Change24h)),
        ("7d %", None),
        ("Volume", Some(SortColumn::Volume24h)),
        ("Market Cap", Some(SortColumn::MarketCap)),
    ]
    .iter()
    .map(|(h, col)| {
        let active = *col == Some(app.sort_column);
        let mut text = (*h).to_string();
        if active {
            text = format!("{} {}", text, if app.sort_ascending { "↑" } else { "↓" });
        }
        Cell::from(text).style(
            Style::default()
                .fg(if active { Color::Cyan } else { Color::Yellow })
                .add_modifier(Modifier::BOLD),
        )
    });

    let rows = app.items.iter().enumerate().map(|(i, record)| {
        let mut row = Row::new(vec![
            Cell::from(record.rank.map_or("—".to_string(), |r| r.to_string())),
            Cell::from(record.symbol.clone()),
            Cell::from(format_currency(record.price)),
            Cell::from(format_percent(record.change_24h_pct))
                .style(change_style(record.change_24h_pct)),
            Cell::from(format_percent(record.change_7d_pct))
                .style(change_style(record.change_7d_pct)),
            Cell::from(format_compact_currency(record.volume_24h)),
            Cell::from(format_compact_currency(record.market_cap)),
        ]);

        if app.table_state.selected() == Some(i) {
            row = row.style(Style::default().add_modifier(Modifier::REVERSED));
        }

        row
    });

    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let table = Table::new(rows)
        .header(header)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(markets_title(app)))
        .widths(&[
            Constraint::Length(5),  // Rank
            Constraint::Length(8),  // Symbol
            Constraint::Length(16), // Price
            Constraint::Length(9),  // 24h %
            Constraint::Length(9),  // 7d %
            Constraint::Length(9),  // Volume
            Constraint::Length(11), // Market Cap
        ])
        .column_spacing(1);

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_detail<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let record = match app.selected() {
        Some(record) => record,
        None => {
            let placeholder = Paragraph::new("Select a coin to see its details")
                .block(Block::default().title("Details").borders(Borders::ALL))
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center);
            f.render_widget(placeholder, area);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(12)])
        .split(area);

    draw_stats(f, record, chunks[0]);
    draw_sparkline(f, app, record, chunks[1]);
}

fn stat_line(label: &str, value: String) -> Spans<'static> {
    Spans::from(vec![
        Span::styled(format!("{:<12}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn extreme_line(label: &str, price: Option<f64>, change: Option<f64>) -> Spans<'static> {
    Spans::from(vec![
        Span::styled(format!("{:<12}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(format_currency(price), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(format_percent(change), change_style(change)),
    ])
}

fn draw_stats<B: Backend>(f: &mut Frame<B>, record: &MarketRecord, area: Rect) {
    let mut subtitle = Vec::new();
    if let Some(badge) = record.badge() {
        subtitle.push(Span::styled(badge, Style::default().fg(Color::Cyan)));
        subtitle.push(Span::raw("  "));
    }
    subtitle.push(Span::styled(
        format_percent(record.change_24h_pct),
        change_style(record.change_24h_pct).add_modifier(Modifier::BOLD),
    ));
    subtitle.push(Span::styled(" today", Style::default().fg(Color::DarkGray)));

    let mut text = vec![
        Spans::from(vec![
            Span::styled(
                record.name.clone(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(record.symbol.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Spans::from(subtitle),
        Spans::from(vec![Span::raw("")]),
        stat_line("Price", format_currency(record.price)),
        Spans::from(vec![
            Span::styled(format!("{:<12}", "Change"), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("1h {}", format_percent(record.change_1h_pct)),
                change_style(record.change_1h_pct),
            ),
            Span::raw("  "),
            Span::styled(record.notes(), Style::default().fg(Color::Gray)),
        ]),
        stat_line(
            "24h Range",
            format!("{} – {}", format_currency(record.low_24h), format_currency(record.high_24h)),
        ),
        stat_line("Market Cap", format_compact_currency(record.market_cap)),
        stat_line("Volume 24h", format_compact_currency(record.volume_24h)),
        stat_line(
            "Supply",
            format_supply(record.supply_circulating, record.supply_total, record.supply_max),
        ),
    ];

    if record.ath.is_some() || record.atl.is_some() {
        text.push(extreme_line("ATH", record.ath, record.ath_change_pct));
        text.push(extreme_line("ATL", record.atl, record.atl_change_pct));
    }

    let stats = Paragraph::new(text)
        .block(Block::default()
            .title(Span::styled(" Details ",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            ))
            .borders(Borders::ALL))
        .wrap(Wrap { trim: true });

    f.render_widget(stats, area);
}

fn draw_sparkline<B: Backend>(f: &mut Frame<B>, app: &App, record: &MarketRecord, area: Rect) {
    let block = Block::default().title("7d").borders(Borders::ALL);

    let config = SparklineConfig {
        fill_area: app.fill_area,
        label_format: app.compact_labels.then_some(compact_axis_label as fn(f64) -> String),
        ..SparklineConfig::default()
    };

    let geometry = match scale_series(&record.sparkline_7d, &config) {
        Some(geometry) => geometry,
        None => {
            let empty = Paragraph::new("No 7-day history")
                .block(block)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        }
    };

    let mut finite = record.sparkline_7d.iter().copied().filter(|v| v.is_finite());
    let opening = finite.next().unwrap_or_default();
    let closing = finite.last().unwrap_or(opening);
    let trend = if closing < opening { Color::Red } else { Color::Green };

    let chart = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([0.0, geometry.width])
        .y_bounds([0.0, geometry.height])
        .paint(|ctx| paint_sparkline(ctx, &geometry, trend, opening));

    f.render_widget(chart, area);
}

/// Geometry is laid out with y growing downward; the canvas grows upward
fn paint_sparkline(
    ctx: &mut tui::widgets::canvas::Context,
    geometry: &SparklineGeometry,
    color: Color,
    opening: f64,
) {
    let flip = |y: f64| geometry.height - y;
    let left = geometry.padding.left;
    let right = left + geometry.inner_width;
    let top = flip(geometry.padding.top);
    let bottom = flip(geometry.baseline());

    for tick in &geometry.y_grid_lines {
        let y = flip(tick.y);
        ctx.draw(&Line { x1: left, y1: y, x2: right, y2: y, color: Color::DarkGray });
        // Levels above the week's opening price read green, below it red
        let tint = match tick.value.partial_cmp(&opening) {
            Some(Ordering::Greater) => Color::Green,
            Some(Ordering::Less) => Color::Red,
            _ => Color::Gray,
        };
        ctx.print(0.0, y, Span::styled(tick.label.clone(), Style::default().fg(tint)));
    }
    for tick in &geometry.x_grid_lines {
        ctx.draw(&Line { x1: tick.x, y1: bottom, x2: tick.x, y2: top, color: Color::DarkGray });
        ctx.print(
            tick.x,
            bottom - geometry.padding.bottom * 0.6,
            Span::styled(
                days_ago_label(tick.index, geometry.sample_count),
                Style::default().fg(Color::DarkGray),
            ),
        );
    }
    if !geometry.y_grid_lines.is_empty() {
        ctx.draw(&Line { x1: left, y1: bottom, x2: left, y2: top, color: Color::Gray });
        ctx.draw(&Line { x1: left, y1: bottom, x2: right, y2: bottom, color: Color::Gray });
    }
    ctx.layer();

    if let Some(outline) = &geometry.area_outline {
        for (x, y) in outline {
            ctx.draw(&Line { x1: *x, y1: bottom, x2: *x, y2: flip(*y), color: Color::DarkGray });
        }
        ctx.layer();
    }

    // Braille dots are one unit wide; thicker strokes get a parallel pass
    let passes: &[f64] = if geometry.stroke_width > 1.0 { &[0.0, 0.5] } else { &[0.0] };
    for offset in passes {
        for pair in geometry.line_points.windows(2) {
            let (x1, y1) = pair[0];
            let (x2, y2) = pair[1];
            ctx.draw(&Line {
                x1,
                y1: flip(y1) + offset,
                x2,
                y2: flip(y2) + offset,
                color,
            });
        }
    }
}

fn compact_axis_label(value: f64) -> String {
    format_compact_currency(Some(value))
}

/// Labels a sample index by its distance from the newest sample, assuming the
/// series spans seven days
fn days_ago_label(index: usize, sample_count: usize) -> String {
    let last = sample_count.saturating_sub(1);
    if last == 0 || index >= last {
        return "now".to_string();
    }
    let days = ((last - index) as f64 * 7.0 / last as f64).round() as u32;
    if days == 0 {
        "now".to_string()
    } else {
        format!("-{}d", days)
    }
}

fn draw_help<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let text = match app.input_mode {
        InputMode::Normal => vec![
            Spans::from(vec![
                key("q"),
                Span::raw(": Quit | "),
                key("↓/j"),
                Span::raw(" "),
                key("↑/k"),
                Span::raw(": Navigate | "),
                key("/"),
                Span::raw(": Search | "),
                key("Esc"),
                Span::raw(": Clear | "),
                key("s"),
                Span::raw(": Sort | "),
                key("d"),
                Span::raw(": Direction | "),
                key("f"),
                Span::raw(": Fill | "),
                key("c"),
                Span::raw(": Compact Axis | "),
                key("r"),
                Span::raw(": Refresh"),
            ])
        ],
        InputMode::Editing => vec![
            Spans::from(vec![
                key("Enter"),
                Span::raw(": Search (empty clears) | "),
                key("Esc"),
                Span::raw(": Cancel"),
            ])
        ],
    };

    let help = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    f.render_widget(help, area);
}

fn draw_input<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let input = Paragraph::new(app.input.as_ref())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Search CoinGecko (e.g. PEPE, BONK, DOGE)"));

    f.render_widget(input, area);
}
