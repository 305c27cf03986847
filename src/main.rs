use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use ipl_terminal::aggregate::{CountEntry, SeasonTrend};
use ipl_terminal::dataset::{self, abbreviate};
use ipl_terminal::export;
use ipl_terminal::state::{AppState, Delta, Screen, apply_delta, screen_label};

struct App {
    state: AppState,
    should_quit: bool,
    tx: mpsc::Sender<Delta>,
    export_dir: PathBuf,
}

impl App {
    fn new(state: AppState, tx: mpsc::Sender<Delta>) -> Self {
        let export_dir = std::env::var("IPL_EXPORT_DIR")
            .ok()
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            state,
            should_quit: false,
            tx,
            export_dir,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Overview,
            KeyCode::Char('2') => self.state.screen = Screen::Seasons,
            KeyCode::Char('3') => self.state.screen = Screen::Venues,
            KeyCode::Char('4') => self.state.screen = Screen::Toss,
            KeyCode::Char('5') => self.state.screen = Screen::Preview,
            KeyCode::Char('s') => self.state.cycle_season_next(),
            KeyCode::Char('S') => self.state.cycle_season_prev(),
            KeyCode::Char('j') | KeyCode::Down => self.state.scroll_preview_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.scroll_preview_up(1),
            KeyCode::PageDown => self.state.scroll_preview_down(10),
            KeyCode::PageUp => self.state.scroll_preview_up(10),
            KeyCode::Char('x') => self.start_export(),
            KeyCode::Char('?') => self.state.show_help = !self.state.show_help,
            KeyCode::Esc => self.state.show_help = false,
            _ => {}
        }
    }

    fn start_export(&mut self) {
        if self.state.export.active && !self.state.export.done {
            self.state.push_log("[INFO] Export already running");
            return;
        }
        let label = self.state.season_label().to_string();
        let path = export::default_export_path(&self.export_dir, &label);
        self.state
            .push_log(format!("[INFO] Exporting {} -> {}", label, path.display()));
        export::spawn_export(self.tx.clone(), path, label, self.state.filtered.clone());
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let data_path = resolve_data_path(std::env::args().skip(1));
    if !data_path.exists() {
        return Err(anyhow!(
            "dataset not found at {}: supply a matches CSV via --data <path> or IPL_DATA_PATH",
            data_path.display()
        ));
    }

    let summary = dataset::load_matches(&data_path)?;
    let mut state = AppState::new(summary.records, data_path.display().to_string());
    state.push_log(format!(
        "[INFO] Loaded {} matches across {} seasons from {}",
        state.records.len(),
        state.seasons.len(),
        data_path.display()
    ));
    if summary.skipped > 0 {
        state.push_log(format!("[WARN] Skipped {} unreadable rows", summary.skipped));
    }
    if state.records.is_empty() {
        state.push_log("[ALERT] Dataset has no readable rows; nothing to chart");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(state, tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn resolve_data_path(args: impl Iterator<Item = String>) -> PathBuf {
    let mut args = args.peekable();
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--data=") {
            return PathBuf::from(value);
        }
        if arg == "--data" {
            if let Some(value) = args.next() {
                return PathBuf::from(value);
            }
        }
    }
    std::env::var("IPL_DATA_PATH")
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("matches.csv"))
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.state.maybe_clear_export(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Overview => render_overview(frame, chunks[1], &app.state),
        Screen::Seasons => render_seasons(frame, chunks[1], &app.state),
        Screen::Venues => render_venues(frame, chunks[1], &app.state),
        Screen::Toss => render_toss(frame, chunks[1], &app.state),
        Screen::Preview => render_preview(frame, chunks[1], &app.state),
    }

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[2]);

    if app.state.show_help {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = format!(
        "IPL TERMINAL | {} | {} | {} matches",
        state.season_label(),
        screen_label(state.screen),
        state.stats.metrics.total_matches
    );
    let line1 = format!("  .|.  {}", title);
    let line2 = "  |||".to_string();
    let line3 = "  ---".to_string();
    format!("{line1}\n{line2}\n{line3}")
}

fn footer_text(state: &AppState) -> String {
    let keys = match state.screen {
        Screen::Preview => {
            "1-4 Charts | j/k/↑/↓ Scroll | PgUp/PgDn Page | s/S Season | x Export | ? Help | q Quit"
        }
        _ => "1 Overview | 2 Seasons | 3 Venues | 4 Toss | 5 Preview | s/S Season | x Export | ? Help | q Quit",
    };
    if state.export.active {
        format!(
            "[Export {}/{} {}] {}",
            state.export.current, state.export.total, state.export.message, keys
        )
    } else {
        keys.to_string()
    }
}

fn render_overview(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(area);

    render_metric_row(frame, sections[0], state);

    if state.stats.team_wins.is_empty() {
        let empty = Paragraph::new("No decided matches in this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Most Winning Teams").borders(Borders::ALL));
        frame.render_widget(empty, sections[1]);
    } else {
        let chart = team_wins_chart(&state.stats.team_wins, sections[1].width)
            .block(Block::default().title("Most Winning Teams").borders(Borders::ALL));
        frame.render_widget(chart, sections[1]);
    }

    let console = Paragraph::new(console_text(state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, sections[2]);
}

fn render_metric_row(frame: &mut Frame, area: Rect, state: &AppState) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let metrics = &state.stats.metrics;
    let span = metrics
        .date_span
        .as_ref()
        .map(|(first, last)| format!("{first} to {last}"))
        .unwrap_or_default();
    render_metric(frame, cells[0], "Total Matches", &metrics.total_matches.to_string(), &span);
    render_metric(frame, cells[1], "Teams", &metrics.total_teams.to_string(), "");
    let (top_team, team_detail) = leader_cell(metrics.top_team.as_ref(), "wins");
    render_metric(frame, cells[2], "Top Team", &top_team, &team_detail);
    let (top_venue, venue_detail) = leader_cell(metrics.top_venue.as_ref(), "matches");
    render_metric(frame, cells[3], "Top Venue", &top_venue, &venue_detail);
}

fn leader_cell(entry: Option<&CountEntry>, unit: &str) -> (String, String) {
    match entry {
        Some(entry) => (entry.name.clone(), format!("{} {unit}", entry.count)),
        None => ("n/a".to_string(), String::new()),
    }
}

fn render_metric(frame: &mut Frame, area: Rect, title: &str, value: &str, detail: &str) {
    let text = Text::from(vec![
        Line::styled(
            value.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::styled(detail.to_string(), Style::default().fg(Color::DarkGray)),
    ]);
    let cell = Paragraph::new(text)
        .block(Block::default().title(title.to_string()).borders(Borders::ALL));
    frame.render_widget(cell, area);
}

fn render_seasons(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    if state.stats.matches_per_season.is_empty() {
        let empty = Paragraph::new("No matches in this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Matches per Season").borders(Borders::ALL));
        frame.render_widget(empty, sections[0]);
    } else {
        let chart = season_counts_chart(&state.stats.matches_per_season, sections[0].width)
            .block(Block::default().title("Matches per Season").borders(Borders::ALL));
        frame.render_widget(chart, sections[0]);
    }

    render_trend(frame, sections[1], &state.stats.season_trend);
}

fn render_trend(frame: &mut Frame, area: Rect, trend: &SeasonTrend) {
    let block = Block::default()
        .title("Top Team Wins per Season")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if trend.teams.is_empty() || inner.height < 2 {
        let empty = Paragraph::new("No decided matches in this selection")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    frame.render_widget(Paragraph::new(trend_legend(trend)), rows[0]);
    frame.render_widget(trend_chart(trend, rows[1].width), rows[1]);
}

fn render_venues(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title("Top Venues (matches hosted)")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let venues = &state.stats.top_venues;
    if venues.is_empty() {
        let empty = Paragraph::new("No matches in this selection")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }
    if inner.height == 0 {
        return;
    }

    let widths = venue_columns();
    let max = venues.first().map(|entry| entry.count).unwrap_or(1);
    let visible = inner.height as usize;

    for (i, entry) in venues.iter().take(visible).enumerate() {
        let row_area = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        render_cell_text(frame, cols[0], &entry.name, Style::default());
        frame.render_widget(count_bar(entry.count, max), cols[1]);
        render_cell_text(
            frame,
            cols[2],
            &format!("{:>5}", entry.count),
            Style::default().add_modifier(Modifier::BOLD),
        );
    }
}

fn venue_columns() -> [Constraint; 3] {
    [
        Constraint::Length(38),
        Constraint::Min(12),
        Constraint::Length(7),
    ]
}

fn render_toss(frame: &mut Frame, area: Rect, state: &AppState) {
    let toss = &state.stats.toss_decisions;
    if toss.is_empty() {
        let empty = Paragraph::new("No toss data in this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title("Toss Decisions").borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(4)])
        .split(area);

    let chart = toss_chart(toss)
        .block(Block::default().title("Toss Decisions").borders(Borders::ALL));
    frame.render_widget(chart, sections[0]);

    let total: usize = toss.iter().map(|entry| entry.count).sum();
    let mut lines = Vec::new();
    for entry in toss {
        lines.push(format!(
            "{:<8} {:>5}  ({:.1}%)",
            entry.name,
            entry.count,
            entry.count as f64 * 100.0 / total as f64
        ));
    }
    let summary = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Share").borders(Borders::ALL));
    frame.render_widget(summary, sections[1]);
}

fn render_preview(frame: &mut Frame, area: Rect, state: &AppState) {
    let total = state.filtered.len();
    let block_title = |start: usize, end: usize| {
        format!("Matches ({}-{} of {})", start, end, total)
    };

    if total == 0 {
        let empty = Paragraph::new("No matches in this selection")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().title(block_title(0, 0)).borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    }

    let widths = preview_columns();
    let outer = Rect { ..area };
    let body_height = outer.height.saturating_sub(3) as usize;
    let visible = body_height.max(1);
    let max_start = total.saturating_sub(visible);
    let start = state.preview_scroll.min(max_start);
    let end = (start + visible).min(total);

    let block = Block::default()
        .title(block_title(start + 1, end))
        .borders(Borders::ALL);
    let inner = block.inner(outer);
    frame.render_widget(block, outer);

    if inner.height == 0 {
        return;
    }

    let header_area = Rect {
        x: inner.x,
        y: inner.y,
        width: inner.width,
        height: 1,
    };
    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(header_area);
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    render_cell_text(frame, header_cols[0], "Season", header_style);
    render_cell_text(frame, header_cols[1], "Date", header_style);
    render_cell_text(frame, header_cols[2], "Team 1", header_style);
    render_cell_text(frame, header_cols[3], "Team 2", header_style);
    render_cell_text(frame, header_cols[4], "Winner", header_style);
    render_cell_text(frame, header_cols[5], "Margin", header_style);
    render_cell_text(frame, header_cols[6], "Venue", header_style);

    for (i, idx) in (start..end).enumerate() {
        let row_y = inner.y + 1 + i as u16;
        if row_y >= inner.y + inner.height {
            break;
        }
        let row_area = Rect {
            x: inner.x,
            y: row_y,
            width: inner.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let record = &state.filtered[idx];
        let winner = record.winner.as_deref().unwrap_or("-");
        let date = record.date.as_deref().unwrap_or("-");
        render_cell_text(frame, cols[0], &record.season, Style::default());
        render_cell_text(frame, cols[1], date, Style::default());
        render_cell_text(frame, cols[2], &record.team1, Style::default());
        render_cell_text(frame, cols[3], &record.team2, Style::default());
        render_cell_text(
            frame,
            cols[4],
            winner,
            Style::default().fg(Color::Green),
        );
        render_cell_text(frame, cols[5], &record.margin_label(), Style::default());
        render_cell_text(frame, cols[6], &record.venue, Style::default());
    }
}

fn preview_columns() -> [Constraint; 7] {
    [
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Length(22),
        Constraint::Length(22),
        Constraint::Length(22),
        Constraint::Length(10),
        Constraint::Min(12),
    ]
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text).style(style);
    frame.render_widget(paragraph, text_area);
}

fn team_wins_chart(entries: &[CountEntry], width: u16) -> BarChart<'static> {
    let capacity = (width.saturating_sub(2) / 6).max(1) as usize;
    let bars: Vec<Bar> = entries
        .iter()
        .take(capacity)
        .map(|entry| {
            Bar::default()
                .value(entry.count as u64)
                .label(abbreviate(&entry.name).into())
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();
    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(5)
        .bar_gap(1)
}

fn season_counts_chart(entries: &[CountEntry], width: u16) -> BarChart<'static> {
    let capacity = (width.saturating_sub(2) / 7).max(1) as usize;
    let start = entries.len().saturating_sub(capacity);
    let bars: Vec<Bar> = entries[start..]
        .iter()
        .map(|entry| {
            Bar::default()
                .value(entry.count as u64)
                .label(short_season(&entry.name).into())
                .style(Style::default().fg(Color::Green))
        })
        .collect();
    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(6)
        .bar_gap(1)
}

fn trend_chart(trend: &SeasonTrend, width: u16) -> BarChart<'static> {
    let group_width = (trend.teams.len() as u16).max(1) + 2;
    let capacity = (width.saturating_sub(2) / group_width).max(1) as usize;
    let start = trend.seasons.len().saturating_sub(capacity);

    let mut chart = BarChart::default().bar_width(1).bar_gap(0).group_gap(2);
    for (si, season) in trend.seasons.iter().enumerate().skip(start) {
        let bars: Vec<Bar> = trend
            .teams
            .iter()
            .enumerate()
            .map(|(ti, _)| {
                Bar::default()
                    .value(trend.wins[si][ti])
                    .text_value(String::new())
                    .style(Style::default().fg(palette(ti)))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(short_season(season).into())
                .bars(&bars),
        );
    }
    chart
}

fn trend_legend(trend: &SeasonTrend) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, team) in trend.teams.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("█ {}", abbreviate(team)),
            Style::default().fg(palette(i)),
        ));
    }
    Line::from(spans)
}

fn toss_chart(entries: &[CountEntry]) -> BarChart<'static> {
    let bars: Vec<Bar> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            Bar::default()
                .value(entry.count as u64)
                .label(entry.name.clone().into())
                .style(Style::default().fg(palette(i)))
        })
        .collect();
    BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(2)
}

fn count_bar(count: usize, max: usize) -> BarChart<'static> {
    let bar = Bar::default()
        .value(count as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Cyan));
    BarChart::default()
        .data(BarGroup::default().bars(&[bar]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(max.max(1) as u64)
}

fn palette(i: usize) -> Color {
    const COLORS: [Color; 5] = [
        Color::Cyan,
        Color::Green,
        Color::Yellow,
        Color::Magenta,
        Color::Blue,
    ];
    COLORS[i % COLORS.len()]
}

fn short_season(season: &str) -> String {
    let chars: Vec<char> = season.chars().collect();
    if chars.len() > 5 {
        chars[chars.len() - 5..].iter().collect()
    } else {
        season.to_string()
    }
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "IPL Terminal - Help",
        "",
        "Screens:",
        "  1            Overview (metrics + win chart)",
        "  2            Seasons (per-season counts + top-team trend)",
        "  3            Venues (top hosting grounds)",
        "  4            Toss (decision distribution)",
        "  5            Preview (match table)",
        "",
        "Global:",
        "  s / S        Season filter next/previous",
        "  x            Export current view to xlsx",
        "  j/k or ↑/↓   Scroll preview",
        "  PgUp/PgDn    Page preview",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
