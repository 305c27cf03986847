use std::collections::VecDeque;

use crate::aggregate::{self, DashboardStats};
use crate::dataset::MatchRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Overview,
    Seasons,
    Venues,
    Toss,
    Preview,
}

pub fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Overview => "Overview",
        Screen::Seasons => "Seasons",
        Screen::Venues => "Venues",
        Screen::Toss => "Toss",
        Screen::Preview => "Preview",
    }
}

#[derive(Debug, Clone)]
pub struct ExportState {
    pub active: bool,
    pub done: bool,
    pub path: Option<String>,
    pub current: usize,
    pub total: usize,
    pub message: String,
    pub error_count: usize,
    pub last_updated: Option<std::time::Instant>,
}

impl Default for ExportState {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportState {
    pub fn new() -> Self {
        Self {
            active: false,
            done: false,
            path: None,
            current: 0,
            total: 0,
            message: String::new(),
            error_count: 0,
            last_updated: None,
        }
    }

    pub fn clear_if_done_for(&mut self, now: std::time::Instant, keep_secs: u64) {
        if !self.active || !self.done {
            return;
        }
        let Some(last) = self.last_updated else {
            return;
        };
        if now.duration_since(last).as_secs() >= keep_secs {
            *self = Self::new();
        }
    }
}

pub struct AppState {
    pub screen: Screen,
    /// Full dataset as loaded; never mutated after startup.
    pub records: Vec<MatchRecord>,
    /// Season filter options, fixed at load time from the full dataset.
    pub seasons: Vec<String>,
    /// 0 selects all seasons, i selects `seasons[i - 1]`.
    pub season_index: usize,
    /// Rows matching the current season selection.
    pub filtered: Vec<MatchRecord>,
    pub stats: DashboardStats,
    pub preview_scroll: usize,
    pub show_help: bool,
    pub logs: VecDeque<String>,
    pub export: ExportState,
    pub data_path: String,
}

impl AppState {
    pub fn new(records: Vec<MatchRecord>, data_path: impl Into<String>) -> Self {
        let seasons = aggregate::season_options(&records);
        let mut state = Self {
            screen: Screen::Overview,
            records,
            seasons,
            season_index: 0,
            filtered: Vec::new(),
            stats: DashboardStats::default(),
            preview_scroll: 0,
            show_help: false,
            logs: VecDeque::new(),
            export: ExportState::new(),
            data_path: data_path.into(),
        };
        state.refilter();
        state
    }

    pub fn selected_season(&self) -> Option<&str> {
        if self.season_index == 0 {
            None
        } else {
            self.seasons.get(self.season_index - 1).map(String::as_str)
        }
    }

    pub fn season_label(&self) -> &str {
        self.selected_season().unwrap_or("All seasons")
    }

    pub fn cycle_season_next(&mut self) {
        self.season_index = (self.season_index + 1) % (self.seasons.len() + 1);
        self.refilter();
    }

    pub fn cycle_season_prev(&mut self) {
        if self.season_index == 0 {
            self.season_index = self.seasons.len();
        } else {
            self.season_index -= 1;
        }
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = match self.selected_season() {
            None => self.records.clone(),
            Some(season) => self
                .records
                .iter()
                .filter(|r| r.season == season)
                .cloned()
                .collect(),
        };
        self.stats = aggregate::compute_dashboard(&self.filtered);
        self.preview_scroll = 0;
    }

    pub fn scroll_preview_down(&mut self, step: usize) {
        let max = self.filtered.len().saturating_sub(1);
        self.preview_scroll = (self.preview_scroll + step).min(max);
    }

    pub fn scroll_preview_up(&mut self, step: usize) {
        self.preview_scroll = self.preview_scroll.saturating_sub(step);
    }

    pub fn maybe_clear_export(&mut self, now: std::time::Instant) {
        self.export.clear_if_done_for(now, 8);
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    ExportStarted {
        path: String,
        total: usize,
    },
    ExportProgress {
        current: usize,
        total: usize,
        message: String,
    },
    ExportFinished {
        path: String,
        current: usize,
        total: usize,
        matches: usize,
        teams: usize,
        seasons: usize,
        venues: usize,
        toss_rows: usize,
        errors: usize,
    },
    Log(String),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::ExportStarted { path, total } => {
            state.export.active = true;
            state.export.path = Some(path);
            state.export.total = total;
            state.export.current = 0;
            state.export.message = "Starting export".to_string();
            state.export.done = false;
            state.export.error_count = 0;
            state.export.last_updated = Some(std::time::Instant::now());
        }
        Delta::ExportProgress {
            current,
            total,
            message,
        } => {
            state.export.active = true;
            state.export.total = total;
            state.export.current = current;
            state.export.message = message;
            state.export.last_updated = Some(std::time::Instant::now());
        }
        Delta::ExportFinished {
            path,
            current,
            total,
            matches,
            teams,
            seasons,
            venues,
            toss_rows,
            errors,
        } => {
            state.export.active = true;
            state.export.path = Some(path);
            state.export.current = current;
            state.export.total = total;
            state.export.message = format!(
                "Done: {matches} matches, {teams} teams, {seasons} seasons, {venues} venues, {toss_rows} toss rows ({errors} errors)"
            );
            state.export.done = true;
            state.export.error_count = errors;
            state.export.last_updated = Some(std::time::Instant::now());
            state.push_log(format!("[INFO] Export finished ({errors} errors)"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
