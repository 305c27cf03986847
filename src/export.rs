use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use anyhow::{Context, Result};
use chrono::Utc;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::aggregate::{self, DashboardStats};
use crate::dataset::MatchRecord;
use crate::state::Delta;

pub struct ExportReport {
    pub matches: usize,
    pub teams: usize,
    pub seasons: usize,
    pub venues: usize,
    pub toss_rows: usize,
    pub trend_rows: usize,
}

pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Write the filtered view as a workbook: key metrics plus one sheet per
/// aggregate, and the matching rows themselves.
pub fn export_dashboard_with_progress(
    path: &Path,
    filter_label: &str,
    records: &[MatchRecord],
    mut on_progress: impl FnMut(ExportProgress),
) -> Result<ExportReport> {
    let stats = aggregate::compute_dashboard(records);
    let venues_all = aggregate::venue_counts(records, usize::MAX);

    let total = 8usize;
    let mut current = 0usize;
    let mut step = |current: &mut usize, message: &str| {
        *current += 1;
        on_progress(ExportProgress {
            current: *current,
            total,
            message: message.to_string(),
        });
    };

    let summary = summary_rows(filter_label, &stats);
    step(&mut current, "Sheet: Summary");
    let team_wins = count_rows("Team", "Wins", &stats.team_wins);
    step(&mut current, "Sheet: TeamWins");
    let seasons = count_rows("Season", "Matches", &stats.matches_per_season);
    step(&mut current, "Sheet: Seasons");
    let venues = count_rows("Venue", "Matches", &venues_all);
    step(&mut current, "Sheet: Venues");
    let toss = toss_rows(&stats);
    step(&mut current, "Sheet: Toss");
    let trend = trend_rows(&stats);
    step(&mut current, "Sheet: SeasonTrend");
    let matches = match_rows(records);
    step(&mut current, "Sheet: Matches");

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("TeamWins")?;
        write_rows(sheet, &team_wins)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Seasons")?;
        write_rows(sheet, &seasons)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Venues")?;
        write_rows(sheet, &venues)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Toss")?;
        write_rows(sheet, &toss)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("SeasonTrend")?;
        write_rows(sheet, &trend)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Matches")?;
        write_rows(sheet, &matches)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    step(&mut current, "Saved workbook");

    Ok(ExportReport {
        matches: records.len(),
        teams: stats.team_wins.len(),
        seasons: stats.matches_per_season.len(),
        venues: venues_all.len(),
        toss_rows: stats.toss_decisions.len(),
        trend_rows: stats.season_trend.seasons.len(),
    })
}

/// Timestamped workbook path under `dir` for the given filter label.
pub fn default_export_path(dir: &Path, filter_label: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("ipl_{}_{stamp}.xlsx", slug(filter_label)))
}

/// Run the export on its own thread, streaming progress back as deltas.
pub fn spawn_export(
    tx: Sender<Delta>,
    path: PathBuf,
    filter_label: String,
    records: Vec<MatchRecord>,
) {
    std::thread::spawn(move || {
        let path_str = path.display().to_string();
        let _ = tx.send(Delta::ExportStarted {
            path: path_str.clone(),
            total: 0,
        });

        let progress_tx = tx.clone();
        let mut last_current = 0usize;
        let mut last_total = 0usize;

        let report =
            export_dashboard_with_progress(&path, &filter_label, &records, |progress| {
                last_current = progress.current;
                last_total = progress.total;
                let _ = progress_tx.send(Delta::ExportProgress {
                    current: progress.current,
                    total: progress.total,
                    message: progress.message,
                });
            });

        match report {
            Ok(report) => {
                let _ = tx.send(Delta::ExportFinished {
                    path: path_str,
                    current: last_current.max(last_total),
                    total: last_total,
                    matches: report.matches,
                    teams: report.teams,
                    seasons: report.seasons,
                    venues: report.venues,
                    toss_rows: report.toss_rows,
                    errors: 0,
                });
            }
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Export failed: {err}")));
                let _ = tx.send(Delta::ExportFinished {
                    path: path_str,
                    current: last_current,
                    total: last_total,
                    matches: 0,
                    teams: 0,
                    seasons: 0,
                    venues: 0,
                    toss_rows: 0,
                    errors: 1,
                });
            }
        }
    });
}

fn summary_rows(filter_label: &str, stats: &DashboardStats) -> Vec<Vec<String>> {
    let mut rows = vec![vec!["Metric".to_string(), "Value".to_string()]];
    rows.push(vec!["Selection".to_string(), filter_label.to_string()]);
    rows.push(vec![
        "Total Matches".to_string(),
        stats.metrics.total_matches.to_string(),
    ]);
    rows.push(vec![
        "Total Teams".to_string(),
        stats.metrics.total_teams.to_string(),
    ]);
    rows.push(vec![
        "Top Team".to_string(),
        leader_label(stats.metrics.top_team.as_ref()),
    ]);
    rows.push(vec![
        "Top Venue".to_string(),
        leader_label(stats.metrics.top_venue.as_ref()),
    ]);
    if let Some((first, last)) = stats.metrics.date_span.as_ref() {
        rows.push(vec!["Date Span".to_string(), format!("{first} to {last}")]);
    }
    rows.push(vec![
        "Generated".to_string(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    ]);
    rows
}

fn leader_label(entry: Option<&aggregate::CountEntry>) -> String {
    entry
        .map(|e| format!("{} ({})", e.name, e.count))
        .unwrap_or_else(|| "n/a".to_string())
}

fn count_rows(name_header: &str, count_header: &str, entries: &[aggregate::CountEntry]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![name_header.to_string(), count_header.to_string()]];
    rows.extend(
        entries
            .iter()
            .map(|entry| vec![entry.name.clone(), entry.count.to_string()]),
    );
    rows
}

fn toss_rows(stats: &DashboardStats) -> Vec<Vec<String>> {
    let total: usize = stats.toss_decisions.iter().map(|e| e.count).sum();
    let mut rows = vec![vec![
        "Decision".to_string(),
        "Count".to_string(),
        "Share".to_string(),
    ]];
    for entry in &stats.toss_decisions {
        let share = if total == 0 {
            String::new()
        } else {
            format!("{:.1}%", entry.count as f64 * 100.0 / total as f64)
        };
        rows.push(vec![entry.name.clone(), entry.count.to_string(), share]);
    }
    rows
}

fn trend_rows(stats: &DashboardStats) -> Vec<Vec<String>> {
    let trend = &stats.season_trend;
    let mut header = vec!["Season".to_string()];
    header.extend(trend.teams.iter().cloned());
    let mut rows = vec![header];
    for (si, season) in trend.seasons.iter().enumerate() {
        let mut row = vec![season.clone()];
        row.extend(trend.wins[si].iter().map(|w| w.to_string()));
        rows.push(row);
    }
    rows
}

fn match_rows(records: &[MatchRecord]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "Season".to_string(),
        "Date".to_string(),
        "City".to_string(),
        "Team 1".to_string(),
        "Team 2".to_string(),
        "Toss Winner".to_string(),
        "Toss Decision".to_string(),
        "Winner".to_string(),
        "Margin".to_string(),
        "Player of Match".to_string(),
        "Venue".to_string(),
    ]];
    for record in records {
        rows.push(vec![
            record.season.clone(),
            record.date.clone().unwrap_or_default(),
            record.city.clone().unwrap_or_default(),
            record.team1.clone(),
            record.team2.clone(),
            record.toss_winner.clone().unwrap_or_default(),
            record.toss_decision.clone().unwrap_or_default(),
            record.winner.clone().unwrap_or_default(),
            record.margin_label(),
            record.player_of_match.clone().unwrap_or_default(),
            record.venue.clone(),
        ]);
    }
    rows
}

fn slug(label: &str) -> String {
    let mut out = String::new();
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_filename_safe() {
        assert_eq!(slug("All seasons"), "all_seasons");
        assert_eq!(slug("2007/08"), "2007_08");
        assert_eq!(slug("2019"), "2019");
    }

    #[test]
    fn trend_sheet_has_one_row_per_season() {
        let stats = DashboardStats {
            season_trend: aggregate::SeasonTrend {
                seasons: vec!["2008".into(), "2009".into()],
                teams: vec!["CSK".into(), "MI".into()],
                wins: vec![vec![2, 1], vec![0, 1]],
            },
            ..Default::default()
        };
        let rows = trend_rows(&stats);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Season", "CSK", "MI"]);
        assert_eq!(rows[1], vec!["2008", "2", "1"]);
    }

    #[test]
    fn toss_sheet_reports_shares() {
        let stats = DashboardStats {
            toss_decisions: vec![
                aggregate::CountEntry { name: "field".into(), count: 3 },
                aggregate::CountEntry { name: "bat".into(), count: 1 },
            ],
            ..Default::default()
        };
        let rows = toss_rows(&stats);
        assert_eq!(rows[1], vec!["field", "3", "75.0%"]);
        assert_eq!(rows[2], vec!["bat", "1", "25.0%"]);
    }
}
