use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::dataset::{MatchRecord, compare_seasons};

pub const TOP_VENUES: usize = 10;
pub const TREND_TEAMS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KeyMetrics {
    pub total_matches: usize,
    pub total_teams: usize,
    pub top_team: Option<CountEntry>,
    pub top_venue: Option<CountEntry>,
    pub date_span: Option<(String, String)>,
}

/// Win counts per season for the most successful teams, shaped for a grouped
/// bar chart: `wins[season_idx][team_idx]`, zero where a team did not win.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SeasonTrend {
    pub seasons: Vec<String>,
    pub teams: Vec<String>,
    pub wins: Vec<Vec<u64>>,
}

/// Everything the dashboard shows for one filtered selection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub metrics: KeyMetrics,
    pub team_wins: Vec<CountEntry>,
    pub matches_per_season: Vec<CountEntry>,
    pub top_venues: Vec<CountEntry>,
    pub toss_decisions: Vec<CountEntry>,
    pub season_trend: SeasonTrend,
}

pub fn compute_dashboard(records: &[MatchRecord]) -> DashboardStats {
    let team_wins = team_win_counts(records);
    let top_venues = venue_counts(records, TOP_VENUES);
    let metrics = KeyMetrics {
        total_matches: records.len(),
        total_teams: distinct_team_count(records),
        top_team: team_wins.first().cloned(),
        top_venue: top_venues.first().cloned(),
        date_span: date_span(records),
    };
    DashboardStats {
        metrics,
        team_wins,
        matches_per_season: matches_per_season(records),
        top_venues,
        toss_decisions: toss_decision_counts(records),
        season_trend: season_trend(records, TREND_TEAMS),
    }
}

/// Teams ordered by wins descending; rows without a winner are ignored.
pub fn team_win_counts(records: &[MatchRecord]) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        if let Some(winner) = record.winner.as_deref() {
            *counts.entry(winner.to_string()).or_insert(0) += 1;
        }
    }
    sorted_desc(counts)
}

/// Match counts keyed by season, seasons ascending.
pub fn matches_per_season(records: &[MatchRecord]) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.season.clone()).or_insert(0) += 1;
    }
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(name, count)| CountEntry { name, count })
        .collect();
    entries.sort_by(|a, b| compare_seasons(&a.name, &b.name));
    entries
}

pub fn venue_counts(records: &[MatchRecord], limit: usize) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.venue.clone()).or_insert(0) += 1;
    }
    let mut entries = sorted_desc(counts);
    entries.truncate(limit);
    entries
}

pub fn toss_decision_counts(records: &[MatchRecord]) -> Vec<CountEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        if let Some(decision) = record.toss_decision.as_deref() {
            *counts.entry(decision.to_string()).or_insert(0) += 1;
        }
    }
    sorted_desc(counts)
}

pub fn distinct_team_count(records: &[MatchRecord]) -> usize {
    let mut teams: HashSet<&str> = HashSet::new();
    for record in records {
        teams.insert(record.team1.as_str());
        teams.insert(record.team2.as_str());
    }
    teams.len()
}

/// Unique seasons of the given records, ascending. The dashboard calls this
/// once on the unfiltered dataset to fix the filter options at load time.
pub fn season_options(records: &[MatchRecord]) -> Vec<String> {
    let mut seasons: Vec<String> = records
        .iter()
        .map(|r| r.season.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    seasons.sort_by(|a, b| compare_seasons(a, b));
    seasons
}

pub fn season_trend(records: &[MatchRecord], team_limit: usize) -> SeasonTrend {
    let teams: Vec<String> = team_win_counts(records)
        .into_iter()
        .take(team_limit)
        .map(|entry| entry.name)
        .collect();
    let seasons = season_options(records);
    let team_index: HashMap<&str, usize> = teams
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let season_index: HashMap<&str, usize> = seasons
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let mut wins = vec![vec![0u64; teams.len()]; seasons.len()];
    for record in records {
        let Some(winner) = record.winner.as_deref() else {
            continue;
        };
        let Some(&ti) = team_index.get(winner) else {
            continue;
        };
        if let Some(&si) = season_index.get(record.season.as_str()) {
            wins[si][ti] += 1;
        }
    }
    SeasonTrend {
        seasons,
        teams,
        wins,
    }
}

fn date_span(records: &[MatchRecord]) -> Option<(String, String)> {
    let mut dates = records.iter().filter_map(|r| r.date_parsed());
    let first = dates.next()?;
    let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some((min.to_string(), max.to_string()))
}

fn sorted_desc(counts: HashMap<String, usize>) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = counts
        .into_iter()
        .map(|(name, count)| CountEntry { name, count })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries
}
