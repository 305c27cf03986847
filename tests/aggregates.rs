use std::fs;
use std::path::PathBuf;

use ipl_terminal::aggregate::{
    compute_dashboard, matches_per_season, season_options, season_trend, team_win_counts,
    venue_counts,
};
use ipl_terminal::dataset::{LoadSummary, MatchRecord, load_matches_from_reader};

fn load_fixture() -> LoadSummary {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("matches_small.csv");
    let raw = fs::read_to_string(path).expect("fixture file should be readable");
    load_matches_from_reader(raw.as_bytes()).expect("fixture should load")
}

#[test]
fn fixture_loads_and_counts_unreadable_rows() {
    let summary = load_fixture();
    assert_eq!(summary.records.len(), 12);
    // One row without a team1 value, one structurally malformed row.
    assert_eq!(summary.skipped, 2);
}

#[test]
fn win_counts_sum_to_decided_matches() {
    let records = load_fixture().records;
    let wins = team_win_counts(&records);
    let decided = records.iter().filter(|r| r.winner.is_some()).count();
    assert_eq!(decided, 11);
    assert_eq!(wins.iter().map(|e| e.count).sum::<usize>(), decided);
}

#[test]
fn season_and_venue_counts_cover_every_row() {
    let records = load_fixture().records;
    let per_season = matches_per_season(&records);
    assert_eq!(
        per_season.iter().map(|e| e.count).sum::<usize>(),
        records.len()
    );
    let venues = venue_counts(&records, usize::MAX);
    assert_eq!(venues.iter().map(|e| e.count).sum::<usize>(), records.len());
}

#[test]
fn season_filter_reduces_monotonically() {
    let records = load_fixture().records;
    let total = records.len();
    for season in season_options(&records) {
        let filtered: Vec<&MatchRecord> =
            records.iter().filter(|r| r.season == season).collect();
        assert!(filtered.len() <= total);
        assert!(!filtered.is_empty(), "every option comes from the data");
    }
}

#[test]
fn per_season_filters_partition_the_dataset() {
    let records = load_fixture().records;
    let sum: usize = season_options(&records)
        .iter()
        .map(|season| records.iter().filter(|r| r.season == *season).count())
        .sum();
    assert_eq!(sum, records.len());
}

#[test]
fn top_n_is_a_stable_sort() {
    let records = load_fixture().records;
    let wins = team_win_counts(&records);
    let names: Vec<&str> = wins.iter().map(|e| e.name.as_str()).collect();
    // CSK and KKR tie on two wins; the name tie-break keeps the order fixed.
    assert_eq!(
        names,
        vec![
            "Mumbai Indians",
            "Chennai Super Kings",
            "Kolkata Knight Riders",
            "Royal Challengers Bangalore",
        ]
    );
    assert_eq!(wins[0].count, 6);
    assert_eq!(wins[1].count, 2);
    assert_eq!(wins[2].count, 2);

    let venues = venue_counts(&records, 3);
    assert_eq!(venues[0].name, "Wankhede Stadium");
    assert_eq!(venues[0].count, 4);
    assert_eq!(venues[1].name, "Eden Gardens");
    // Two venues tie at 2; the lexicographically smaller one makes the cut.
    assert_eq!(venues[2].name, "M Chinnaswamy Stadium");
}

#[test]
fn dashboard_metrics_reflect_the_fixture() {
    let records = load_fixture().records;
    let stats = compute_dashboard(&records);
    assert_eq!(stats.metrics.total_matches, 12);
    assert_eq!(stats.metrics.total_teams, 5);
    assert_eq!(
        stats.metrics.top_team.as_ref().map(|e| e.name.as_str()),
        Some("Mumbai Indians")
    );
    assert_eq!(
        stats.metrics.top_venue.as_ref().map(|e| e.name.as_str()),
        Some("Wankhede Stadium")
    );
    assert_eq!(
        stats.metrics.date_span,
        Some(("2008-04-19".into(), "2017-04-13".into()))
    );
}

#[test]
fn toss_distribution_counts_both_decisions() {
    let records = load_fixture().records;
    let stats = compute_dashboard(&records);
    let toss = &stats.toss_decisions;
    assert_eq!(toss.len(), 2);
    assert_eq!(toss[0].name, "field");
    assert_eq!(toss[0].count, 7);
    assert_eq!(toss[1].name, "bat");
    assert_eq!(toss[1].count, 5);
    assert_eq!(
        toss.iter().map(|e| e.count).sum::<usize>(),
        records.len()
    );
}

#[test]
fn missing_toss_column_yields_empty_distribution() {
    let raw = "season,team1,team2,winner,venue\n\
               2019,Mumbai Indians,Chennai Super Kings,Mumbai Indians,Wankhede Stadium\n";
    let summary = load_matches_from_reader(raw.as_bytes()).expect("minimal csv should load");
    let stats = compute_dashboard(&summary.records);
    assert!(stats.toss_decisions.is_empty());
    assert_eq!(stats.metrics.total_matches, 1);
}

#[test]
fn trend_grid_reconciles_with_win_counts() {
    let records = load_fixture().records;
    let trend = season_trend(&records, 5);
    assert_eq!(trend.seasons, vec!["2008", "2009", "2017"]);
    assert_eq!(
        trend.teams,
        vec![
            "Mumbai Indians",
            "Chennai Super Kings",
            "Kolkata Knight Riders",
            "Royal Challengers Bangalore",
        ]
    );

    // Every cell of a top-5 grid over four winning teams is a real win,
    // so column sums match the team win counts.
    let wins = team_win_counts(&records);
    for (ti, team) in trend.teams.iter().enumerate() {
        let column_sum: u64 = trend.wins.iter().map(|row| row[ti]).sum();
        let expected = wins
            .iter()
            .find(|e| e.name == *team)
            .map(|e| e.count as u64)
            .unwrap_or(0);
        assert_eq!(column_sum, expected, "column for {team}");
    }

    // 2009's no-result game contributes to no cell.
    assert_eq!(trend.wins[1], vec![2, 0, 0, 1]);
}

#[test]
fn empty_selection_never_panics() {
    let stats = compute_dashboard(&[]);
    assert_eq!(stats.metrics.total_matches, 0);
    assert!(stats.metrics.top_team.is_none());
    assert!(stats.metrics.top_venue.is_none());
    assert!(stats.team_wins.is_empty());
    assert!(stats.toss_decisions.is_empty());
    assert!(stats.season_trend.teams.is_empty());
}
