use std::path::PathBuf;

use anyhow::{Result, anyhow};

use ipl_terminal::aggregate::{self, CountEntry};
use ipl_terminal::dataset;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let season = parse_season_arg(&args);
    let json = args.iter().any(|arg| arg == "--json");
    let data_path = parse_data_path_arg(&args)
        .or_else(|| {
            std::env::var("IPL_DATA_PATH")
                .ok()
                .filter(|val| !val.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("matches.csv"));

    if !data_path.exists() {
        return Err(anyhow!(
            "dataset not found at {}: supply a matches CSV via --data <path> or IPL_DATA_PATH",
            data_path.display()
        ));
    }

    let summary = dataset::load_matches(&data_path)?;
    let filtered: Vec<_> = match season.as_deref() {
        None => summary.records,
        Some(season) => summary
            .records
            .into_iter()
            .filter(|r| r.season == season)
            .collect(),
    };
    let stats = aggregate::compute_dashboard(&filtered);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    let label = season.as_deref().unwrap_or("all seasons");
    println!("Season report: {label}");
    println!("Dataset: {}", data_path.display());
    if summary.skipped > 0 {
        println!("Skipped rows: {}", summary.skipped);
    }
    println!("Matches: {}", stats.metrics.total_matches);
    println!("Teams: {}", stats.metrics.total_teams);
    println!("Top team: {}", leader(stats.metrics.top_team.as_ref(), "wins"));
    println!(
        "Top venue: {}",
        leader(stats.metrics.top_venue.as_ref(), "matches")
    );
    if let Some((first, last)) = stats.metrics.date_span.as_ref() {
        println!("Dates: {first} to {last}");
    }

    print_table("Team wins", &stats.team_wins);
    print_table("Matches per season", &stats.matches_per_season);
    print_table("Top venues", &stats.top_venues);
    print_table("Toss decisions", &stats.toss_decisions);

    Ok(())
}

fn leader(entry: Option<&CountEntry>, unit: &str) -> String {
    match entry {
        Some(entry) => format!("{} ({} {unit})", entry.name, entry.count),
        None => "n/a".to_string(),
    }
}

fn print_table(title: &str, entries: &[CountEntry]) {
    println!();
    println!("{title}:");
    if entries.is_empty() {
        println!("  (none)");
        return;
    }
    for entry in entries {
        println!("  {:<42} {:>5}", entry.name, entry.count);
    }
}

fn parse_season_arg(args: &[String]) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix("--season=") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == "--season"
            && let Some(next) = args.get(idx + 1)
        {
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_data_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix("--data=") {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--data"
            && let Some(next) = args.get(idx + 1)
        {
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
