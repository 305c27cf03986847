use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TEAMS: &[(&str, &str, &str)] = &[
    ("Chennai Super Kings", "Chennai", "MA Chidambaram Stadium"),
    ("Mumbai Indians", "Mumbai", "Wankhede Stadium"),
    ("Kolkata Knight Riders", "Kolkata", "Eden Gardens"),
    ("Royal Challengers Bangalore", "Bangalore", "M Chinnaswamy Stadium"),
    ("Delhi Capitals", "Delhi", "Feroz Shah Kotla"),
    ("Rajasthan Royals", "Jaipur", "Sawai Mansingh Stadium"),
    ("Kings XI Punjab", "Chandigarh", "Punjab Cricket Association Stadium"),
    ("Sunrisers Hyderabad", "Hyderabad", "Rajiv Gandhi International Stadium"),
];

const PLAYERS: &[&str] = &[
    "MS Dhoni",
    "RG Sharma",
    "V Kohli",
    "AB de Villiers",
    "DA Warner",
    "SK Raina",
    "G Gambhir",
    "CH Gayle",
    "KA Pollard",
    "RA Jadeja",
];

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let out = parse_arg(&args, "--out").unwrap_or_else(|| "matches.csv".to_string());
    let first_season = parse_num(&args, "--first-season").unwrap_or(2008);
    let seasons = parse_num(&args, "--seasons").unwrap_or(5).max(1);
    let per_season = parse_num(&args, "--per-season").unwrap_or(60).max(1);
    let seed = parse_num(&args, "--seed").unwrap_or(42);

    let out_path = PathBuf::from(&out);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut writer = csv::Writer::from_path(&out_path)
        .with_context(|| format!("create output {}", out_path.display()))?;

    writer.write_record([
        "id",
        "season",
        "city",
        "date",
        "team1",
        "team2",
        "toss_winner",
        "toss_decision",
        "result",
        "winner",
        "win_by_runs",
        "win_by_wickets",
        "player_of_match",
        "venue",
    ])?;

    let mut id = 0u64;
    for season_offset in 0..seasons {
        let season = first_season + season_offset;
        let opening_day = NaiveDate::from_ymd_opt(season as i32, 4, 1)
            .context("invalid season start date")?;
        for game in 0..per_season {
            id += 1;
            writer.write_record(&match_row(&mut rng, id, season, opening_day, game))?;
        }
    }
    writer.flush()?;

    println!(
        "Wrote {} matches ({} seasons x {per_season}) to {}",
        id,
        seasons,
        out_path.display()
    );
    Ok(())
}

fn match_row(
    rng: &mut StdRng,
    id: u64,
    season: u64,
    opening_day: NaiveDate,
    game: u64,
) -> Vec<String> {
    let home = rng.gen_range(0..TEAMS.len());
    let mut away = rng.gen_range(0..TEAMS.len());
    while away == home {
        away = rng.gen_range(0..TEAMS.len());
    }
    let (team1, city, venue) = TEAMS[home];
    let (team2, _, _) = TEAMS[away];
    let date = opening_day + Duration::days(game as i64);

    let toss_winner = if rng.gen_bool(0.5) { team1 } else { team2 };
    let toss_decision = if rng.gen_bool(0.6) { "field" } else { "bat" };

    // Roughly one abandoned game in twenty, mirroring real seasons.
    let no_result = rng.gen_bool(0.05);
    let (result, winner, by_runs, by_wickets, player) = if no_result {
        ("no result", "", 0u32, 0u32, "")
    } else {
        let winner = if rng.gen_bool(0.52) { team1 } else { team2 };
        let chased = rng.gen_bool(0.5);
        let (by_runs, by_wickets) = if chased {
            (0, rng.gen_range(1..=10))
        } else {
            (rng.gen_range(1..=90), 0)
        };
        let player = PLAYERS[rng.gen_range(0..PLAYERS.len())];
        ("normal", winner, by_runs, by_wickets, player)
    };

    vec![
        id.to_string(),
        season.to_string(),
        city.to_string(),
        date.format("%Y-%m-%d").to_string(),
        team1.to_string(),
        team2.to_string(),
        toss_winner.to_string(),
        toss_decision.to_string(),
        result.to_string(),
        winner.to_string(),
        by_runs.to_string(),
        by_wickets.to_string(),
        player.to_string(),
        venue.to_string(),
    ]
}

fn parse_arg(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
        {
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_num(args: &[String], flag: &str) -> Option<u64> {
    parse_arg(args, flag)?.parse::<u64>().ok()
}
