use std::cmp::Ordering;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

/// One completed (or abandoned) match from the dataset.
///
/// `winner` is `None` for abandoned and no-result games; those rows still
/// count toward match totals but never toward win tallies.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub season: String,
    pub city: Option<String>,
    pub date: Option<String>,
    pub team1: String,
    pub team2: String,
    pub toss_winner: Option<String>,
    pub toss_decision: Option<String>,
    pub result: Option<String>,
    pub winner: Option<String>,
    pub win_by_runs: Option<u32>,
    pub win_by_wickets: Option<u32>,
    pub player_of_match: Option<String>,
    pub venue: String,
}

impl MatchRecord {
    pub fn date_parsed(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        const FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y"];
        for fmt in FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
                return Some(date);
            }
        }
        None
    }

    /// Short human label for the victory margin, e.g. "14 runs" or "6 wkts".
    pub fn margin_label(&self) -> String {
        if let Some(runs) = self.win_by_runs.filter(|r| *r > 0) {
            return format!("{runs} runs");
        }
        if let Some(wkts) = self.win_by_wickets.filter(|w| *w > 0) {
            return format!("{wkts} wkts");
        }
        match self.result.as_deref() {
            Some("tie") => "tie".to_string(),
            Some("no result") => "no result".to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub records: Vec<MatchRecord>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct RawMatchRow {
    #[serde(default)]
    season: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    team1: Option<String>,
    #[serde(default)]
    team2: Option<String>,
    #[serde(default)]
    toss_winner: Option<String>,
    #[serde(default)]
    toss_decision: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    winner: Option<String>,
    #[serde(default)]
    win_by_runs: Option<String>,
    #[serde(default)]
    win_by_wickets: Option<String>,
    #[serde(default)]
    player_of_match: Option<String>,
    #[serde(default)]
    venue: Option<String>,
}

/// Load the match dataset from a CSV file.
///
/// Rows that fail to parse or lack a season, team or venue value are skipped
/// and counted in the summary; unknown columns are ignored.
pub fn load_matches(path: &Path) -> Result<LoadSummary> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("open dataset {}", path.display()))?;
    load_matches_from_reader(file).with_context(|| format!("read dataset {}", path.display()))
}

pub fn load_matches_from_reader<R: Read>(rdr: R) -> Result<LoadSummary> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in reader.deserialize::<RawMatchRow>() {
        let Ok(raw) = row else {
            skipped += 1;
            continue;
        };
        match typed_record(raw) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    Ok(LoadSummary { records, skipped })
}

fn typed_record(raw: RawMatchRow) -> Option<MatchRecord> {
    let season = required(raw.season)?;
    let team1 = required(raw.team1)?;
    let team2 = required(raw.team2)?;
    let venue = required(raw.venue)?;
    Some(MatchRecord {
        season,
        city: opt_trim(raw.city),
        date: opt_trim(raw.date),
        team1,
        team2,
        toss_winner: opt_trim(raw.toss_winner),
        toss_decision: opt_trim(raw.toss_decision),
        result: opt_trim(raw.result),
        winner: opt_trim(raw.winner),
        win_by_runs: parse_count(raw.win_by_runs.as_deref()),
        win_by_wickets: parse_count(raw.win_by_wickets.as_deref()),
        player_of_match: opt_trim(raw.player_of_match),
        venue,
    })
}

fn required(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn opt_trim(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn parse_count(value: Option<&str>) -> Option<u32> {
    value?.trim().parse::<u32>().ok()
}

/// Order seasons by their leading year when one exists ("2008", "2007/08"),
/// with purely non-numeric labels sorted after them.
pub fn compare_seasons(a: &str, b: &str) -> Ordering {
    match (leading_year(a), leading_year(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn leading_year(s: &str) -> Option<u32> {
    s.split(|ch: char| !ch.is_ascii_digit())
        .find(|part| !part.is_empty())?
        .parse::<u32>()
        .ok()
}

pub fn abbreviate(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.len() <= 3 {
        return trimmed.to_uppercase();
    }
    let mut abbr = String::new();
    for part in trimmed.split_whitespace() {
        if let Some(ch) = part.chars().next() {
            abbr.push(ch);
        }
        if abbr.len() >= 3 {
            break;
        }
    }
    if abbr.len() >= 2 {
        return abbr.to_uppercase();
    }
    trimmed.chars().take(3).collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "id,season,city,date,team1,team2,toss_winner,toss_decision,result,dl_applied,winner,win_by_runs,win_by_wickets,player_of_match,venue,umpire1,umpire2,umpire3";

    fn load(rows: &[&str]) -> LoadSummary {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        load_matches_from_reader(text.as_bytes()).unwrap()
    }

    #[test]
    fn loads_typical_rows() {
        let summary = load(&[
            "1,2008,Bangalore,2008-04-18,Kolkata Knight Riders,Royal Challengers Bangalore,Royal Challengers Bangalore,field,normal,0,Kolkata Knight Riders,140,0,BB McCullum,M Chinnaswamy Stadium,Asad Rauf,RE Koertzen,",
            "2,2008,Chandigarh,2008-04-19,Chennai Super Kings,Kings XI Punjab,Chennai Super Kings,bat,normal,0,Chennai Super Kings,33,0,MEK Hussey,\"Punjab Cricket Association Stadium, Mohali\",MR Benson,SL Shastri,",
        ]);
        assert_eq!(summary.records.len(), 2);
        assert_eq!(summary.skipped, 0);
        let first = &summary.records[0];
        assert_eq!(first.season, "2008");
        assert_eq!(first.winner.as_deref(), Some("Kolkata Knight Riders"));
        assert_eq!(first.win_by_runs, Some(140));
        assert_eq!(first.win_by_wickets, Some(0));
        assert_eq!(first.venue, "M Chinnaswamy Stadium");
        let second = &summary.records[1];
        assert_eq!(
            second.venue,
            "Punjab Cricket Association Stadium, Mohali"
        );
    }

    #[test]
    fn blank_optionals_become_none() {
        let summary = load(&[
            "3,2011,,2011-05-01,Deccan Chargers,Pune Warriors,Deccan Chargers,bat,no result,0,,0,0,,Feroz Shah Kotla,,,",
        ]);
        let record = &summary.records[0];
        assert_eq!(record.city, None);
        assert_eq!(record.winner, None);
        assert_eq!(record.player_of_match, None);
        assert_eq!(record.margin_label(), "no result");
    }

    #[test]
    fn skips_rows_missing_required_values() {
        let summary = load(&[
            "4,2012,Mumbai,2012-04-03,,Mumbai Indians,Mumbai Indians,field,normal,0,Mumbai Indians,0,5,,Wankhede Stadium,,,",
            "5,2012,Mumbai,2012-04-04,Mumbai Indians,Pune Warriors,Pune Warriors,field,normal,0,Mumbai Indians,41,0,,Wankhede Stadium,,,",
        ]);
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn skips_structurally_malformed_rows() {
        let summary = load(&["6,2013,too,few,fields"]);
        assert_eq!(summary.records.len(), 0);
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn tolerates_absent_optional_columns() {
        let text = "season,team1,team2,venue\n2019,Mumbai Indians,Chennai Super Kings,Rajiv Gandhi Intl. Stadium\n";
        let summary = load_matches_from_reader(text.as_bytes()).unwrap();
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].toss_decision, None);
        assert_eq!(summary.records[0].winner, None);
    }

    #[test]
    fn lenient_count_parsing() {
        assert_eq!(parse_count(Some("14")), Some(14));
        assert_eq!(parse_count(Some(" 7 ")), Some(7));
        assert_eq!(parse_count(Some("NA")), None);
        assert_eq!(parse_count(Some("")), None);
        assert_eq!(parse_count(None), None);
    }

    #[test]
    fn margin_prefers_runs_then_wickets() {
        let summary = load(&[
            "7,2016,Pune,2016-04-22,Rising Pune Supergiants,Royal Challengers Bangalore,Royal Challengers Bangalore,field,normal,0,Royal Challengers Bangalore,0,7,,Maharashtra Cricket Association Stadium,,,",
        ]);
        assert_eq!(summary.records[0].margin_label(), "7 wkts");
    }

    #[test]
    fn parses_common_date_formats() {
        let mut record = MatchRecord {
            season: "2008".into(),
            city: None,
            date: Some("2008-04-18".into()),
            team1: "A".into(),
            team2: "B".into(),
            toss_winner: None,
            toss_decision: None,
            result: None,
            winner: None,
            win_by_runs: None,
            win_by_wickets: None,
            player_of_match: None,
            venue: "V".into(),
        };
        assert_eq!(
            record.date_parsed(),
            NaiveDate::from_ymd_opt(2008, 4, 18)
        );
        record.date = Some("18/04/2008".into());
        assert_eq!(
            record.date_parsed(),
            NaiveDate::from_ymd_opt(2008, 4, 18)
        );
        record.date = Some("April 18".into());
        assert_eq!(record.date_parsed(), None);
    }

    #[test]
    fn season_ordering_is_year_aware() {
        let mut seasons = vec!["2019", "2008", "2007/08", "final", "2010"];
        seasons.sort_by(|a, b| compare_seasons(a, b));
        assert_eq!(seasons, vec!["2007/08", "2008", "2010", "2019", "final"]);
    }

    #[test]
    fn abbreviations_use_initials() {
        assert_eq!(abbreviate("Chennai Super Kings"), "CSK");
        assert_eq!(abbreviate("Mumbai Indians"), "MI");
        assert_eq!(abbreviate("Royal Challengers Bangalore"), "RCB");
        assert_eq!(abbreviate("MI"), "MI");
    }
}
