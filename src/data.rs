//! Match and delivery tables.
//!
//! Both tables are loaded once from CSV and stay read-only for the rest of
//! the run. Nullable columns are `Option`s; an empty cell or one of the
//! usual missing-value markers (`NA`, `NaN`, ...) reads as `None`.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Cell values treated as "no value" in nullable columns
const NULL_MARKERS: [&str; 5] = ["NA", "N/A", "NaN", "nan", "null"];

/// What the toss winner chose to do first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TossDecision {
    Bat,
    Field,
}

impl fmt::Display for TossDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TossDecision::Bat => write!(f, "bat"),
            TossDecision::Field => write!(f, "field"),
        }
    }
}

/// One row of the matches table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Match {
    /// Match key referenced by `Delivery::match_id`
    #[serde(default)]
    pub id: Option<u64>,
    /// Season identifier, e.g. "2019" or "2007/08"
    pub season: String,
    pub team1: String,
    pub team2: String,
    /// Winning team, `None` for no result
    #[serde(default, deserialize_with = "nullable")]
    pub winner: Option<String>,
    pub venue: String,
    pub toss_winner: String,
    pub toss_decision: TossDecision,
}

impl Match {
    /// Whether `team` was one of the two sides
    pub fn involves(&self, team: &str) -> bool {
        self.team1 == team || self.team2 == team
    }

    /// Whether `team` is the recorded winner
    pub fn won_by(&self, team: &str) -> bool {
        self.winner.as_deref() == Some(team)
    }
}

/// One ball bowled
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Delivery {
    pub match_id: u64,
    #[serde(alias = "batsman")]
    pub batter: String,
    pub bowler: String,
    /// Runs off the bat for this ball
    pub batsman_runs: u32,
    /// Dismissal type, `None` when nobody was out on this ball
    #[serde(default, deserialize_with = "nullable")]
    pub dismissal_kind: Option<String>,
}

/// Both input tables, held in memory for the whole run
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub matches: Vec<Match>,
    pub deliveries: Vec<Delivery>,
}

impl Dataset {
    /// Load the matches and deliveries CSV files.
    ///
    /// Any missing file or malformed row is fatal.
    pub fn load(matches_path: &Path, deliveries_path: &Path) -> Result<Self> {
        let matches = load_matches(matches_path)?;
        let deliveries = load_deliveries(deliveries_path)?;
        log::info!(
            "Loaded {} matches from {} and {} deliveries from {}",
            matches.len(),
            matches_path.display(),
            deliveries.len(),
            deliveries_path.display()
        );
        Ok(Dataset {
            matches,
            deliveries,
        })
    }
}

/// Load the matches table from a CSV file
pub fn load_matches(path: &Path) -> Result<Vec<Match>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open matches file {}", path.display()))?;
    read_matches(file).with_context(|| format!("Failed to load {}", path.display()))
}

/// Load the deliveries table from a CSV file
pub fn load_deliveries(path: &Path) -> Result<Vec<Delivery>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open deliveries file {}", path.display()))?;
    read_deliveries(file).with_context(|| format!("Failed to load {}", path.display()))
}

/// Read match rows from any CSV source with a header row
pub fn read_matches<R: Read>(reader: R) -> Result<Vec<Match>> {
    read_table(reader, "match")
}

/// Read delivery rows from any CSV source with a header row
pub fn read_deliveries<R: Read>(reader: R) -> Result<Vec<Delivery>> {
    read_table(reader, "delivery")
}

fn read_table<R, T>(reader: R, what: &str) -> Result<Vec<T>>
where
    R: Read,
    T: for<'de> Deserialize<'de>,
{
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let row: T = result.with_context(|| format!("Bad {} row {}", what, idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn nullable<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        let value = value.trim();
        if value.is_empty() || NULL_MARKERS.contains(&value) {
            None
        } else {
            Some(value.to_string())
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHES: &str = "\
id,season,city,team1,team2,toss_winner,toss_decision,winner,venue
1,2008,Mumbai,Mumbai Indians,Chennai Super Kings,Mumbai Indians,bat,Mumbai Indians,Wankhede Stadium
2,2008,Chennai,Chennai Super Kings,Mumbai Indians,Chennai Super Kings,field,,MA Chidambaram Stadium
3,2009/10,Delhi,Delhi Capitals,Mumbai Indians,Mumbai Indians,field,NA,Feroz Shah Kotla
";

    #[test]
    fn test_read_matches_with_null_winners() {
        let matches = read_matches(MATCHES.as_bytes()).unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0].id, Some(1));
        assert_eq!(matches[0].winner.as_deref(), Some("Mumbai Indians"));
        assert_eq!(matches[0].toss_decision, TossDecision::Bat);
        assert_eq!(matches[1].winner, None);
        assert_eq!(matches[2].winner, None);
        assert_eq!(matches[2].season, "2009/10");
    }

    #[test]
    fn test_match_helpers() {
        let matches = read_matches(MATCHES.as_bytes()).unwrap();
        assert!(matches[0].involves("Chennai Super Kings"));
        assert!(!matches[0].involves("Delhi Capitals"));
        assert!(matches[0].won_by("Mumbai Indians"));
        assert!(!matches[1].won_by("Mumbai Indians"));
    }

    #[test]
    fn test_unknown_toss_decision_is_an_error() {
        let csv = "season,team1,team2,toss_winner,toss_decision,winner,venue\n\
                   2008,A,B,A,bowl,A,Ground\n";
        let err = read_matches(csv.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("row 1"));
    }

    #[test]
    fn test_read_deliveries_accepts_batsman_alias() {
        let csv = "\
match_id,inning,batsman,bowler,batsman_runs,dismissal_kind
1,1,SR Tendulkar,B Lee,4,
1,1,SR Tendulkar,B Lee,0,caught
";
        let deliveries = read_deliveries(csv.as_bytes()).unwrap();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].batter, "SR Tendulkar");
        assert_eq!(deliveries[0].batsman_runs, 4);
        assert_eq!(deliveries[0].dismissal_kind, None);
        assert_eq!(deliveries[1].dismissal_kind.as_deref(), Some("caught"));
    }

    #[test]
    fn test_every_null_marker_reads_as_none() {
        let cells = std::iter::once("").chain(NULL_MARKERS);
        for cell in cells {
            let matches_csv = format!(
                "season,team1,team2,toss_winner,toss_decision,winner,venue\n\
                 2008,A,B,A,bat,{},Ground\n",
                cell
            );
            let matches = read_matches(matches_csv.as_bytes()).unwrap();
            assert_eq!(matches[0].winner, None, "winner cell {:?}", cell);

            let deliveries_csv = format!(
                "match_id,batter,bowler,batsman_runs,dismissal_kind\n\
                 1,X,Y,0,{}\n\
                 1,X,Z,0,caught\n",
                cell
            );
            let deliveries = read_deliveries(deliveries_csv.as_bytes()).unwrap();
            assert_eq!(deliveries[0].dismissal_kind, None, "dismissal cell {:?}", cell);
            assert_eq!(
                crate::analysis::top_wicket_takers(&deliveries, 10),
                vec![crate::analysis::Tally::new("Z", 1)],
                "dismissal cell {:?}",
                cell
            );
        }
    }

    #[test]
    fn test_negative_runs_rejected() {
        let csv = "match_id,batter,bowler,batsman_runs,dismissal_kind\n1,X,Y,-1,\n";
        assert!(read_deliveries(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = load_matches(Path::new("/nonexistent/matches.csv")).unwrap_err();
        assert!(err.to_string().contains("matches file"));
    }
}
