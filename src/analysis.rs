//! Aggregations over the match and delivery tables
//!
//! Every step here is a single pass of group-by, filter, sort and truncate
//! over the loaded tables. Functions take the tables by reference and return
//! owned summaries, so any step can be re-run and gives the same answer.
//!
//! Ranked results are ordered by value descending; equal values are ordered
//! by label ascending. Season results are ordered by season text ascending.

use crate::data::{Delivery, Match, TossDecision};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Innings score needed to count as a fifty
pub const FIFTY_THRESHOLD: u32 = 50;

/// A labelled count, one entry of a ranked or grouped result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    pub label: String,
    pub value: u64,
}

impl Tally {
    pub fn new(label: impl Into<String>, value: u64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// How many entries each top-N ranking keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopN {
    pub run_scorers: usize,
    pub wicket_takers: usize,
    pub fifty_plus: usize,
    pub venues: usize,
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            run_scorers: 10,
            wicket_takers: 10,
            fifty_plus: 5,
            venues: 5,
        }
    }
}

/// Which teams the team-specific steps look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Subject of the team profile, season win rate, venue and toss steps
    pub team_name: String,
    /// First side of the head-to-head comparison
    pub team1: String,
    /// Second side of the head-to-head comparison
    pub team2: String,
    pub top_n: TopN,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            team_name: "Mumbai Indians".to_string(),
            team1: "Mumbai Indians".to_string(),
            team2: "Chennai Super Kings".to_string(),
            top_n: TopN::default(),
        }
    }
}

impl AnalysisConfig {
    /// Set the team analysed by the team-specific steps
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team_name = team.into();
        self
    }

    /// Set the two sides of the head-to-head comparison
    pub fn with_head_to_head(mut self, team1: impl Into<String>, team2: impl Into<String>) -> Self {
        self.team1 = team1.into();
        self.team2 = team2.into();
        self
    }

    pub fn with_top_n(mut self, top_n: TopN) -> Self {
        self.top_n = top_n;
        self
    }
}

/// Summary of one team's record
#[derive(Debug, Clone, PartialEq)]
pub struct TeamProfile {
    pub team: String,
    pub total_matches: u64,
    pub wins: u64,
    pub losses: u64,
    /// Wins as a percentage of matches played, 0 when no matches were played
    pub win_pct: f64,
}

/// Win percentage of a team within one season
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonRate {
    pub season: String,
    pub win_pct: f64,
}

/// Wins after winning the toss, split by what the team chose to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TossOutcome {
    pub bat_first_wins: u64,
    pub chase_wins: u64,
}

/// Historical results between two teams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadToHead {
    pub team1: String,
    pub team2: String,
    pub wins_team1: u64,
    pub wins_team2: u64,
}

/// Outcome of the head-to-head tally comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    /// The named team has more historical wins
    Favourite(String),
    /// Both teams have the same number of wins
    CloseMatch,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Favourite(team) => write!(f, "{} might win based on history!", team),
            Prediction::CloseMatch => write!(f, "It's a close match!"),
        }
    }
}

impl HeadToHead {
    /// Pick whichever side has won more of the past meetings
    pub fn prediction(&self) -> Prediction {
        if self.wins_team1 > self.wins_team2 {
            Prediction::Favourite(self.team1.clone())
        } else if self.wins_team2 > self.wins_team1 {
            Prediction::Favourite(self.team2.clone())
        } else {
            Prediction::CloseMatch
        }
    }

    pub fn total_meetings_won(&self) -> u64 {
        self.wins_team1 + self.wins_team2
    }
}

/// Number of matches in each season, ordered by season
pub fn matches_per_season(matches: &[Match]) -> Vec<Tally> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for m in matches {
        *counts.entry(m.season.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(season, count)| Tally::new(season, count))
        .collect()
}

/// Number of wins per team, most wins first. Matches without a winner are skipped.
pub fn wins_per_team(matches: &[Match]) -> Vec<Tally> {
    rank(count_by(matches.iter().filter_map(|m| m.winner.as_deref())), None)
}

/// Batters with the most runs off the bat
pub fn top_run_scorers(deliveries: &[Delivery], n: usize) -> Vec<Tally> {
    let mut runs: HashMap<&str, u64> = HashMap::new();
    for d in deliveries {
        *runs.entry(d.batter.as_str()).or_insert(0) += u64::from(d.batsman_runs);
    }
    rank(runs, Some(n))
}

/// Bowlers with the most wickets.
///
/// Every delivery with a dismissal counts as a wicket for its bowler, so
/// run-outs and other dismissals the bowler did not effect are included.
pub fn top_wicket_takers(deliveries: &[Delivery], n: usize) -> Vec<Tally> {
    let bowlers = deliveries
        .iter()
        .filter(|d| d.dismissal_kind.is_some())
        .map(|d| d.bowler.as_str());
    rank(count_by(bowlers), Some(n))
}

/// Runs per batter per match
pub fn innings_scores(deliveries: &[Delivery]) -> HashMap<(u64, &str), u64> {
    let mut scores: HashMap<(u64, &str), u64> = HashMap::new();
    for d in deliveries {
        *scores.entry((d.match_id, d.batter.as_str())).or_insert(0) += u64::from(d.batsman_runs);
    }
    scores
}

/// Batters with the most innings of fifty or more
pub fn top_fifty_plus_scorers(deliveries: &[Delivery], n: usize) -> Vec<Tally> {
    let fifties = innings_scores(deliveries)
        .into_iter()
        .filter(|(_, runs)| *runs >= u64::from(FIFTY_THRESHOLD))
        .map(|((_, batter), _)| batter);
    rank(count_by(fifties), Some(n))
}

/// Overall record of `team`
pub fn team_profile(matches: &[Match], team: &str) -> TeamProfile {
    let total_matches = matches.iter().filter(|m| m.involves(team)).count() as u64;
    let wins = matches.iter().filter(|m| m.won_by(team)).count() as u64;
    TeamProfile {
        team: team.to_string(),
        total_matches,
        wins,
        losses: total_matches.saturating_sub(wins),
        win_pct: percentage(wins, total_matches),
    }
}

/// Win percentage of `team` in each season it played or won in, ordered by season
pub fn season_win_rates(matches: &[Match], team: &str) -> Vec<SeasonRate> {
    // (wins, played)
    let mut seasons: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for m in matches {
        if m.involves(team) {
            seasons.entry(m.season.as_str()).or_default().1 += 1;
        }
        if m.won_by(team) {
            seasons.entry(m.season.as_str()).or_default().0 += 1;
        }
    }
    seasons
        .into_iter()
        .map(|(season, (wins, played))| SeasonRate {
            season: season.to_string(),
            win_pct: percentage(wins, played),
        })
        .collect()
}

/// Venues where `team` has won most often
pub fn top_winning_venues(matches: &[Match], team: &str, n: usize) -> Vec<Tally> {
    let venues = matches
        .iter()
        .filter(|m| m.won_by(team))
        .map(|m| m.venue.as_str());
    rank(count_by(venues), Some(n))
}

/// Wins by `team` after winning the toss, split by toss decision
pub fn toss_decision_outcomes(matches: &[Match], team: &str) -> TossOutcome {
    let mut outcome = TossOutcome::default();
    for m in matches
        .iter()
        .filter(|m| m.toss_winner == team && m.won_by(team))
    {
        match m.toss_decision {
            TossDecision::Bat => outcome.bat_first_wins += 1,
            TossDecision::Field => outcome.chase_wins += 1,
        }
    }
    outcome
}

/// Wins of each side across all matches played between `team1` and `team2`
pub fn head_to_head(matches: &[Match], team1: &str, team2: &str) -> HeadToHead {
    let meetings: Vec<&Match> = matches
        .iter()
        .filter(|m| {
            (m.team1 == team1 && m.team2 == team2) || (m.team1 == team2 && m.team2 == team1)
        })
        .collect();
    HeadToHead {
        team1: team1.to_string(),
        team2: team2.to_string(),
        wins_team1: meetings.iter().filter(|m| m.won_by(team1)).count() as u64,
        wins_team2: meetings.iter().filter(|m| m.won_by(team2)).count() as u64,
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn count_by<'a>(labels: impl Iterator<Item = &'a str>) -> HashMap<&'a str, u64> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Sort by value descending then label ascending, keeping at most `limit` entries
fn rank(groups: HashMap<&str, u64>, limit: Option<usize>) -> Vec<Tally> {
    let mut ranked: Vec<(&str, u64)> = groups.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    if let Some(limit) = limit {
        ranked.truncate(limit);
    }
    ranked
        .into_iter()
        .map(|(label, value)| Tally::new(label, value))
        .collect()
}
