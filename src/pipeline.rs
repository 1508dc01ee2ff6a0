//! Pipeline functions for programmatic use by the CLI.
//!
//! Runs the analysis steps in order over an already loaded [`Dataset`],
//! hands each series to a [`ChartRenderer`], writes the text summaries, and
//! returns everything as structured data.

use crate::analysis::{
    self, AnalysisConfig, HeadToHead, SeasonRate, Tally, TeamProfile, TossOutcome,
};
use crate::chart::{Chart, ChartRenderer, Rgb};
use crate::data::Dataset;
use crate::report::{format_prediction, format_team_profile};
use anyhow::Result;
use std::io::Write;

/// One analysis step, in presentation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    SeasonMatches,
    TeamWins,
    RunScorers,
    WicketTakers,
    FiftyPlus,
    TeamProfile,
    SeasonWinRate,
    TopVenues,
    TossDecision,
    HeadToHead,
}

impl Step {
    pub const ALL: [Step; 10] = [
        Step::SeasonMatches,
        Step::TeamWins,
        Step::RunScorers,
        Step::WicketTakers,
        Step::FiftyPlus,
        Step::TeamProfile,
        Step::SeasonWinRate,
        Step::TopVenues,
        Step::TossDecision,
        Step::HeadToHead,
    ];

    /// League-wide rankings
    pub const LEADERS: [Step; 5] = [
        Step::SeasonMatches,
        Step::TeamWins,
        Step::RunScorers,
        Step::WicketTakers,
        Step::FiftyPlus,
    ];

    /// Steps about the configured team
    pub const TEAM: [Step; 4] = [
        Step::TeamProfile,
        Step::SeasonWinRate,
        Step::TopVenues,
        Step::TossDecision,
    ];

    /// Whether the step reads the deliveries table
    pub fn needs_deliveries(self) -> bool {
        matches!(self, Step::RunScorers | Step::WicketTakers | Step::FiftyPlus)
    }
}

/// Every summary produced by one run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub season_matches: Vec<Tally>,
    pub team_wins: Vec<Tally>,
    pub top_run_scorers: Vec<Tally>,
    pub top_wicket_takers: Vec<Tally>,
    pub top_fifty_plus: Vec<Tally>,
    pub team_profile: TeamProfile,
    pub season_win_rates: Vec<SeasonRate>,
    pub top_venues: Vec<Tally>,
    pub toss_outcome: TossOutcome,
    pub head_to_head: HeadToHead,
}

impl AnalysisReport {
    /// Compute every summary without displaying anything
    pub fn compute(dataset: &Dataset, config: &AnalysisConfig) -> Self {
        let matches = &dataset.matches;
        let deliveries = &dataset.deliveries;
        let team = config.team_name.as_str();
        let top_n = config.top_n;

        AnalysisReport {
            config: config.clone(),
            season_matches: analysis::matches_per_season(matches),
            team_wins: analysis::wins_per_team(matches),
            top_run_scorers: analysis::top_run_scorers(deliveries, top_n.run_scorers),
            top_wicket_takers: analysis::top_wicket_takers(deliveries, top_n.wicket_takers),
            top_fifty_plus: analysis::top_fifty_plus_scorers(deliveries, top_n.fifty_plus),
            team_profile: analysis::team_profile(matches, team),
            season_win_rates: analysis::season_win_rates(matches, team),
            top_venues: analysis::top_winning_venues(matches, team, top_n.venues),
            toss_outcome: analysis::toss_decision_outcomes(matches, team),
            head_to_head: analysis::head_to_head(matches, &config.team1, &config.team2),
        }
    }

    /// Problems with the configured teams that make the selected steps empty
    pub fn warnings(&self, steps: &[Step]) -> Vec<String> {
        let config = &self.config;
        let mut warnings = Vec::new();
        if steps.iter().any(|s| Step::TEAM.contains(s)) && self.team_profile.total_matches == 0 {
            warnings.push(format!(
                "Team '{}' does not appear in the matches table",
                config.team_name
            ));
        }
        if steps.contains(&Step::HeadToHead) && self.head_to_head.total_meetings_won() == 0 {
            warnings.push(format!(
                "No decided matches between '{}' and '{}'",
                config.team1, config.team2
            ));
        }
        warnings
    }

    /// The chart for a step, or `None` for the text-only team profile
    pub fn chart(&self, step: Step) -> Option<Chart> {
        let team = &self.config.team_name;
        let top_n = self.config.top_n;
        let chart = match step {
            Step::SeasonMatches => {
                Chart::line("Matches per Season", "Season", "Number of Matches", Rgb::BLUE)
                    .with_tallies(&self.season_matches)
            }
            Step::TeamWins => Chart::line("Most Winning Teams", "Teams", "Wins", Rgb::GREEN)
                .with_tallies(&self.team_wins),
            Step::RunScorers => Chart::line(
                format!("Top {} Run Scorers", top_n.run_scorers),
                "Batsman",
                "Total Runs",
                Rgb::PURPLE,
            )
            .with_tallies(&self.top_run_scorers),
            Step::WicketTakers => Chart::line(
                format!("Top {} Wicket Takers", top_n.wicket_takers),
                "Bowler",
                "Wickets",
                Rgb::TEAL,
            )
            .with_tallies(&self.top_wicket_takers),
            Step::FiftyPlus => Chart::line(
                format!("Top {} Players with Most 50+ Scores", top_n.fifty_plus),
                "Batsman",
                "No. of 50+ scores",
                Rgb::ORANGE,
            )
            .with_tallies(&self.top_fifty_plus),
            Step::TeamProfile => return None,
            Step::SeasonWinRate => Chart::line(
                format!("{} - Win % by Season", team),
                "Season",
                "Win Percentage",
                Rgb::BLUE,
            )
            .with_points(
                self.season_win_rates
                    .iter()
                    .map(|r| (r.season.clone(), r.win_pct)),
            ),
            Step::TopVenues => Chart::line(
                format!("Top {} Venues where {} Wins Most", top_n.venues, team),
                "Venue",
                "Wins",
                Rgb::GREEN,
            )
            .with_tallies(&self.top_venues),
            Step::TossDecision => Chart::line(
                format!("{} Wins: Batting First vs Chasing", team),
                "",
                "Number of Wins",
                Rgb::BROWN,
            )
            .with_points(vec![
                ("Bat First".to_string(), self.toss_outcome.bat_first_wins as f64),
                ("Chase".to_string(), self.toss_outcome.chase_wins as f64),
            ]),
            Step::HeadToHead => {
                let h2h = &self.head_to_head;
                Chart::line(
                    format!("{} vs {} - Head to Head", h2h.team1, h2h.team2),
                    "",
                    "Wins",
                    Rgb::BLACK,
                )
                .with_points(vec![
                    (h2h.team1.clone(), h2h.wins_team1 as f64),
                    (h2h.team2.clone(), h2h.wins_team2 as f64),
                ])
                .with_dashed_overlay("Prediction Line", Rgb::RED)
            }
        };
        Some(chart)
    }
}

/// Run `steps` in order: charts go to `renderer`, text summaries to `out`.
///
/// Returns the full report; summaries for steps not listed are still
/// computed but not displayed.
pub fn run(
    dataset: &Dataset,
    config: &AnalysisConfig,
    steps: &[Step],
    renderer: &mut dyn ChartRenderer,
    out: &mut dyn Write,
) -> Result<AnalysisReport> {
    let report = AnalysisReport::compute(dataset, config);
    for warning in report.warnings(steps) {
        log::warn!("{}", warning);
    }

    for &step in steps {
        log::debug!("Running step {:?}", step);
        if let Some(chart) = report.chart(step) {
            renderer.render(&chart)?;
        }
        match step {
            Step::TeamProfile => {
                writeln!(out, "{}", format_team_profile(&report.team_profile))?;
            }
            Step::HeadToHead => {
                writeln!(out, "{}", format_prediction(&report.head_to_head))?;
            }
            _ => {}
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::TextChartRenderer;
    use crate::data::{Delivery, Match, TossDecision};

    struct Recorder(Vec<Chart>);

    impl ChartRenderer for Recorder {
        fn render(&mut self, chart: &Chart) -> Result<()> {
            self.0.push(chart.clone());
            Ok(())
        }
    }

    fn dataset() -> Dataset {
        let game = |season: &str, team1: &str, team2: &str, winner: &str, decision| Match {
            id: None,
            season: season.to_string(),
            team1: team1.to_string(),
            team2: team2.to_string(),
            winner: Some(winner.to_string()),
            venue: "Wankhede Stadium".to_string(),
            toss_winner: team1.to_string(),
            toss_decision: decision,
        };
        Dataset {
            matches: vec![
                game("2019", "MI", "CSK", "MI", TossDecision::Bat),
                game("2019", "CSK", "MI", "CSK", TossDecision::Field),
                game("2020", "MI", "RCB", "MI", TossDecision::Field),
            ],
            deliveries: vec![Delivery {
                match_id: 1,
                batter: "Rohit".to_string(),
                bowler: "Chahar".to_string(),
                batsman_runs: 6,
                dismissal_kind: None,
            }],
        }
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
            .with_team("MI")
            .with_head_to_head("MI", "CSK")
    }

    #[test]
    fn test_run_all_renders_nine_charts() {
        let mut recorder = Recorder(Vec::new());
        let mut out: Vec<u8> = Vec::new();
        let report = run(&dataset(), &config(), &Step::ALL, &mut recorder, &mut out).unwrap();

        assert_eq!(recorder.0.len(), 9);
        assert_eq!(recorder.0[0].title, "Matches per Season");
        assert_eq!(recorder.0[8].title, "MI vs CSK - Head to Head");
        assert!(recorder.0[8].overlay.is_some());

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total Matches: 3"));
        assert!(text.contains("It's a close match!"));
        assert_eq!(report.toss_outcome.bat_first_wins, 1);
        assert_eq!(report.toss_outcome.chase_wins, 1);
    }

    #[test]
    fn test_run_selected_steps_only() {
        let mut recorder = Recorder(Vec::new());
        let mut out: Vec<u8> = Vec::new();
        run(&dataset(), &config(), &[Step::HeadToHead], &mut recorder, &mut out).unwrap();
        assert_eq!(recorder.0.len(), 1);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Total Matches"));
        assert!(text.contains("MI Wins = 1"));
    }

    #[test]
    fn test_toss_chart_points() {
        let report = AnalysisReport::compute(&dataset(), &config());
        let chart = report.chart(Step::TossDecision).unwrap();
        assert_eq!(chart.points[0], ("Bat First".to_string(), 1.0));
        assert_eq!(chart.points[1], ("Chase".to_string(), 1.0));
        assert!(report.chart(Step::TeamProfile).is_none());
    }

    #[test]
    fn test_rerun_is_identical() {
        let mut first = TextChartRenderer::new(Vec::new());
        let mut second = TextChartRenderer::new(Vec::new());
        let a = run(&dataset(), &config(), &Step::ALL, &mut first, &mut std::io::sink()).unwrap();
        let b = run(&dataset(), &config(), &Step::ALL, &mut second, &mut std::io::sink()).unwrap();
        assert_eq!(a, b);
        assert_eq!(first.into_inner(), second.into_inner());
    }

    #[test]
    fn test_warnings_for_absent_teams() {
        let report = AnalysisReport::compute(&dataset(), &config());
        assert!(report.warnings(&Step::ALL).is_empty());

        let absent = AnalysisConfig::default()
            .with_team("Kochi Tuskers Kerala")
            .with_head_to_head("Kochi Tuskers Kerala", "MI");
        let report = AnalysisReport::compute(&dataset(), &absent);
        assert_eq!(report.team_profile.total_matches, 0);
        let warnings = report.warnings(&Step::ALL);
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'Kochi Tuskers Kerala' does not appear"));
        assert!(warnings[1].starts_with("No decided matches"));

        // Only the steps that use a team can warn about it
        assert!(report.warnings(&Step::LEADERS).is_empty());
        assert_eq!(report.warnings(&[Step::TopVenues]).len(), 1);
    }

    #[test]
    fn test_step_groups() {
        assert!(Step::LEADERS.iter().any(|s| s.needs_deliveries()));
        assert!(!Step::TEAM.iter().any(|s| s.needs_deliveries()));
        assert!(!Step::HeadToHead.needs_deliveries());
    }
}
