//! IPL Stats - descriptive statistics over IPL match and delivery CSVs
//!
//! Loads `matches.csv` and `deliveries.csv`, runs the analysis steps, and
//! shows each result as a chart (PNG files or a text listing). Team
//! summaries and the head-to-head prediction are printed to stdout.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use ipl_insights::chart::{PngChartRenderer, TextChartRenderer};
use ipl_insights::data::{load_matches, Dataset};
use ipl_insights::pipeline::{self, Step};
use ipl_insights::report::{write_csv_dir, write_workbook};
use ipl_insights::{AnalysisConfig, TopN};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipl-stats")]
#[command(about = "Season, player and team statistics from IPL match records")]
struct Cli {
    /// Matches CSV file
    #[arg(long, global = true, default_value = "matches.csv")]
    matches: PathBuf,

    /// Deliveries (ball-by-ball) CSV file
    #[arg(long, global = true, default_value = "deliveries.csv")]
    deliveries: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analysis step in order
    Report {
        /// Team analysed by the team-specific steps
        #[arg(long, env = "IPL_TEAM", default_value = "Mumbai Indians")]
        team: String,

        /// First team of the head-to-head prediction
        #[arg(long, env = "IPL_TEAM1", default_value = "Mumbai Indians")]
        team1: String,

        /// Second team of the head-to-head prediction
        #[arg(long, env = "IPL_TEAM2", default_value = "Chennai Super Kings")]
        team2: String,

        #[command(flatten)]
        top_n: TopNArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// League-wide rankings: matches per season, team wins, top batters and bowlers
    Leaders {
        #[command(flatten)]
        top_n: TopNArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Record, season win rate, best venues and toss outcomes for one team
    Team {
        /// Team to analyse
        #[arg(long, env = "IPL_TEAM", default_value = "Mumbai Indians")]
        team: String,

        /// Number of venues to list
        #[arg(long, default_value = "5")]
        top_venues: usize,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Head-to-head record and history-based prediction for two teams
    Predict {
        #[arg(long, env = "IPL_TEAM1", default_value = "Mumbai Indians")]
        team1: String,

        #[arg(long, env = "IPL_TEAM2", default_value = "Chennai Super Kings")]
        team2: String,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct TopNArgs {
    /// Number of run scorers to list
    #[arg(long, default_value = "10")]
    top_batters: usize,

    /// Number of wicket takers to list
    #[arg(long, default_value = "10")]
    top_bowlers: usize,

    /// Number of fifty-plus scorers to list
    #[arg(long, default_value = "5")]
    top_fifties: usize,

    /// Number of venues to list
    #[arg(long, default_value = "5")]
    top_venues: usize,
}

impl TopNArgs {
    fn to_top_n(&self) -> TopN {
        TopN {
            run_scorers: self.top_batters,
            wicket_takers: self.top_bowlers,
            fifty_plus: self.top_fifties,
            venues: self.top_venues,
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Directory for PNG charts
    #[arg(long, default_value = "charts")]
    out_dir: PathBuf,

    /// Print charts as text instead of writing PNG files
    #[arg(long)]
    no_png: bool,

    /// Also export every summary to this Excel workbook
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Also write every summary as CSV files into this directory
    #[arg(long)]
    csv_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let (config, steps, output): (AnalysisConfig, Vec<Step>, OutputArgs) = match cli.command {
        Commands::Report {
            team,
            team1,
            team2,
            top_n,
            output,
        } => (
            AnalysisConfig::default()
                .with_team(team)
                .with_head_to_head(team1, team2)
                .with_top_n(top_n.to_top_n()),
            Step::ALL.to_vec(),
            output,
        ),
        Commands::Leaders { top_n, output } => (
            AnalysisConfig::default().with_top_n(top_n.to_top_n()),
            Step::LEADERS.to_vec(),
            output,
        ),
        Commands::Team {
            team,
            top_venues,
            output,
        } => (
            AnalysisConfig::default().with_team(team).with_top_n(TopN {
                venues: top_venues,
                ..TopN::default()
            }),
            Step::TEAM.to_vec(),
            output,
        ),
        Commands::Predict {
            team1,
            team2,
            output,
        } => (
            AnalysisConfig::default().with_head_to_head(team1, team2),
            vec![Step::HeadToHead],
            output,
        ),
    };

    // Deliveries are only read when a selected step uses them
    let dataset = if steps.iter().any(|s| s.needs_deliveries()) {
        Dataset::load(&cli.matches, &cli.deliveries)?
    } else {
        let matches = load_matches(&cli.matches)?;
        log::info!("Loaded {} matches from {}", matches.len(), cli.matches.display());
        Dataset {
            matches,
            deliveries: Vec::new(),
        }
    };

    let mut out = std::io::stdout();
    let report = if output.no_png {
        let mut renderer = TextChartRenderer::new(std::io::stdout());
        pipeline::run(&dataset, &config, &steps, &mut renderer, &mut out)?
    } else {
        let mut renderer = PngChartRenderer::new(&output.out_dir)?;
        let report = pipeline::run(&dataset, &config, &steps, &mut renderer, &mut out)?;
        eprintln!(
            "{} charts written to {}",
            renderer.written().len(),
            output.out_dir.display()
        );
        report
    };

    if let Some(path) = &output.xlsx {
        write_workbook(&report, path)?;
        eprintln!("Workbook written to: {}", path.display());
    }
    if let Some(dir) = &output.csv_dir {
        let written = write_csv_dir(&report, dir)?;
        eprintln!("{} summary CSVs written to: {}", written.len(), dir.display());
    }

    Ok(())
}
