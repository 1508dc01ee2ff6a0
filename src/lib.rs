//! IPL Insights
//!
//! Descriptive statistics over IPL match records and ball-by-ball deliveries.
//!
//! This library provides:
//! - `data`: CSV loading of the matches and deliveries tables
//! - `analysis`: the aggregation steps (season counts, leaders, team record, head-to-head)
//! - `chart`: line-chart rendering to PNG or text
//! - `pipeline`: runs the steps in order and collects an `AnalysisReport`
//! - `report`: text summaries, CSV and Excel export
//!
//! Binaries:
//! - `ipl-stats`: command-line front end for the pipeline

pub mod analysis;
pub mod chart;
pub mod data;
pub mod pipeline;
pub mod report;

pub use analysis::{AnalysisConfig, HeadToHead, Prediction, Tally, TeamProfile, TopN};
pub use data::{Dataset, Delivery, Match, TossDecision};
pub use pipeline::{AnalysisReport, Step};
