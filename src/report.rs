//! Text summaries and file exports of an analysis run.

use crate::analysis::{HeadToHead, Tally, TeamProfile};
use crate::chart::format_value;
use crate::pipeline::AnalysisReport;
use anyhow::{Context, Result};
use csv::Writer;
use rust_xlsxwriter::{Format, FormatAlign, Workbook};
use std::path::Path;

/// Multi-line summary of a team's record
pub fn format_team_profile(profile: &TeamProfile) -> String {
    format!(
        "\n{:=^40}\nTotal Matches: {}\nWins: {}\nLosses: {}\nWin Percentage: {:.2}%",
        format!(" {} Analysis ", profile.team),
        profile.total_matches,
        profile.wins,
        profile.losses,
        profile.win_pct
    )
}

/// Both head-to-head tallies followed by the prediction line
pub fn format_prediction(h2h: &HeadToHead) -> String {
    format!(
        "\nHead to head: {} Wins = {}, {} Wins = {}\nPrediction: {}",
        h2h.team1,
        h2h.wins_team1,
        h2h.team2,
        h2h.wins_team2,
        h2h.prediction()
    )
}

/// Write a label/value series as a two-column CSV
pub fn write_summary_csv(
    path: &Path,
    headers: [&str; 2],
    rows: impl IntoIterator<Item = (String, f64)>,
) -> Result<()> {
    let mut writer = Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(headers)?;
    for (label, value) in rows {
        writer.write_record([label, format_value(value)])?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every series of the report as `<dir>/<name>.csv`. Returns the files written.
pub fn write_csv_dir(report: &AnalysisReport, dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let tallies = |rows: &[Tally]| -> Vec<(String, f64)> {
        rows.iter().map(|t| (t.label.clone(), t.value as f64)).collect()
    };
    let toss = &report.toss_outcome;
    let h2h = &report.head_to_head;
    let series: Vec<(&str, [&str; 2], Vec<(String, f64)>)> = vec![
        ("season_matches", ["Season", "Matches"], tallies(&report.season_matches)),
        ("team_wins", ["Team", "Wins"], tallies(&report.team_wins)),
        ("top_run_scorers", ["Batter", "Runs"], tallies(&report.top_run_scorers)),
        ("top_wicket_takers", ["Bowler", "Wickets"], tallies(&report.top_wicket_takers)),
        ("top_fifty_plus", ["Batter", "FiftyPlus"], tallies(&report.top_fifty_plus)),
        (
            "season_win_rates",
            ["Season", "WinPct"],
            report
                .season_win_rates
                .iter()
                .map(|r| (r.season.clone(), r.win_pct))
                .collect(),
        ),
        ("top_venues", ["Venue", "Wins"], tallies(&report.top_venues)),
        (
            "toss_outcome",
            ["Decision", "Wins"],
            vec![
                ("Bat First".to_string(), toss.bat_first_wins as f64),
                ("Chase".to_string(), toss.chase_wins as f64),
            ],
        ),
        (
            "head_to_head",
            ["Team", "Wins"],
            vec![
                (h2h.team1.clone(), h2h.wins_team1 as f64),
                (h2h.team2.clone(), h2h.wins_team2 as f64),
            ],
        ),
    ];

    let mut written = Vec::new();
    for (name, headers, rows) in series {
        let path = dir.join(format!("{}.csv", name));
        write_summary_csv(&path, headers, rows)?;
        written.push(path);
    }
    log::info!("Wrote {} summary CSVs to {}", written.len(), dir.display());
    Ok(written)
}

/// Export every summary to an Excel workbook.
///
/// Produces a Summary sheet followed by one sheet per ranked or seasonal result.
pub fn write_workbook(report: &AnalysisReport, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let title_fmt = Format::new().set_bold().set_font_size(16);
    let left_fmt = Format::new().set_align(FormatAlign::Left);
    let pct_fmt = Format::new().set_num_format("0.00");

    // ---------------------------------------------------------------
    // Summary sheet (first tab)
    // ---------------------------------------------------------------
    {
        let config = &report.config;
        let profile = &report.team_profile;
        let h2h = &report.head_to_head;

        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        sheet.set_column_width(0, 24)?;
        sheet.set_column_width(1, 40)?;
        let mut row: u32 = 0;

        sheet.write_string_with_format(row, 0, "IPL Analysis", &title_fmt)?;
        row += 2;

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        sheet.write_string_with_format(row, 0, "Generated", &bold)?;
        sheet.write_string_with_format(row, 1, &now, &left_fmt)?;
        row += 2;

        sheet.write_string_with_format(row, 0, "Team", &bold)?;
        sheet.write_string_with_format(row, 1, &config.team_name, &left_fmt)?;
        row += 1;
        for (label, value) in [
            ("Total Matches", profile.total_matches),
            ("Wins", profile.wins),
            ("Losses", profile.losses),
        ] {
            sheet.write_string_with_format(row, 0, label, &bold)?;
            sheet.write_number_with_format(row, 1, value as f64, &left_fmt)?;
            row += 1;
        }
        sheet.write_string_with_format(row, 0, "Win Percentage", &bold)?;
        sheet.write_number_with_format(row, 1, profile.win_pct, &pct_fmt)?;
        row += 2;

        sheet.write_string_with_format(row, 0, "Head to Head", &bold)?;
        sheet.write_string_with_format(
            row,
            1,
            format!("{} vs {}", h2h.team1, h2h.team2),
            &left_fmt,
        )?;
        row += 1;
        sheet.write_string_with_format(row, 0, format!("{} Wins", h2h.team1), &bold)?;
        sheet.write_number_with_format(row, 1, h2h.wins_team1 as f64, &left_fmt)?;
        row += 1;
        sheet.write_string_with_format(row, 0, format!("{} Wins", h2h.team2), &bold)?;
        sheet.write_number_with_format(row, 1, h2h.wins_team2 as f64, &left_fmt)?;
        row += 1;
        sheet.write_string_with_format(row, 0, "Prediction", &bold)?;
        sheet.write_string_with_format(row, 1, h2h.prediction().to_string(), &left_fmt)?;
    }

    let tally_sheets: [(&str, [&str; 2], &[Tally]); 6] = [
        ("Seasons", ["Season", "Matches"], report.season_matches.as_slice()),
        ("Team Wins", ["Team", "Wins"], report.team_wins.as_slice()),
        ("Run Scorers", ["Batter", "Runs"], report.top_run_scorers.as_slice()),
        ("Wicket Takers", ["Bowler", "Wickets"], report.top_wicket_takers.as_slice()),
        ("Fifty Plus", ["Batter", "50+ Scores"], report.top_fifty_plus.as_slice()),
        ("Venues", ["Venue", "Wins"], report.top_venues.as_slice()),
    ];
    for (name, headers, rows) in tally_sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(name)?;
        sheet.set_column_width(0, 36)?;
        sheet.write_string_with_format(0, 0, headers[0], &bold)?;
        sheet.write_string_with_format(0, 1, headers[1], &bold)?;
        for (i, tally) in rows.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, &tally.label)?;
            sheet.write_number(row, 1, tally.value as f64)?;
        }
    }

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Season Win Pct")?;
        sheet.write_string_with_format(0, 0, "Season", &bold)?;
        sheet.write_string_with_format(0, 1, "Win %", &bold)?;
        for (i, rate) in report.season_win_rates.iter().enumerate() {
            let row = i as u32 + 1;
            sheet.write_string(row, 0, &rate.season)?;
            sheet.write_number_with_format(row, 1, rate.win_pct, &pct_fmt)?;
        }
    }

    {
        let toss = &report.toss_outcome;
        let sheet = workbook.add_worksheet();
        sheet.set_name("Toss")?;
        sheet.write_string_with_format(0, 0, "After Winning Toss", &bold)?;
        sheet.write_string_with_format(0, 1, "Wins", &bold)?;
        sheet.write_string(1, 0, "Bat First")?;
        sheet.write_number(1, 1, toss.bat_first_wins as f64)?;
        sheet.write_string(2, 0, "Chase")?;
        sheet.write_number(2, 1, toss.chase_wins as f64)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    log::info!("Wrote workbook {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_team_profile() {
        let profile = TeamProfile {
            team: "Mumbai Indians".to_string(),
            total_matches: 10,
            wins: 6,
            losses: 4,
            win_pct: 60.0,
        };
        let text = format_team_profile(&profile);
        assert!(text.contains("Mumbai Indians Analysis"));
        assert!(text.contains("Total Matches: 10"));
        assert!(text.contains("Wins: 6"));
        assert!(text.contains("Losses: 4"));
        assert!(text.contains("Win Percentage: 60.00%"));
    }

    #[test]
    fn test_format_prediction() {
        let h2h = HeadToHead {
            team1: "Mumbai Indians".to_string(),
            team2: "Chennai Super Kings".to_string(),
            wins_team1: 5,
            wins_team2: 3,
        };
        let text = format_prediction(&h2h);
        assert!(text.contains("Mumbai Indians Wins = 5, Chennai Super Kings Wins = 3"));
        assert!(text.ends_with("Prediction: Mumbai Indians might win based on history!"));

        let tied = HeadToHead {
            wins_team2: 5,
            ..h2h
        };
        assert!(format_prediction(&tied).ends_with("Prediction: It's a close match!"));
    }

    #[test]
    fn test_write_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rates.csv");
        write_summary_csv(
            &path,
            ["Season", "WinPct"],
            vec![("2019".to_string(), 62.5), ("2020".to_string(), 40.0)],
        )
        .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Season,WinPct\n2019,62.50\n2020,40\n");
    }
}
