//! The `skillcheck show` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use skillcheck_core::report::{AssessmentReport, Outcome};

pub fn execute(results_path: PathBuf) -> Result<()> {
    let report = AssessmentReport::load_json(&results_path)?;
    let results = &report.results;

    let mut summary = Table::new();
    summary.set_header(vec!["Candidate", "Role", "Difficulty", "Score", "Tier", "Time"]);
    summary.add_row(vec![
        Cell::new(&report.candidate.name),
        Cell::new(&report.candidate.role),
        Cell::new(report.candidate.difficulty),
        Cell::new(format!(
            "{}/{} ({:.1}%)",
            results.correct,
            results.total,
            results.score() * 100.0
        )),
        Cell::new(results.tier.map(|t| t.to_string()).unwrap_or_else(|| "-".into())),
        Cell::new(skillcheck_core::clock::format_elapsed(results.elapsed_ms)),
    ]);
    println!("{summary}");
    println!("\n{}", report.recommendation);

    if results.review.is_empty() {
        return Ok(());
    }

    let mut review = Table::new();
    review.set_header(vec!["#", "Question", "Your answer", "Correct", "Result"]);
    for entry in &results.review {
        let outcome = match entry.outcome {
            Outcome::Correct => "OK",
            Outcome::Incorrect => "WRONG",
            Outcome::Skipped => "SKIP",
        };
        review.add_row(vec![
            Cell::new(entry.number),
            Cell::new(&entry.title),
            Cell::new(&entry.your_answer),
            Cell::new(&entry.correct_answer),
            Cell::new(outcome),
        ]);
    }
    println!("\n{review}");

    Ok(())
}
