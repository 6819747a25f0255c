//! Plain-text transcript of a finished assessment.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use skillcheck_core::report::AssessmentReport;

/// Render the downloadable transcript.
///
/// A header with the candidate's name and role, then one block per question
/// in session order.
pub fn render_transcript(report: &AssessmentReport) -> String {
    let mut out = format!(
        "AI Career Assessment Report\n\nName: {}\nRole: {}\n\n",
        report.candidate.name, report.candidate.role
    );
    for entry in &report.results.review {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "{}. {}\nYour answer: {}\nCorrect: {}\nExplanation: {}\n\n",
            entry.number, entry.title, entry.your_answer, entry.correct_answer, entry.explanation
        );
    }
    out
}

/// `{name}_Report.txt`, with each whitespace run in the name collapsed to `_`.
pub fn transcript_file_name(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                stem.push('_');
            }
            in_space = true;
        } else {
            stem.push(c);
            in_space = false;
        }
    }
    format!("{stem}_Report.txt")
}

/// Write the transcript into `dir` and return the file path.
pub fn write_transcript(report: &AssessmentReport, dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(transcript_file_name(&report.candidate.name));
    std::fs::write(&path, render_transcript(report))
        .with_context(|| format!("failed to write transcript to {}", path.display()))?;
    Ok(path)
}
