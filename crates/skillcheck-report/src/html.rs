//! HTML results page generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined: summary,
//! score bar, answer review, certificate block and the raw JSON.

use anyhow::Result;
use std::path::Path;

use skillcheck_core::report::{AssessmentReport, Outcome};
use skillcheck_core::scoring::Tier;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the results page for a finished assessment.
pub fn generate_html(report: &AssessmentReport) -> String {
    let results = &report.results;
    let candidate = &report.candidate;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>AI Career Assessment: {}</title>\n",
        html_escape(&candidate.name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>AI Career Assessment</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\"><strong>{}</strong> | {} | {} | {}</p>\n",
        html_escape(&candidate.name),
        html_escape(&candidate.role),
        candidate.difficulty,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Summary
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p>You answered {} questions.</p>\n",
        results.total
    ));
    html.push_str(&format!(
        "<p class=\"score\">{}</p>\n<p class=\"time\">{}</p>\n",
        results.score_line(),
        results.time_line()
    ));
    html.push_str(&score_bar(results.score(), results.tier));
    html.push_str(&format!(
        "<div class=\"recommendation\">{}</div>\n",
        html_escape(&report.recommendation)
    ));
    html.push_str("</section>\n");

    // Answer review
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Your answers</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Your answer</th><th onclick=\"sortTable(3)\">Correct</th><th>Explanation</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for entry in &results.review {
        let class = match entry.outcome {
            Outcome::Correct => "pass",
            Outcome::Incorrect => "fail",
            Outcome::Skipped => "skip",
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            class,
            entry.number,
            html_escape(&entry.title),
            html_escape(&entry.your_answer),
            html_escape(&entry.correct_answer),
            html_escape(&entry.explanation),
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    html.push_str(&certificate(report));

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write the results page to a file.
pub fn write_html_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn score_bar(score: f64, tier: Option<Tier>) -> String {
    let bar_height = 30;
    let max_width = 400;

    let width = (score.clamp(0.0, 1.0) * max_width as f64) as usize;
    let color = match tier {
        Some(Tier::Strong) => "#22c55e",
        Some(Tier::Solid) => "#eab308",
        Some(Tier::Developing) => "#ef4444",
        None => "#9ca3af",
    };
    let label = tier.map(|t| t.to_string()).unwrap_or_else(|| "-".into());

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        max_width + 160,
        bar_height
    );
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{max_width}\" height=\"{bar_height}\" fill=\"var(--border)\" rx=\"4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{bar_height}\" fill=\"{color}\" rx=\"4\"/>\n"
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.1}% ({})</text>\n",
        max_width + 8,
        bar_height / 2,
        score * 100.0,
        label
    ));
    svg.push_str("</svg>\n");
    svg
}

fn certificate(report: &AssessmentReport) -> String {
    let mut cert = String::from("<section class=\"certificate\" id=\"certificate\">\n");
    cert.push_str("<h2>Certificate of Achievement</h2>\n");
    cert.push_str("<p class=\"presented\">This is proudly presented to</p>\n");
    cert.push_str(&format!(
        "<p class=\"recipient\">{}</p>\n",
        html_escape(&report.candidate.name)
    ));
    cert.push_str("<p>For successfully completing the AI Career Path Assessment</p>\n");
    cert.push_str(&format!(
        "<p class=\"detail\">Role: {}</p>\n<p class=\"detail\">{}</p>\n<p class=\"detail\">{}</p>\n",
        html_escape(&report.candidate.role),
        report.results.score_line(),
        report.results.time_line()
    ));
    cert.push_str("</section>\n");
    cert
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --skip: #f3f4f6; --gold: #b48628; --paper: #fffff0; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --skip: #1f2937; --paper: #1c1917; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score, .time { font-size: 1.25rem; font-weight: bold; margin: 0.25rem 0; }
.recommendation { margin: 1rem 0; padding: 1rem; border-left: 4px solid var(--gold); background: var(--skip); }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.skip { background: var(--skip); }
.certificate { margin: 2rem 0; padding: 2rem; text-align: center; background: var(--paper); border: 6px double var(--gold); }
.certificate h2 { font-family: 'Times New Roman', serif; font-size: 2.25rem; margin-top: 0; }
.certificate .presented { font-style: italic; }
.certificate .recipient { font-family: 'Times New Roman', serif; font-size: 2rem; font-weight: bold; }
.certificate .detail { font-weight: bold; margin: 0.25rem 0; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
@media print { body > *:not(.certificate) { display: none; } }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    const na = Number(va), nb = Number(vb);
    if (!isNaN(na) && !isNaN(nb)) return asc ? na - nb : nb - na;
    return asc ? va.localeCompare(vb) : vb.localeCompare(va);
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use skillcheck_core::model::{Candidate, Difficulty};
    use skillcheck_core::report::{QuizResults, ReviewEntry};

    fn make_test_report() -> AssessmentReport {
        AssessmentReport {
            created_at: chrono::Utc::now(),
            candidate: Candidate::new("Grace <Hopper>", "", "Data Scientist", Difficulty::Intermediate),
            results: QuizResults {
                session_id: Some(uuid::Uuid::nil()),
                started_at: None,
                correct: 1,
                total: 2,
                elapsed_ms: 125_000,
                tier: Some(Tier::Solid),
                review: vec![
                    ReviewEntry {
                        number: 1,
                        title: "What is a 'feature'?".into(),
                        your_answer: "A column or attribute of the data.".into(),
                        correct_answer: "A column or attribute of the data.".into(),
                        explanation: "Not provided".into(),
                        outcome: Outcome::Correct,
                    },
                    ReviewEntry {
                        number: 2,
                        title: "Which library plots?".into(),
                        your_answer: "NumPy".into(),
                        correct_answer: "Matplotlib".into(),
                        explanation: "Not provided".into(),
                        outcome: Outcome::Incorrect,
                    },
                ],
            },
            recommendation: "Consider Computer Vision.".into(),
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Score: 1 / 2"));
        assert!(html.contains("Time: 02:05"));
        assert!(html.contains("Matplotlib"));
        assert!(html.contains("Consider Computer Vision."));
        assert!(html.contains("Certificate of Achievement"));
        assert!(html.contains("50.0% (solid)"));
    }

    #[test]
    fn html_escapes_candidate_input() {
        let html = generate_html(&make_test_report());
        assert!(html.contains("Grace &lt;Hopper&gt;"));
        assert!(!html.contains("<Hopper>"));
        assert!(html.contains("What is a &#x27;feature&#x27;?"));
    }

    #[test]
    fn raw_json_escapes_ampersands() {
        let mut report = make_test_report();
        report.recommendation = "R&D or <ML> &amp; ops".into();
        let html = generate_html(&report);
        let raw = &html[html.find("<pre><code>").unwrap()..html.find("</code></pre>").unwrap()];
        assert!(raw.contains("R&amp;D or &lt;ML&gt; &amp;amp; ops"));
        assert!(!raw.contains("R&D"));
    }

    #[test]
    fn empty_session_renders() {
        let mut report = make_test_report();
        report.results.correct = 0;
        report.results.total = 0;
        report.results.tier = None;
        report.results.review.clear();
        let html = generate_html(&report);
        assert!(html.contains("Score: 0 / 0"));
        assert!(html.contains("0.0% (-)"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
