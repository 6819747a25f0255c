//! The `skillcheck take` command.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use skillcheck_core::clock::ElapsedTicker;
use skillcheck_core::driver::AssessmentDriver;
use skillcheck_core::engine::{Phase, QuizSession, Step};
use skillcheck_core::model::{Candidate, Difficulty};
use skillcheck_core::report::AssessmentReport;
use skillcheck_providers::config::load_config_from;
use skillcheck_providers::{create_collaborators, ProviderConfig};
use skillcheck_report::{write_html_report, write_transcript};

/// How long to wait for in-flight explanations once the quiz ends.
const EXPLANATION_GRACE: Duration = Duration::from_secs(10);

pub struct TakeArgs {
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub difficulty: Option<String>,
    pub batch_size: Option<usize>,
    pub count: Option<usize>,
    pub bank: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: String,
    pub config: Option<PathBuf>,
}

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// 0-based option index.
    Choose(usize),
    Next,
    Prev,
    Skip,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let input = line.trim().to_lowercase();
    match input.as_str() {
        "" => Command::Empty,
        "n" | "next" => Command::Next,
        "p" | "prev" | "previous" => Command::Prev,
        "s" | "skip" => Command::Skip,
        "q" | "quit" => Command::Quit,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 => Command::Choose(n - 1),
            _ => Command::Unknown(other.to_string()),
        },
    }
}

pub async fn execute(args: TakeArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;
    if let Some(bank) = args.bank {
        config.provider = ProviderConfig::Offline {
            bank_path: Some(bank),
        };
    }
    if let Some(batch_size) = args.batch_size {
        anyhow::ensure!(batch_size >= 1, "batch size must be at least 1");
        config.batch_size = batch_size;
    }
    if let Some(count) = args.count {
        config.question_count = count;
    }

    let difficulty = match &args.difficulty {
        Some(d) => d.parse::<Difficulty>().map_err(anyhow::Error::msg)?,
        None => config.default_difficulty,
    };
    let role = args.role.as_deref().unwrap_or(&config.default_role);
    let candidate = Candidate::new(&args.name, &args.email, role, difficulty);

    let collaborators = create_collaborators(&config)?;
    let session = QuizSession::new().with_thresholds(config.thresholds);
    let mut driver = AssessmentDriver::with_session(session, collaborators, config.driver_config());

    eprintln!(
        "skillcheck v{}: {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        candidate.name,
        candidate.role,
        candidate.difficulty
    );

    if driver.start(candidate).await? == Phase::Empty {
        println!("No questions available. Check the configured provider or question bank.");
        return Ok(());
    }

    run_quiz(&mut driver).await?;

    if tokio::time::timeout(EXPLANATION_GRACE, async {
        while driver.next_explanation().await.is_some() {}
    })
    .await
    .is_err()
    {
        tracing::warn!("giving up on {} pending explanation(s)", driver.pending_explanations());
    }

    let report = driver.finish().await;
    print_results(&report);

    let output = args.output.unwrap_or_else(|| config.output_dir.clone());
    save_reports(&report, &output, &args.format)
}

/// Read commands from stdin until the quiz completes, the user quits or
/// input ends.
async fn run_quiz(driver: &mut AssessmentDriver) -> Result<()> {
    let started = driver
        .session()
        .started()
        .unwrap_or_else(tokio::time::Instant::now);
    let mut ticker = ElapsedTicker::new(started);
    let show_clock = std::io::stderr().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    show_question(driver.session());

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read input")? else {
                    break;
                };
                match parse_command(&line) {
                    Command::Choose(option) => match driver.select_answer(option) {
                        Ok(()) => {
                            let session = driver.session();
                            if let Some(text) = session
                                .current_question()
                                .and_then(|q| q.option_text(option))
                            {
                                println!("Selected: {text}");
                            }
                        }
                        Err(e) => println!("{e}"),
                    },
                    Command::Next => {
                        if driver.advance() == Step::Completed {
                            break;
                        }
                        show_question(driver.session());
                        continue;
                    }
                    Command::Prev => {
                        driver.retreat();
                        show_question(driver.session());
                        continue;
                    }
                    Command::Skip => {
                        if driver.skip() == Step::Completed {
                            break;
                        }
                        show_question(driver.session());
                        continue;
                    }
                    Command::Quit => break,
                    Command::Empty => {}
                    Command::Unknown(input) => println!("Unknown command: {input}"),
                }
                prompt(driver.session());
            }
            elapsed = ticker.tick(), if show_clock => {
                eprint!("\r[{elapsed}] ");
            }
            Some(applied) = driver.next_explanation(), if driver.pending_explanations() > 0 => {
                tracing::debug!(applied, "explanation received");
            }
        }
    }

    if show_clock {
        eprintln!("\r[{}]", ticker.now());
    }
    Ok(())
}

fn show_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let pos = session.position();
    let total = session.len();
    println!(
        "\nQuestion {} of {} (page {} of {})",
        pos.global + 1,
        total,
        pos.batch + 1,
        total.div_ceil(session.batch_size())
    );
    println!("{}", question.title);

    let chosen = session.answer(pos.global).and_then(|a| a.selected());
    for (i, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(i) { "*" } else { " " };
        println!(" {marker} {}) {option}", i + 1);
    }
    prompt(session);
}

fn prompt(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    print!(
        "[1-{}] answer, n)ext, p)rev, s)kip, q)uit > ",
        question.options.len()
    );
    let _ = std::io::stdout().flush();
}

fn print_results(report: &AssessmentReport) {
    let results = &report.results;
    println!("\n\nYou answered {} questions.", results.total);
    println!("{}", results.score_line());
    println!("{}", results.time_line());
    println!("\n{}", report.recommendation);

    if results.review.is_empty() {
        return;
    }
    println!("\nYour answers:\n");
    for entry in &results.review {
        println!(
            "{}. {}\nYour answer: {}\nCorrect: {}\nExplanation: {}\n",
            entry.number, entry.title, entry.your_answer, entry.correct_answer, entry.explanation
        );
    }
}

fn save_reports(report: &AssessmentReport, output: &std::path::Path, format: &str) -> Result<()> {
    let formats: Vec<&str> = match format {
        "all" => vec!["json", "txt", "html"],
        "none" => return Ok(()),
        other => other.split(',').map(str::trim).collect(),
    };

    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    for fmt in formats {
        match fmt {
            "json" => {
                let path = output.join(format!("results-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "txt" | "text" => {
                let path = write_transcript(report, output)?;
                eprintln!("Transcript: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("results-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(parse_command("1"), Command::Choose(0));
        assert_eq!(parse_command(" 4 \n"), Command::Choose(3));
        assert_eq!(parse_command("N"), Command::Next);
        assert_eq!(parse_command("prev"), Command::Prev);
        assert_eq!(parse_command("s"), Command::Skip);
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("   "), Command::Empty);
        assert_eq!(parse_command("0"), Command::Unknown("0".into()));
        assert_eq!(parse_command("x"), Command::Unknown("x".into()));
    }
}
