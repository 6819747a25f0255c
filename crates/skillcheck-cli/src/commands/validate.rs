//! The `skillcheck validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let bank = skillcheck_core::parser::parse_question_bank(&bank_path)?;

    println!("Question bank: {} ({} questions)", bank.name, bank.questions.len());

    let warnings = skillcheck_core::parser::validate_question_bank(&bank);
    for w in &warnings {
        let prefix = w
            .question
            .map(|n| format!("  [Q{n}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Question bank valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
