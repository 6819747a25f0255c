//! Question bank loader.
//!
//! Loads question banks from TOML or JSON files and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, Question};

/// A named, ordered set of questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Role the bank targets, if any.
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Intermediate TOML structure for bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

/// JSON banks are either a bare array or `{ "questions": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonBankFile {
    Bare(Vec<Question>),
    Wrapped { questions: Vec<Question> },
}

/// Parse a bank file, choosing the format by extension.
pub fn parse_question_bank(path: &Path) -> Result<QuestionBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question bank: {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "json") {
        parse_json_bank_str(&content, path)
    } else {
        parse_question_bank_str(&content, path)
    }
}

/// Parse a TOML string into a `QuestionBank`.
pub fn parse_question_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let difficulty = parsed
        .bank
        .difficulty
        .map(|d| d.parse::<Difficulty>().map_err(|e| anyhow::anyhow!("{}", e)))
        .transpose()?;

    Ok(QuestionBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        role: parsed.bank.role,
        difficulty,
        questions: parsed.questions,
    })
}

/// Parse a JSON question list. The bank id and name come from the file stem.
pub fn parse_json_bank_str(content: &str, source_path: &Path) -> Result<QuestionBank> {
    let parsed: JsonBankFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?;
    let questions = match parsed {
        JsonBankFile::Bare(q) | JsonBankFile::Wrapped { questions: q } => q,
    };
    let stem = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "questions".to_string());

    Ok(QuestionBank {
        id: stem.clone(),
        name: stem,
        description: String::new(),
        role: None,
        difficulty: None,
        questions,
    })
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// 1-based question number (if applicable).
    pub question: Option<usize>,
    pub message: String,
}

/// Validate a question bank for common issues.
pub fn validate_question_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if bank.questions.is_empty() {
        warnings.push(ValidationWarning {
            question: None,
            message: "bank has no questions".into(),
        });
    }

    let mut seen_titles = HashSet::new();
    for (i, q) in bank.questions.iter().enumerate() {
        let number = Some(i + 1);
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                question: number,
                message,
            })
        };

        if q.title.trim().is_empty() {
            warn("title is empty".into());
        } else if !seen_titles.insert(q.title.trim().to_lowercase()) {
            warn(format!("duplicate question: {}", q.title));
        }
        if q.options.len() < 2 {
            warn(format!("needs at least 2 options, has {}", q.options.len()));
        }
        match q.correct {
            None => warn("no correct option marked".into()),
            Some(c) if c >= q.options.len() => warn(format!(
                "correct index {c} is out of range ({} options)",
                q.options.len()
            )),
            Some(_) => {}
        }
    }

    warnings
}
