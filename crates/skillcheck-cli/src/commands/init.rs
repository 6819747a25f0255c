//! The `skillcheck init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create skillcheck.toml
    if std::path::Path::new("skillcheck.toml").exists() {
        println!("skillcheck.toml already exists, skipping.");
    } else {
        std::fs::write("skillcheck.toml", SAMPLE_CONFIG)?;
        println!("Created skillcheck.toml");
    }

    // Create example question bank
    std::fs::create_dir_all("banks")?;
    let example_path = std::path::Path::new("banks/example.toml");
    if example_path.exists() {
        println!("banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit skillcheck.toml (set HF_API_KEY to use the Hugging Face provider)");
    println!("  2. Run: skillcheck validate --bank banks/example.toml");
    println!("  3. Run: skillcheck take --bank banks/example.toml --name \"Your Name\"");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# skillcheck configuration

batch_size = 5
# 0 serves the whole bank offline, or 5 generated questions
question_count = 0
default_role = "Data Scientist"
default_difficulty = "intermediate"
output_dir = "./skillcheck-results"
# "thresholds" scores locally, "provider" asks the configured model
recommendation = "thresholds"

[provider]
type = "offline"

# [provider]
# type = "huggingface"
# api_key = "${HF_API_KEY}"
# model = "google/gemma-2-2b-it"

[thresholds]
strong = 0.8
solid = 0.5
"#;

const EXAMPLE_BANK: &str = r#"[bank]
id = "example"
name = "Example Bank"
description = "A small question bank to get started"
role = "Data Scientist"
difficulty = "beginner"

[[questions]]
title = "Which of these is a popular library for data visualization in Python?"
options = ["NumPy", "Pandas", "Matplotlib", "Scipy"]
correct = 2

[[questions]]
title = "Which of the following is an example of an unsupervised learning algorithm?"
options = ["Linear Regression", "Decision Tree", "K-Means Clustering", "Support Vector Machine"]
correct = 2

[[questions]]
title = "What is a 'feature' in the context of a dataset?"
options = ["A row in the dataset.", "A column or attribute of the data.", "The final output of a model.", "A unique data point."]
correct = 1
explanation = "Features are the measurable attributes a model learns from, one per column."
"#;
