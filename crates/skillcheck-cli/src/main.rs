//! skillcheck CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "skillcheck", version, about = "Batched AI career assessment quiz")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an assessment in the terminal
    Take {
        /// Candidate name
        #[arg(long, default_value = "")]
        name: String,

        /// Candidate email
        #[arg(long, default_value = "")]
        email: String,

        /// Target role (default from config)
        #[arg(long)]
        role: Option<String>,

        /// beginner, intermediate or advanced (default from config)
        #[arg(long)]
        difficulty: Option<String>,

        /// Questions per page
        #[arg(long)]
        batch_size: Option<usize>,

        /// Number of questions to request (0 = whole bank)
        #[arg(long)]
        count: Option<usize>,

        /// Serve questions from this bank file instead of the configured provider
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, txt, html, all, none
        #[arg(long, default_value = "all")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question bank file
    Validate {
        /// Path to .toml or .json bank
        #[arg(long)]
        bank: PathBuf,
    },

    /// Show a saved results file
    Show {
        /// Results JSON written by `take`
        #[arg(long)]
        results: PathBuf,
    },

    /// Create starter config and example question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skillcheck=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            name,
            email,
            role,
            difficulty,
            batch_size,
            count,
            bank,
            output,
            format,
            config,
        } => {
            commands::take::execute(commands::take::TakeArgs {
                name,
                email,
                role,
                difficulty,
                batch_size,
                count,
                bank,
                output,
                format,
                config,
            })
            .await
        }
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Show { results } => commands::show::execute(results),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
