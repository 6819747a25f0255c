//! skillcheck-report — human-readable renderings of an assessment report.

pub mod html;
pub mod transcript;

pub use html::{generate_html, write_html_report};
pub use transcript::{render_transcript, transcript_file_name, write_transcript};
