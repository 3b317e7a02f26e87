//! printarea CLI - Command-line interface library
//!
//! This library provides the CLI functionality for printarea:
//! - Render: Region extraction, accessibility passes and PDF output
//! - Extract: Print the printable region of a page
//! - Normalize: Print the assembled accessible HTML
//! - Outline: Show headings, image alternative texts and links
//! - Check: Report degradations and heading hierarchy issues
//!
//! # Binary Usage
//!
//! ```bash
//! # Render the print-area region of a saved page to PDF
//! printarea render page.html --title "Annual Report" --download
//!
//! # Preview the assembled document as HTML
//! printarea render page.html --backend html --output preview.html
//!
//! # Check heading structure, JSON for tooling
//! printarea check page.html --format json
//! ```

pub mod app;

pub use app::{
    apply_overrides, backend_for, check_command, extract_command, normalize_command,
    outline_command, outline_text, render_command,
};
pub use app::{run_cli, BackendArg, OutputFormat};
