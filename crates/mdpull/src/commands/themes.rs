//! `mdpull themes` command implementation.

use std::fmt::Write;
use std::path::PathBuf;

use clap::Args;
use mdpull_config::Config;
use mdpull_renderer::SyntectHighlighter;

use crate::error::CliError;
use crate::output::write_result;

/// Arguments for the themes command.
#[derive(Args)]
pub(crate) struct ThemesArgs {
    /// Path to configuration file (default: auto-discover mdpull.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl ThemesArgs {
    /// List bundled themes, marking the configured one.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let listing = format_themes(&SyntectHighlighter::theme_names(), &config.highlight.theme);
        write_result(None, &listing)?;
        Ok(())
    }
}

fn format_themes(names: &[String], active: &str) -> String {
    let mut out = String::new();
    for name in names {
        let marker = if name == active { '*' } else { ' ' };
        writeln!(out, "{marker} {name}").unwrap();
    }
    out
}
