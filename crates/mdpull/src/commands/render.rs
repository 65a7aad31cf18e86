//! `mdpull render` command implementation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use mdpull_config::{CliSettings, Config, TransformConfig};
use mdpull_remote::{
    ContentRequest, HttpFetcher, LoadState, Pipeline, RemoteDocument, Transform, View,
};
use mdpull_renderer::{CodeHighlighter, MarkdownParser, PlainHighlighter, SyntectHighlighter};

use crate::error::CliError;
use crate::output::{Output, write_result};

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Document URLs to fetch. Each is loaded independently.
    #[arg(required = true)]
    locators: Vec<String>,

    /// Path to configuration file (default: auto-discover mdpull.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write HTML to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// User-Agent header (overrides config).
    #[arg(long)]
    user_agent: Option<String>,

    /// Bearer token for private sources (overrides config).
    #[arg(long, env = "MDPULL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Text shown for documents that have not loaded (overrides config).
    #[arg(long)]
    placeholder: Option<String>,

    /// Highlight theme (overrides config).
    #[arg(long)]
    theme: Option<String>,

    /// Render code blocks without syntax highlighting.
    #[arg(long)]
    no_highlight: bool,

    /// Remove leading YAML front matter before parsing.
    #[arg(long)]
    strip_front_matter: bool,

    /// Remove a leading `# Title` line before parsing.
    #[arg(long)]
    drop_title: bool,

    /// Report the title taken from each document's first H1.
    #[arg(long)]
    extract_title: bool,

    /// Keep HTML embedded in documents instead of escaping it.
    #[arg(long)]
    raw_html: bool,

    /// Enable verbose output (fetch and lifecycle logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the output cannot be
    /// written, or any document failed to load.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = self.cli_settings();
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if let Some(path) = &config.config_path {
            output.detail(&format!("Config: {}", path.display()));
        }

        let pipeline = build_pipeline(&config)?;
        let transform = build_transform(&config.transform);

        let documents: Vec<RemoteDocument> = self
            .locators
            .iter()
            .map(|locator| {
                let mut request = ContentRequest::new(locator.as_str())
                    .with_placeholder(config.render.placeholder.as_str());
                if let Some(transform) = &transform {
                    request = request.with_transform(transform.clone());
                }
                RemoteDocument::mount(request, pipeline.clone())
            })
            .collect();
        tracing::info!(documents = documents.len(), "Mounted documents");

        let mut html = String::new();
        let mut failed = 0;
        for doc in &documents {
            let locator = doc.request().locator.as_str();
            match doc.settled().await {
                LoadState::Ready { document } => {
                    output.success(&format!("{locator}: {} nodes", document.len()));
                }
                LoadState::Failed { reason } => {
                    failed += 1;
                    output.warning(&format!("{locator}: {reason}"));
                }
                LoadState::Pending => {}
            }

            let view = doc.view();
            if let View::Content(rendered) = &view
                && let Some(title) = &rendered.title
            {
                output.info(&format!("Title: {title}"));
            }
            html.push_str(&view.html());
            html.push('\n');
        }

        write_result(self.output.as_deref(), &html)?;

        if failed > 0 {
            return Err(CliError::Failed {
                failed,
                total: documents.len(),
            });
        }
        Ok(())
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            user_agent: self.user_agent.clone(),
            token: self.token.clone(),
            placeholder: self.placeholder.clone(),
            theme: self.theme.clone(),
            highlight_enabled: self.no_highlight.then_some(false),
            extract_title: self.extract_title.then_some(true),
            raw_html: self.raw_html.then_some(true),
            strip_front_matter: self.strip_front_matter.then_some(true),
            drop_title: self.drop_title.then_some(true),
        }
    }
}

/// Assemble fetcher, parser and highlighter from configuration.
fn build_pipeline(config: &Config) -> Result<Pipeline, CliError> {
    let fetcher = HttpFetcher::new()
        .with_user_agent(config.fetch.user_agent.as_str())
        .with_accept(config.fetch.accept.as_str())
        .with_bearer_token(config.fetch.token.clone());

    let highlighter: Arc<dyn CodeHighlighter> = if config.highlight.enabled {
        Arc::new(SyntectHighlighter::with_theme(&config.highlight.theme)?)
    } else {
        Arc::new(PlainHighlighter)
    };

    Ok(Pipeline::new(Arc::new(fetcher), highlighter)
        .with_parser(Arc::new(MarkdownParser::new().with_gfm(config.render.gfm)))
        .with_title_extraction(config.render.extract_title)
        .with_raw_html(config.render.raw_html))
}

/// Compose the configured built-in transforms, front matter first.
fn build_transform(config: &TransformConfig) -> Option<Transform> {
    let mut transforms = Vec::new();
    if config.strip_front_matter {
        transforms.push(Transform::strip_front_matter());
    }
    if config.drop_title {
        transforms.push(Transform::drop_first_heading());
    }
    Transform::chain(transforms)
}
