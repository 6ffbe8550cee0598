//! sitex command-line entry point.
//!
//! Extracts site information for each URL argument and prints one JSON
//! document per line on stdout. Logs go to stderr.

use std::future::Future;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Value, json};
use sitex_client::agent::load_system_prompt;
use sitex_client::browser::parse_target;
use sitex_client::{
    BackendRegistry, BrowserFetcher, BrowserOptions, ExtractionAgent, ExtractionRequest, ExtractionStatus,
    PageFetcher, SiteReport,
};
use sitex_core::AppConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,sitex=info,sitex_client=info,sitex_core=info";

#[derive(Parser, Debug)]
#[command(name = "sitex", version, about = "Extract structured information from websites")]
struct Cli {
    /// TOML config file (overrides SITEX_CONFIG_FILE)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load each page in a browser and include its text in the prompt
    #[arg(long)]
    render: bool,

    /// CSS selector to wait for after navigation (with --render)
    #[arg(long, value_name = "SELECTOR", requires = "render")]
    wait_for: Option<String>,

    /// Save a full-page screenshot of every URL into DIR, taken on the page used for extraction (with --render)
    #[arg(long, value_name = "DIR", requires = "render")]
    screenshot_dir: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// URLs to process, in order
    #[arg(required = true)]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(Some(path.as_path())),
        None => AppConfig::load(),
    }
    .context("failed to load configuration")?;

    let credentials = config.require_credentials()?;
    let agent = ExtractionAgent::with_registry(&credentials, &BackendRegistry::builtin(), config.request_timeout())?
        .with_system_prompt(load_system_prompt(config.system_prompt_file.as_deref()));

    let browser = if cli.render {
        if let Some(dir) = &cli.screenshot_dir {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("cannot create screenshot directory {}", dir.display()))?;
        }
        Some(BrowserFetcher::launch(BrowserOptions::from_config(&config)).await?)
    } else {
        None
    };

    let batch = Batch { cli: &cli, agent: &agent, browser: browser.as_ref() };
    let summary = batch.run(tokio::signal::ctrl_c()).await;

    if let Some(browser) = browser
        && let Err(e) = browser.close().await
    {
        tracing::warn!(error = %e, "failed to close browser");
    }

    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        retryable = summary.retryable,
        interrupted = summary.interrupted,
        "batch finished"
    );

    if summary.failed > 0 {
        anyhow::bail!("{} of {} URLs failed", summary.failed, summary.processed);
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    processed: usize,
    failed: usize,
    /// Failures worth re-running, e.g. timeouts and backend errors.
    retryable: usize,
    interrupted: bool,
}

impl Summary {
    fn record(&mut self, output: &Value) {
        self.processed += 1;
        if output.get("status").and_then(Value::as_str) != Some(ExtractionStatus::Error.as_str()) {
            return;
        }
        self.failed += 1;
        if output.get("retryable").and_then(Value::as_bool).unwrap_or(false) {
            self.retryable += 1;
        }
    }
}

struct Batch<'a> {
    cli: &'a Cli,
    agent: &'a ExtractionAgent,
    browser: Option<&'a BrowserFetcher>,
}

impl Batch<'_> {
    /// Process every URL in order until done or `cancel` resolves.
    async fn run<F>(&self, cancel: F) -> Summary
    where
        F: Future,
    {
        tokio::pin!(cancel);
        let mut summary = Summary::default();

        for (index, url) in self.cli.urls.iter().enumerate() {
            let output = tokio::select! {
                biased;
                _ = &mut cancel => {
                    tracing::warn!(url = %url, "interrupted; skipping remaining URLs");
                    summary.interrupted = true;
                    break;
                }
                output = self.process(index, url) => output,
            };

            summary.record(&output);
            println!("{output}");
        }

        summary
    }

    async fn process(&self, index: usize, url: &str) -> Value {
        let Some(browser) = self.browser else {
            return to_json(url, &self.agent.extract(url).await);
        };

        let wait_for = self.cli.wait_for.as_deref();
        let fetched = match &self.cli.screenshot_dir {
            Some(dir) => browser.fetch_with_screenshot(url, wait_for, &screenshot_path(dir, index, url)).await,
            None => browser.fetch_page(url, wait_for).await,
        };
        let snapshot = match fetched {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(url, error = %e, "page fetch failed");
                return failure(url, e.into());
            }
        };

        let request = ExtractionRequest::new(url).with_page(snapshot.page_context());
        let extraction = self.agent.extract_request(request).await;
        let status = extraction.status();

        let mut output = to_json(url, &SiteReport::compose(&snapshot, Some(extraction)));
        if let Some(report) = output.as_object_mut() {
            report.insert("status".into(), json!(status.as_str()));
        }
        output
    }
}

fn to_json<T: serde::Serialize>(url: &str, value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| failure(url, sitex_core::Error::InvalidInput(e.to_string())))
}

fn failure(url: &str, err: sitex_core::Error) -> Value {
    json!({
        "url": url,
        "status": ExtractionStatus::Error.as_str(),
        "error": err.to_string(),
        "code": err.code(),
        "retryable": err.is_retryable(),
    })
}

/// `<dir>/<index>-<host>.png`, with the host reduced to filename-safe characters.
fn screenshot_path(dir: &Path, index: usize, url: &str) -> PathBuf {
    let host = parse_target(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "page".to_string());
    let safe: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    dir.join(format!("{:03}-{safe}.png", index + 1))
}
