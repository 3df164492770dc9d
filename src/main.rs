use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url_gate::{Classifier, Policy, RequestOptions, ReqwestTransport};

/// Check user-supplied URLs before fetching them.
#[derive(Debug, Parser)]
#[command(name = "url-gate", version)]
#[command(about = "SSRF-safe URL classification", long_about = None)]
struct Cli {
    /// TOML policy file. Defaults apply when omitted.
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify URLs and print the verdict for each.
    Check {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Fetch a URL if it is safe, re-checking every redirect.
    Fetch {
        url: String,

        /// Request timeout in seconds.
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn check(classifier: &Classifier, urls: &[String]) -> bool {
    let mut all_safe = true;
    for url in urls {
        match classifier.classify(url) {
            Ok(parsed) => println!("ok {}", parsed),
            Err(e) => {
                all_safe = false;
                println!("blocked {}: {}", url, e);
            }
        }
    }
    all_safe
}

async fn fetch(classifier: &Classifier, url: &str, timeout: u64) -> Result<()> {
    let transport = ReqwestTransport::new()?;
    let options = RequestOptions::get().timeout(std::time::Duration::from_secs(timeout));

    let result = classifier.fetch_if_safe(&transport, url, &options).await?;

    for hop in &result.chain {
        println!("-> {}", hop);
    }
    println!("{}", result.response.status());
    Ok(())
}

fn run(cli: Cli) -> Result<bool> {
    let policy = match &cli.policy {
        Some(path) => Policy::load(path)
            .with_context(|| format!("loading policy {}", path.display()))?,
        None => Policy::default(),
    };
    tracing::debug!(?policy, "policy loaded");
    let classifier = Classifier::new(policy);

    match cli.command {
        Command::Check { urls } => Ok(check(&classifier, &urls)),
        Command::Fetch { url, timeout } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("starting runtime")?;
            runtime.block_on(fetch(&classifier, &url, timeout))?;
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    init_logging();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(err) => {
            eprintln!("url-gate error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(inputs: &[&str]) -> Vec<String> {
        inputs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_check_all_safe() {
        let classifier = Classifier::default();
        assert!(check(&classifier, &urls(&["https://example.com/", "http://8.8.8.8/"])));
    }

    #[test]
    fn test_check_reports_any_blocked_url() {
        let classifier = Classifier::default();
        assert!(!check(
            &classifier,
            &urls(&["https://example.com/", "http://10.0.0.5/internal"])
        ));
        assert!(!check(&classifier, &urls(&["not a url"])));
    }

    #[test]
    fn test_cli_parses_policy_and_urls() {
        let cli = Cli::try_parse_from(["url-gate", "check", "--policy", "p.toml", "https://a.example/"])
            .unwrap();
        assert_eq!(cli.policy, Some(PathBuf::from("p.toml")));
        assert!(matches!(cli.command, Command::Check { ref urls } if urls.len() == 1));
    }
}
