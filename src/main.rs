mod config;
mod output;
mod pr;

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, info_span, warn, Instrument};
use tracing_subscriber::EnvFilter;

/// merged-pr: find the pull request that was merged as a given commit and
/// publish its title, body, number, labels, assignees and author as step outputs.
///
/// Inside a GitHub Actions runner every argument falls back to the
/// environment the runner provides.
#[derive(Parser, Debug)]
#[command(name = "merged-pr", version, about)]
struct Cli {
    /// GitHub API token (action input `github_token`)
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Commit SHA to resolve
    #[arg(long, env = "GITHUB_SHA")]
    sha: String,

    /// GitHub REST API base URL (defaults to GITHUB_API_URL or api.github.com)
    #[arg(long)]
    api_url: Option<String>,

    /// Path to a TOML config file (defaults to .merged-pr.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return reject_arguments(&e, &mut std::io::stdout());
        }
    };
    let span = info_span!("merged_pr", repository = %cli.repository, sha = %cli.sha);
    let mut sink = output::sink_from_env();

    let result = run(&cli, sink.as_mut()).instrument(span).await;
    finish(result, &mut std::io::stdout())
}

/// How a run ended when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Published(u64),
    NotFound,
}

/// Report the outcome to the runner as workflow commands on `out` and pick
/// the process exit code. Not finding a pull request is not a failure.
fn finish(result: Result<Outcome, Box<dyn std::error::Error>>, out: &mut dyn Write) -> ExitCode {
    let (written, code) = match result {
        Ok(Outcome::Published(number)) => {
            debug!(pr = number, "run complete");
            (Ok(()), ExitCode::SUCCESS)
        }
        Ok(Outcome::NotFound) => (
            output::commands::debug(out, "pull request not found"),
            ExitCode::SUCCESS,
        ),
        Err(e) => {
            error!(error = %e, "lookup failed");
            (output::commands::error(out, &e.to_string()), ExitCode::FAILURE)
        }
    };
    if let Err(e) = written {
        warn!(error = %e, "failed to write workflow command");
    }
    code
}

/// Invalid or missing arguments (e.g. `GITHUB_SHA` unset) fail the step with
/// an annotation, like any other failure.
fn reject_arguments(err: &clap::Error, out: &mut dyn Write) -> ExitCode {
    let rendered = err.to_string();
    let reason = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ");
    let message = format!("invalid arguments: {reason}");
    finish(Err(message.into()), out)
}

/// Resolve the commit and publish outputs to `sink`. Nothing is written to
/// the sink unless both API requests succeed.
async fn run(
    cli: &Cli,
    sink: &mut dyn output::OutputSink,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let coords = pr::parse_repository(&cli.repository)?;

    debug!("loading configuration");
    let config = config::Config::load(cli.config.as_deref())?;
    let token = config.github_token(cli.token.as_deref())?;
    let api_url = config.api_url(cli.api_url.as_deref());
    debug!(api_url = %api_url, "resolved API endpoint");

    let client = pr::GitHubClient::new(api_url, token);

    info!("resolving pull request for commit");
    let Some(pull_request) = pr::resolve(&client, &coords, &cli.sha).await? else {
        info!("pull request not found");
        return Ok(Outcome::NotFound);
    };
    info!(
        pr = pull_request.number,
        url = %pull_request.url,
        merged_by = pull_request.merged_by.as_deref().unwrap_or("-"),
        "resolved pull request"
    );

    let outputs = output::Outputs::from_pull_request(&pull_request);
    outputs.publish(sink)?;
    info!("outputs published");

    Ok(Outcome::Published(pull_request.number))
}
