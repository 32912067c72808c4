//! CLI entry point.
//!
//! Reads a prompt from stdin, a raw text file (`--file`), or a request JSON
//! file (`--json`), runs it through the router, and prints the response JSON
//! to stdout (or `--out`). Diagnostics go to stderr via `tracing`; the
//! append-only audit trail goes to the configured log file.
//!
//! ```text
//! echo "Fix this bug... stacktrace..." | model-router
//! model-router --file prompt.txt --verify
//! model-router --json request.json --out response.json
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use model_router::{RequestMeta, Router, RouterConfig, RouterError, RouterRequest};

#[derive(Debug, Default)]
struct Args {
    verify: bool,
    file: Option<PathBuf>,
    json: Option<PathBuf>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args(argv: &[String]) -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = argv.iter();
    while let Some(arg) = iter.next() {
        let mut path_arg = |name: &str| {
            iter.next()
                .map(PathBuf::from)
                .with_context(|| format!("{name} requires a path argument"))
        };
        match arg.as_str() {
            "--verify" => args.verify = true,
            "--file" => args.file = Some(path_arg("--file")?),
            "--json" => args.json = Some(path_arg("--json")?),
            "--out" => args.out = Some(path_arg("--out")?),
            "--config" => args.config = Some(path_arg("--config")?),
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }
    Ok(args)
}

async fn read_request(args: &Args) -> anyhow::Result<RouterRequest> {
    if let Some(path) = &args.json {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        return serde_json::from_str(&raw)
            .with_context(|| format!("{} is not a valid request object", path.display()));
    }

    let prompt = if let Some(path) = &args.file {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    } else {
        let mut buffer = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buffer)
            .await
            .context("failed to read prompt from stdin")?;
        buffer.trim().to_string()
    };

    Ok(RouterRequest {
        prompt,
        meta: RequestMeta::default(),
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    let config = RouterConfig::load_or_default(args.config.as_deref())
        .context("failed to load router config")?;
    let audit_log = config.audit_log_path.clone();
    let router = Router::new(config);

    let request = read_request(&args).await?;

    let response = match router.run(&request, args.verify).await {
        Ok(response) => response,
        Err(e @ RouterError::InvalidInput(_)) => {
            eprintln!("{e}. Provide a prompt via stdin, --file, or --json.");
            return Ok(ExitCode::from(2));
        }
        Err(e @ RouterError::AllProvidersFailed { .. }) => {
            eprintln!("{e}. Audit log: {}", audit_log.display());
            return Ok(ExitCode::FAILURE);
        }
    };

    let rendered = serde_json::to_string_pretty(&response)?;
    if let Some(out) = &args.out {
        std::fs::write(out, &rendered)
            .with_context(|| format!("failed to write {}", out.display()))?;
        println!("Saved: {}", out.display());
    } else {
        println!("{rendered}");
    }

    Ok(ExitCode::SUCCESS)
}
