//! One-shot scan: prints the aggregated configs to stdout, the event log to stderr.

use std::process::ExitCode;

use freedom_guard::{config::AppConfig, AppState, LogKind, Status};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = AppConfig::from_env();
    let state = match AppState::bootstrap(&cfg).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("scan-once: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    state.scan().await;
    let snap = state.store.snapshot();

    for entry in &snap.logs {
        let tag = match entry.kind {
            LogKind::Info => "info",
            LogKind::Success => " ok ",
            LogKind::Error => "fail",
        };
        eprintln!("[{tag}] {}", entry.message);
    }
    for config in &snap.configs {
        println!("{config}");
    }

    if snap.status == Status::Success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
