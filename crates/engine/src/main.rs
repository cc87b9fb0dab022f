//! Talegraph - command-line checks for dialogue projects.

use std::path::Path;
use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use talegraph_engine::{commands, EngineConfig};

fn main() -> anyhow::Result<ExitCode> {
    // Load environment from repo root, then the working directory.
    config_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talegraph_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args().skip(1);
    let command = args.next();

    let mut config = EngineConfig::from_env()?;
    if let Some(root) = args.next() {
        config = config.with_project_root(root);
    }
    if let Some(extra) = args.next() {
        anyhow::bail!("Unexpected argument: {extra}\n\n{}", commands::USAGE);
    }

    let store = config.store();
    let root = config.project_root.as_path();
    let mut out = std::io::stdout().lock();

    let clean = match command.as_deref() {
        Some("validate") => commands::validate(&store, root, &mut out)?,
        Some("cycles") => commands::cycles(&store, root, &mut out)?,
        Some("outline") => commands::outline(&store, root, &mut out)?,
        Some("format") => commands::format(&store, root, &mut out)?,
        Some(cmd) => anyhow::bail!("Unknown command: {cmd}\n\n{}", commands::USAGE),
        None => anyhow::bail!("{}", commands::USAGE),
    };

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn config_dotenv() {
    let repo_root = Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..");
    talegraph_engine::config::load_dotenv(&repo_root);
    talegraph_engine::config::load_dotenv(Path::new("."));
}
