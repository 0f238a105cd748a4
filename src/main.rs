use anyhow::{Context, Result};
use tmux_wrapper::{LayoutConfig, SystemRunner, TmuxClient};
use tracing::info;

const USAGE: &str = "usage: tmux-wrapper [<layout.yaml> <session> [--kill]]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut runner = SystemRunner::new();
    if let Ok(path) = std::env::var("TMUX_WRAPPER_BIN") {
        runner = runner.with_tmux_path(path);
    }
    if let Ok(socket) = std::env::var("TMUX_WRAPPER_SOCKET") {
        runner = runner.with_socket_name(socket);
    }
    let client = TmuxClient::with_runner(runner);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => print_sessions(&client).await,
        [layout_path, session] => materialize(&client, layout_path, session, false).await,
        [layout_path, session, flag] if flag == "--kill" => {
            materialize(&client, layout_path, session, true).await
        }
        _ => anyhow::bail!(USAGE),
    }
}

/// Hydrate every running session and dump the graph as JSON
async fn print_sessions(client: &TmuxClient) -> Result<()> {
    let sessions = client
        .list_sessions()
        .await
        .context("Failed to read tmux sessions")?;
    println!("{}", serde_json::to_string_pretty(&sessions)?);
    Ok(())
}

async fn materialize(
    client: &TmuxClient,
    layout_path: &str,
    session: &str,
    kill_session: bool,
) -> Result<()> {
    let source = tokio::fs::read_to_string(layout_path)
        .await
        .with_context(|| format!("Failed to read layout {}", layout_path))?;
    let layout = LayoutConfig::from_yaml_str(&source)
        .and_then(|config| config.normalize().map_err(Into::into))
        .with_context(|| format!("Invalid layout {}", layout_path))?;

    match client.create_session(session, &layout, kill_session).await {
        Ok(created) => {
            info!(session = created.name(), windows = layout.windows.len(), "session ready");
            println!("{}", client.attach_command(session).join(" "));
            Ok(())
        }
        Err(err) if err.is_session_exists() => {
            info!(session, "session already running, rerun with --kill to replace it");
            println!("{}", client.attach_command(session).join(" "));
            Ok(())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to create session {}", session)),
    }
}
