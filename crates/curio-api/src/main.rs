//! curio CLI and REST API entry point.
//!
//! Binary name: `curio`
//!
//! Parses CLI arguments, wires the recommender, then dispatches to the
//! command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, KeyCommand};
use state::{AppState, InitOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(e) = curio_observe::tracing_setup::init_tracing(cli.otel) {
        eprintln!("Warning: tracing setup failed: {e}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "curio", &mut std::io::stdout());
        return Ok(());
    }

    let options = InitOptions {
        content_path: cli.content.clone(),
        no_embeddings: cli.no_embeddings,
        vault_password: cli.vault_password.clone(),
    };
    let state = AppState::init(&options).await?;

    let result = run(cli, state).await;
    curio_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Recommend(args) => {
            cli::recommend::recommend(&state, args, cli.json).await?;
        }

        Commands::Quota { user } => {
            cli::quota::show_quota(&state, &user, cli.json).await?;
        }

        Commands::Invalidate { user } => {
            cli::cache::invalidate(&state, &user, cli.json).await?;
        }

        Commands::Key { action } => match action {
            KeyCommand::Set { user, value } => {
                cli::key::set_key(&state, &user, value.as_deref(), cli.json).await?;
            }
            KeyCommand::Delete { user } => {
                cli::key::delete_key(&state, &user, cli.json).await?;
            }
            KeyCommand::Show { user } => {
                cli::key::show_key(&state, &user, cli.json).await?;
            }
        },

        Commands::Serve { port, host } => {
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!();
            println!(
                "  {} curio API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let maintenance = state.spawn_maintenance(std::time::Duration::from_secs(60));
            let router = http::router::build_router(state);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            maintenance.abort();

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
