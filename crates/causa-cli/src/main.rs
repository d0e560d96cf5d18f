//! Causa CLI: the `causa` command.

mod cli;
mod commands;
mod config;
mod error;
mod render;
mod support;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "warn";

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(configured: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| support::exit_with(&e));
    init_tracing(config.log.filter.as_deref());

    match cli.command {
        Commands::Analyze {
            graph,
            context,
            json,
            no_counterfactuals,
        } => {
            let code = commands::analyze::run(
                commands::analyze::Args {
                    graph,
                    context,
                    json,
                    no_counterfactuals,
                },
                &config,
            );
            std::process::exit(code);
        }

        Commands::Stats { graph, json } => {
            commands::stats::run(graph, config.wants_json(json));
        }

        Commands::Paths {
            graph,
            from,
            to,
            limit,
            json,
        } => commands::paths::run(commands::paths::Args {
            graph,
            from,
            to,
            limit,
            json: config.wants_json(json),
        }),

        Commands::Axioms { json } => commands::axioms::run(config.wants_json(json)),
    }
}
