// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { db_path }) => commands::cmd_init(&db_path),
        Some(Commands::Resolve {
            targets,
            db_path,
            config,
            output,
        }) => commands::cmd_resolve(&targets, &db_path, config.as_deref(), output.as_deref()),
        Some(Commands::Remove {
            packages,
            db_path,
            config,
            output,
        }) => commands::cmd_remove(&packages, &db_path, config.as_deref(), output.as_deref()),
        Some(Commands::ShowPlan { plan_path }) => commands::cmd_show_plan(&plan_path),
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
