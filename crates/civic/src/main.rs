// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Civic Connect - civic issue reporting backend.
//!
//! This is the binary entry point for the HTTP server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use clap::{Parser, Subcommand};

/// Civic Connect - civic issue reporting backend.
#[derive(Parser, Debug)]
#[command(name = "civic", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server (default).
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match civic_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            civic_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(errors) = civic_config::validate_credentials(&config) {
                civic_config::render_errors(&errors);
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("civic: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            let credentials = civic_config::validate_credentials(&config);
            println!(
                "civic: config ok (server={}:{}, database={})",
                config.server.host, config.server.port, config.storage.database_path
            );
            if let Err(errors) = credentials {
                civic_config::render_errors(&errors);
                std::process::exit(1);
            }
        }
    }
}
