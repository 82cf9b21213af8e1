// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Leadflow - a streaming AI lead-qualification conversation server.
//!
//! This is the binary entry point for the Leadflow server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Leadflow - a streaming AI lead-qualification conversation server.
#[derive(Parser, Debug)]
#[command(name = "leadflow", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Leadflow server.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match leadflow_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            leadflow_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            let mut printable = config;
            if printable.openai.api_key.is_some() {
                printable.openai.api_key = Some("[redacted]".to_string());
            }
            match toml::to_string_pretty(&printable) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to render config: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("leadflow: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed).
        let config = leadflow_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.agent.name, "leadflow");
    }
}
