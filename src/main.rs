use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use calcd::calculator::{CalcResult, SYMBOLS, evaluate_expression};
use calcd::{Config, logging, server};

#[derive(Parser, Debug)]
#[command(name = "calcd", version, about = "Safe arithmetic expression evaluator")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, overrides the config file
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },
    /// Evaluate a single expression and print the result
    Eval {
        expr: String,

        /// Print the JSON response instead of plain text
        #[arg(long)]
        json: bool,
    },
    /// List the constants and functions expressions may use
    Symbols,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init();

    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(&config))?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Eval { expr, json } => {
            let result = evaluate_expression(&expr, &config.limits);
            if json {
                println!("{}", serde_json::to_string(&result.to_response())?);
            }
            match &result {
                CalcResult::Success { result, .. } => {
                    if !json {
                        println!("{}", result);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                CalcResult::Error { error, .. } => {
                    if !json {
                        eprintln!("error: {}", error);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Symbols => {
            for name in SYMBOLS.names() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
