pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use commands::ProductArgs;

#[derive(Debug, Parser)]
#[command(
    name = "whispercart",
    about = "WhisperCart operator CLI",
    long_about = "Run intent extraction, negotiation offers, seller messages and comparisons \
                  locally, and inspect runtime configuration.",
    after_help = "Examples:\n  whispercart intent \"need wireless earbuds under 2000 urgently\"\n  \
                  whispercart offers --title \"Boat Rockerz 450\" --price 1499 --rating 4.2\n  \
                  whispercart doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Extract shopping intent from an utterance with the local rules")]
    Intent {
        #[arg(required = true, num_args = 1.., help = "Shopper utterance")]
        text: Vec<String>,
    },
    #[command(about = "Generate the four negotiation offers for a listing")]
    Offers {
        #[command(flatten)]
        product: ProductArgs,
        #[arg(long, help = "Strategy to recommend (aggressive|moderate|friendly|bundle|reviewBased)")]
        strategy: Option<String>,
    },
    #[command(about = "Build the seller-facing message for one strategy")]
    Message {
        #[command(flatten)]
        product: ProductArgs,
        #[arg(long, help = "Strategy to write the message for")]
        strategy: Option<String>,
    },
    #[command(about = "Compare two or three listings given as a JSON array")]
    Compare {
        #[arg(help = "JSON array of listings, e.g. '[{\"title\":\"A\",\"price\":999}, ...]'")]
        products: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config and remote model readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Intent { text } => commands::intent::run(&text.join(" ")),
        Command::Offers { product, strategy } => {
            commands::offers::run(&product, strategy.as_deref())
        }
        Command::Message { product, strategy } => {
            commands::message::run(&product, strategy.as_deref())
        }
        Command::Compare { products } => commands::compare::run(&products),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
