//! Covenant CLI - evaluate contract checks from the command line

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

use commands::check::{self, CheckArgs, KindArg};

#[derive(Parser)]
#[command(name = "covenant")]
#[command(about = "Design-by-contract checks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one contract test
    Check {
        /// Kind of check
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Test expression
        #[arg(short, long)]
        expr: String,

        /// Subject of the check as JSON
        #[arg(long = "this")]
        this: Option<String>,

        /// Type name given to a JSON object subject
        #[arg(long, default_value = "Object")]
        this_type: String,

        /// Subject before the call, used for `$old(...)` captures
        #[arg(long)]
        before: Option<String>,

        /// Named argument as name=<json>; repeatable
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// Return value as JSON
        #[arg(short, long)]
        result: Option<String>,

        /// Name of the checked item
        #[arg(long, default_value = "cli")]
        item: String,

        /// `org.contract4j5.*` properties file
        #[arg(long)]
        properties: Option<PathBuf>,

        /// TOML configuration file
        #[arg(long, env = "COVENANT_CONFIG")]
        config: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the registered component type names
    Components,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match cli.command {
        Commands::Check {
            kind,
            expr,
            this,
            this_type,
            before,
            args,
            result,
            item,
            properties,
            config,
            json,
        } => {
            let args = CheckArgs {
                kind,
                expression: expr,
                this,
                this_type,
                before,
                args,
                result,
                item,
                properties,
                config,
            };
            let outcome = check::run(&args)?;
            check::print(&outcome, json)?;
            Ok(if outcome.violated() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Components => {
            commands::components::list();
            Ok(ExitCode::SUCCESS)
        }
    }
}
