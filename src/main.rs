//! Binary entry point for the `modlink` CLI.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use modlink::cli::{Cli, Command};
use modlink::commands;
use modlink::logging::{Logger, init_subscriber};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let command = match &args.command {
        Command::Scan => "scan",
        Command::Deploy(_) => "deploy",
        Command::Build(_) => "build",
        Command::Verify => "verify",
        Command::Sync(_) => "sync",
        Command::Clean(_) => "clean",
        Command::Report => "report",
        Command::Version => "version",
    };
    init_subscriber(args.verbose > 0, command);
    let log = Arc::new(Logger::new(command));

    match args.command {
        Command::Scan => commands::scan::run(&args.global, &log),
        Command::Deploy(opts) => commands::deploy::run(&args.global, &opts, &log),
        Command::Build(opts) => commands::build::run(&args.global, &opts, &log),
        Command::Verify => commands::verify::run(&args.global, &log),
        Command::Sync(opts) => commands::sync::run(&args.global, &opts, &log),
        Command::Clean(opts) => commands::clean::run(&args.global, &opts, &log),
        Command::Report => commands::report::run(&args.global, &log),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    }
}
