//! Strata CLI - templated PostgreSQL schema migrations

use clap::Parser;

mod cli;
mod commands;
mod context;

use cli::{Cli, CodeCommands, Commands};
use commands::common::ExitCode;
use commands::{code, init, migrate, new, print_connstring, renumber, status};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = match &cli.command {
        Commands::Init(args) => init::execute(args).await,
        Commands::New(args) => new::execute(args, &cli.global).await,
        Commands::Migrate(args) => migrate::execute(args, &cli.global).await,
        Commands::Status => status::execute(&cli.global).await,
        Commands::Code(args) => match &args.command {
            CodeCommands::Install(args) => code::install(args, &cli.global).await,
            CodeCommands::Compile(args) => code::compile(args, &cli.global).await,
            CodeCommands::Snapshot(args) => code::snapshot(args, &cli.global).await,
        },
        Commands::Renumber(args) => renumber::execute(args, &cli.global).await,
        Commands::PrintConnstring => print_connstring::execute(&cli.global).await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<ExitCode>() {
            Some(ExitCode(code)) => std::process::ExitCode::from(*code),
            None => {
                eprintln!("Error: {err:#}");
                std::process::ExitCode::FAILURE
            }
        },
    }
}
