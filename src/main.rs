//! Syllabus CLI binary entry point.

use clap::Parser;
use syllabus::cli::{commands, Cli, Commands};
use syllabus::config::SyllabusConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    syllabus::cli::init_tracing();

    if let Commands::Setup(args) = cli.command {
        exit_on_error(commands::handle_setup(args));
        return;
    }

    let config = match SyllabusConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Ask(args) => commands::handle_ask(config, args).await,
        Commands::Chat(docs) => commands::handle_chat(config, docs).await,
        Commands::Courses(docs) => commands::handle_courses(config, docs).await,
        Commands::Doctor(docs) => match commands::handle_doctor(config, docs).await {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(1),
            Err(e) => Err(e),
        },
        Commands::Setup(_) => Ok(()),
    };
    exit_on_error(result);
}

fn exit_on_error(result: Result<(), Box<dyn std::error::Error>>) {
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
