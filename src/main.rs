//! Prompt: render prompt templates and run them against model backends.
//!
//! This is the main entry point for the `prompt` CLI. It parses arguments,
//! resolves configuration against the working directory, wires the
//! production backend, injectors and operator into the orchestrator, and
//! handles errors with proper exit codes.

mod app;
mod backend;
mod buffer;
mod cli;
mod command;
mod config;
mod error;
mod exit_codes;
mod fs;
mod session;
mod template;

#[cfg(test)]
mod test_support;

use app::PromptRequest;
use backend::CommandBackend;
use clap::CommandFactory;
use cli::Cli;
use config::{Config, Settings};
use error::Result;
use session::ConsoleOperator;
use std::process::ExitCode;
use std::sync::Arc;
use template::ShellInjectors;

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    setup_logging();

    let cli = Cli::parse_args();

    let Some(template_name) = cli.template.clone() else {
        // Without a template there is nothing to run: show usage.
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::from(exit_codes::SUCCESS as u8);
    };

    match run(cli, template_name) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(exit_codes::to_process_exit(err.exit_code()))
        }
    }
}

fn run(cli: Cli, template_name: String) -> Result<()> {
    let project_root = std::env::current_dir()?;
    let config = Config::discover(cli.config.as_deref(), &project_root)?;
    let settings = Settings::resolve(config, project_root, std::env::temp_dir());

    let request = PromptRequest {
        template_name,
        models: settings.model_queue(cli.models.as_deref()),
        variables: cli.variables,
        module: cli.module,
        interactive: cli.interactive,
    };

    let injectors = Arc::new(ShellInjectors::new(
        settings.project_root.clone(),
        settings.context_command.clone(),
    ));
    let mut backend = CommandBackend::new(
        settings.backend_command.clone(),
        settings.project_root.clone(),
    );
    let mut operator = ConsoleOperator::new();

    app::run(&request, &settings, &mut backend, &mut operator, injectors)
}
