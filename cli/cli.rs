mod cli_args;
mod output;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use log;
use std::fs;
use std::io;
use std::process;

use cli_args::Cli;
use output::ConsoleProgress;
use xreview_core::{AppError, CommandInvoker, Config, ReviewOutcome, run_review};

const EXIT_CONFIG: i32 = 1;
const EXIT_IO: i32 = 2;
const EXIT_NOT_FOUND: i32 = 3;
const EXIT_NO_FILES: i32 = 4;

fn main() {
    let cli_args = Cli::parse();

    setup_logging(cli_args.quiet, cli_args.verbose);

    let quiet = cli_args.quiet;

    log::debug!("CLI args parsed: {:?}", cli_args);

    let exit_code = match run_app(cli_args) {
        Ok(code) => {
            log::info!("Application finished with code {}.", code);
            code
        }
        Err(e) => {
            let exit_code = match e.downcast_ref::<AppError>() {
                Some(AppError::ProjectNotFound(_)) => EXIT_NOT_FOUND,
                Some(AppError::Config(_)) => EXIT_CONFIG,
                Some(AppError::TomlParse(_)) => EXIT_CONFIG,
                Some(AppError::TomlSerialize(_)) => EXIT_CONFIG,
                Some(AppError::Glob(_)) => EXIT_CONFIG,
                Some(AppError::Chunking(_)) => EXIT_CONFIG,
                Some(AppError::InvalidArgument(_)) => EXIT_CONFIG,
                Some(AppError::DurationParse(_)) => EXIT_CONFIG,
                Some(AppError::Io(_)) => EXIT_IO,
                Some(AppError::FileRead { .. }) => EXIT_IO,
                Some(AppError::FileWrite { .. }) => EXIT_IO,
                Some(AppError::DirCreation { .. }) => EXIT_IO,
                Some(AppError::Walk(_)) => EXIT_IO,
                Some(AppError::WorkerPool(_)) => EXIT_IO,
                Some(_) => EXIT_IO,
                None => EXIT_CONFIG,
            };

            if !quiet || exit_code == EXIT_CONFIG || exit_code == EXIT_NOT_FOUND {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            } else {
                log::error!("Application failed: {:#}", e);
            }

            exit_code
        }
    };
    log::debug!("Exiting with code {}", exit_code);
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8) {
    let log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
    log::trace!("Logger initialized with level: {:?}", log_level);
}

fn run_app(cli: Cli) -> Result<i32> {
    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        let bin_name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, bin_name, &mut io::stdout());
        return Ok(0);
    }

    let project_folder = cli.project_folder.as_ref().ok_or_else(|| {
        AppError::InvalidArgument("A project folder must be given".to_string())
    })?;
    let project_root = Config::determine_project_root(project_folder)
        .context("Failed to determine project root")?;
    log::info!("Project root determined: {}", project_root.display());

    let config = load_config(&project_root, &cli).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if cli.config_file.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(0);
    }

    let invoker = CommandInvoker::from_config(&config)?;
    let progress = ConsoleProgress { quiet: cli.quiet };

    match run_review(&config, &project_root, &invoker, &progress)? {
        ReviewOutcome::NoFiles => {
            output::print_no_files(&config.collect.extensions, cli.quiet);
            Ok(EXIT_NO_FILES)
        }
        ReviewOutcome::Written(summary) => {
            output::print_completion(&summary, cli.quiet);
            Ok(0)
        }
    }
}

/// Defaults, then the config file (if any), then command-line flags.
fn load_config(project_root: &std::path::Path, cli: &Cli) -> Result<Config> {
    let config_path = Config::resolve_config_path(
        project_root,
        cli.config_file.config.as_deref(),
        cli.config_file.no_config,
    )
    .context("Failed to resolve configuration path")?;

    let config = match &config_path {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    merge_config_with_cli_overrides(config, cli)
}

fn merge_config_with_cli_overrides(mut config: Config, cli: &Cli) -> Result<Config> {
    log::trace!("Applying CLI overrides to config...");

    if let Some(extensions) = &cli.collect.extensions {
        config.collect.extensions = extensions.clone();
    }
    if let Some(exclude) = &cli.collect.exclude {
        config.collect.exclude = exclude.clone();
    }
    if cli.collect.gitignore {
        config.collect.use_gitignore = true;
    }

    if let Some(model) = &cli.model.model {
        config.model.name = model.clone();
    }
    if let Some(runner) = &cli.model.runner {
        config.model.runner = runner.clone();
    }
    if let Some(timeout) = &cli.model.timeout {
        config.model.timeout = Some(timeout.clone());
    }
    if let Some(prompt_path) = &cli.model.prompt_file {
        config.prompt.template = fs::read_to_string(prompt_path).map_err(|e| AppError::FileRead {
            path: prompt_path.clone(),
            source: e,
        })?;
    }

    if let Some(report) = &cli.run.report {
        config.report.path = report.clone();
    }
    if let Some(chunk_size) = cli.run.chunk_size {
        config.chunking.size = chunk_size;
    }
    if let Some(jobs) = cli.run.jobs {
        config.run.jobs = jobs;
    }

    Ok(config)
}
