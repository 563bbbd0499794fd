/*!
 * Command-line interface for treedump
 */

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use treedump::config::{Args, Config};
use treedump::pipeline::{Generator, RunStatus};
use treedump::progress::ProgressSink;
use treedump::report::Reporter;
use treedump::CancellationToken;

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn progress_bar() -> ProgressBar {
    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} ⏱️  {elapsed_precise}")
    {
        progress.set_style(style);
    }
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut cmd = Args::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    setup_logging(args.verbose, args.quiet);
    let reporter = Reporter::new(args.summary);

    let config = match Config::from_args(args).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Configuration: {:?}", config);

    let token = CancellationToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Stop requested, finishing current step");
        handler_token.cancel();
    }) {
        error!("Failed to install Ctrl-C handler: {}", e);
    }

    let progress = progress_bar();
    let sink: Arc<dyn ProgressSink> = Arc::new(progress.clone());
    let generator = Generator::new(config, token, sink);

    // the walk runs off the main thread so the handler and spinner stay live
    let result = thread::spawn(move || generator.run()).join();
    progress.finish_and_clear();

    match result {
        Ok(Ok(outcome)) => {
            reporter.print_report(&outcome.summary());
            match outcome.status {
                RunStatus::Completed(_) => ExitCode::SUCCESS,
                RunStatus::Stopped(_) => ExitCode::from(130),
            }
        }
        Ok(Err(e)) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Err(_) => {
            eprintln!("Error: generation thread panicked");
            ExitCode::FAILURE
        }
    }
}
