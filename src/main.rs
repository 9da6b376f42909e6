use anyhow::{Context, Result};
use clap::Parser;
use eggtimer::cli::Cli;
use eggtimer::config::TimerConfig;
use eggtimer::report;
use eggtimer::runner::Runner;
use eggtimer::session::measure;
use std::io::Write;
use std::os::unix::process::ExitStatusExt;
use std::process::{Command, ExitStatus};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Merge the config file (if any) with `-d` definitions and `--policy`
fn load_config(args: &Cli) -> Result<TimerConfig> {
    let mut config = match &args.config {
        Some(path) => TimerConfig::from_toml(path)?,
        None => TimerConfig::default(),
    };

    config.segments.extend(args.definitions());
    if let Some(policy) = args.policy {
        config.policy = policy.into();
    }

    if config.segments.is_empty() {
        anyhow::bail!(
            "No segment definitions. Use -d TYPE START FINISH or -c FILE to define at least one."
        );
    }

    Ok(config)
}

/// Exit code of the timed command, 128+N if it was killed by signal N
fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => {
            eprintln!("Command killed by signal: {}", signal);
            128 + signal
        }
        (None, None) => 1,
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;
    let segmenter = config.build_segmenter()?;

    let argv = match &args.command {
        Some(argv) if !argv.is_empty() => argv,
        _ => anyhow::bail!(
            "Must specify a command. Usage: eggtimer -d TYPE START FINISH -- COMMAND [ARGS...]"
        ),
    };
    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);

    let echo = args.echo;
    let measurement = measure(&Runner::default(), &segmenter, command, |event| {
        if echo && !event.is_failure() {
            eprintln!("[{:>10.3}s] {}", event.when.as_secs_f64(), event.what);
        }
    });

    let error = measurement.outcome.as_ref().err().map(|e| e.to_string());
    let rendered = report::render(&measurement.segments, args.format, error.as_deref())
        .context("Failed to render report")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered.trim_end())?;
    stdout.flush()?;
    drop(stdout);

    // Exit with the timed command's exit code
    let code = match measurement.outcome {
        Ok(mut outcome) => {
            let status = outcome
                .handle
                .wait()
                .context("Failed to wait for command")?;
            exit_code(status)
        }
        Err(e) => {
            tracing::warn!(error = %e, "capture failed");
            1
        }
    };
    std::process::exit(code);
}
