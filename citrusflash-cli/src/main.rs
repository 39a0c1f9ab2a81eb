//! citrusflash CLI - load kernels and applications onto Citrus targets.
//!
//! ## Features
//!
//! - Load kernel images through the Citrus receiver or c-boot
//! - Load applications through the Citrus receiver or the Cinnamon loader
//! - Kill processes and forward pointer positions
//! - Shell completion generation
//! - Environment variable and configuration file support

use {
    anyhow::Result,
    citrusflash::{LoadKind, TargetConfig, TargetFamily},
    clap::{Parser, Subcommand, ValueEnum, error::ErrorKind},
    clap_complete::Shell,
    console::style,
    env_logger::Env,
    log::{debug, warn},
    std::{
        env,
        path::PathBuf,
        process::ExitCode,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    },
};

mod commands;
mod config;
mod progress;
mod serial;

use config::Config;

/// Whether stderr is a terminal (set once at startup).
static STDERR_IS_TTY: AtomicBool = AtomicBool::new(true);

/// Set by the Ctrl-C handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Exit code for usage errors.
const EXIT_USAGE: u8 = 1;
/// Exit code when the serial port cannot be opened.
const EXIT_PORT_OPEN: u8 = 2;
/// Exit code for failures while talking to the device.
const EXIT_TRANSFER: u8 = 3;
/// Exit code after Ctrl-C.
const EXIT_CANCELLED: u8 = 130;

/// Check if emoji/animations should be used (TTY and colors enabled).
fn use_fancy_output() -> bool {
    STDERR_IS_TTY.load(Ordering::Relaxed) && console::colors_enabled_stderr()
}

/// Whether Ctrl-C was pressed.
fn was_interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

fn ensure_not_interrupted() -> Result<()> {
    if was_interrupted() {
        Err(CliError::Cancelled("Interrupted".to_string()).into())
    } else {
        Ok(())
    }
}

/// Errors raised by the CLI itself rather than the library.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    /// Bad invocation or missing setup.
    #[error("{0}")]
    Usage(String),
    /// Cancelled by the user.
    #[error("{0}")]
    Cancelled(String),
}

/// citrusflash - load kernels and applications over a serial line.
///
/// Environment variables:
///   CITRUSFLASH_PORT     - Default serial port
///   CITRUSFLASH_TARGET   - Default target (citrus, cinnamon, cboot)
///   CITRUSFLASH_BAUD     - Default baud rate
#[derive(Parser)]
#[command(name = "citrusflash")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    /// Serial port to use (auto-detected if not specified).
    #[arg(short, long, global = true, env = "CITRUSFLASH_PORT")]
    port: Option<String>,

    /// Target loader.
    #[arg(short, long, global = true, value_enum, env = "CITRUSFLASH_TARGET")]
    target: Option<Target>,

    /// Baud rate (defaults to the target's rate).
    #[arg(short, long, global = true, env = "CITRUSFLASH_BAUD")]
    baud: Option<u32>,

    /// Acknowledgement timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Retransmissions allowed per frame.
    #[arg(long, global = true, value_name = "N")]
    retries: Option<u32>,

    /// Verbose output level (-v, -vv, -vvv for increasing detail).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-essential output).
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a configuration file.
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Supported targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Target {
    /// Receiver in the running Citrus kernel.
    Citrus,
    /// Cinnamon application loader.
    Cinnamon,
    /// c-boot kernel loader.
    Cboot,
}

impl From<Target> for TargetFamily {
    fn from(target: Target) -> Self {
        match target {
            Target::Citrus => TargetFamily::Citrus,
            Target::Cinnamon => TargetFamily::Cinnamon,
            Target::Cboot => TargetFamily::CBoot,
        }
    }
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Load an application.
    App {
        /// Application binary.
        file: PathBuf,
    },

    /// Load a kernel image.
    Kernel {
        /// Kernel binary.
        file: PathBuf,
    },

    /// Kill a running process.
    Kill {
        /// Process id.
        pid: u32,
    },

    /// Move the on-screen pointer.
    Pointer {
        /// Horizontal position.
        x: u16,
        /// Vertical position.
        y: u16,
    },

    /// List available serial ports.
    ListPorts {
        /// Output port list as JSON to stdout.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell type.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Build the target configuration from flags, environment and config file.
fn target_config(cli: &Cli, config: &Config) -> Result<TargetConfig> {
    let family = cli
        .target
        .map(TargetFamily::from)
        .or(config
            .transfer
            .target)
        .unwrap_or_default();
    let mut target = TargetConfig::new(family);

    if let Some(baud) = cli
        .baud
        .or(config
            .connection
            .baud)
    {
        if !TargetFamily::supported_bauds().contains(&baud) {
            warn!("Baud rate {baud} is not one the loaders are known to use");
        }
        target = target.with_baud(baud);
    }
    if let Some(secs) = cli
        .timeout
        .or(config
            .connection
            .timeout_secs)
    {
        target = target.with_timeout(Duration::from_secs(secs));
    }
    if let Some(retries) = cli
        .retries
        .or(config
            .transfer
            .retries)
    {
        target = target.with_max_retries(retries);
    }

    target.validate()?;
    debug!(
        "Target {} at {} baud, timeout {:?}, {} retries",
        target.family, target.baud_rate, target.timeout, target.max_retries
    );
    Ok(target)
}

/// Map a library error to an exit code.
fn library_exit_code(err: &citrusflash::Error) -> u8 {
    match err {
        citrusflash::Error::PortOpen { .. } => EXIT_PORT_OPEN,
        citrusflash::Error::Interrupted => EXIT_CANCELLED,
        e if e.is_transfer_failure() => EXIT_TRANSFER,
        _ => EXIT_USAGE,
    }
}

/// Map any error reaching `main` to an exit code.
fn exit_code_for_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return match cli_err {
            CliError::Usage(_) => EXIT_USAGE,
            CliError::Cancelled(_) => EXIT_CANCELLED,
        };
    }
    if let Some(lib_err) = err.downcast_ref::<citrusflash::Error>() {
        return library_exit_code(lib_err);
    }
    EXIT_USAGE
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(cli.verbose >= 2)
        .format_timestamp(if cli.verbose >= 2 {
            Some(env_logger::TimestampPrecision::Millis)
        } else {
            None
        })
        .init();
}

fn install_interrupt_handler() {
    let result = ctrlc::set_handler(|| {
        // A second Ctrl-C does not wait for the current frame.
        if INTERRUPTED.swap(true, Ordering::Relaxed) {
            std::process::exit(i32::from(EXIT_CANCELLED));
        }
    });
    if let Err(e) = result {
        warn!("Failed to install Ctrl-C handler: {e}");
    }
    citrusflash::set_interrupt_checker(was_interrupted);
}

fn run(cli: &Cli) -> Result<()> {
    let config = if let Some(ref path) = cli.config_path {
        Config::load_from_path(path)
    } else {
        Config::load()
    };

    match &cli.command {
        Commands::App { file } => {
            commands::load::cmd_load(cli, &config, file, LoadKind::Application)?;
        },
        Commands::Kernel { file } => {
            commands::load::cmd_load(cli, &config, file, LoadKind::Kernel)?;
        },
        Commands::Kill { pid } => {
            commands::control::cmd_kill(cli, &config, *pid)?;
        },
        Commands::Pointer { x, y } => {
            commands::control::cmd_pointer(cli, &config, *x, *y)?;
        },
        Commands::ListPorts { json } => {
            commands::ports::cmd_list_ports(*json)?;
        },
        Commands::Completions { shell } => {
            commands::completions::cmd_completions(*shell);
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    let stderr_is_tty = console::Term::stderr().is_term();
    STDERR_IS_TTY.store(stderr_is_tty, Ordering::Relaxed);

    if env::var("NO_COLOR").is_ok() || !stderr_is_tty {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        },
    };

    init_logging(&cli);
    install_interrupt_handler();
    debug!(
        "citrusflash v{} (verbose level: {})",
        env!("CARGO_PKG_VERSION"),
        cli.verbose
    );

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = exit_code_for_error(&err);
            eprintln!("{} {err:#}", style("Error:").red().bold());
            ExitCode::from(code)
        },
    }
}
