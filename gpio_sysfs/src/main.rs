//! # Sysfs GPIO Binary
//!
//! Drive and watch GPIO lines through the sysfs attribute interface.
//!
//! # Usage
//!
//! ```bash
//! # Drive GPIO 4 high, then low
//! gpio_sysfs set 4
//! gpio_sysfs reset 4
//!
//! # Log every change of GPIO 17, polling every 20ms
//! gpio_sysfs watch 17 --interval-ms 20
//!
//! # Open every pin listed in a config file and watch the inputs
//! gpio_sysfs --config /etc/gpio_sysfs/config.toml run
//!
//! # Try it without hardware
//! gpio_sysfs --simulate -v watch 17
//! ```

#![deny(warnings)]

use clap::{Parser, Subcommand};
use gpio_common::config::{ConfigError, ConfigLoader, GpioConfig, LogLevel};
use gpio_common::consts::DEFAULT_CONFIG_PATH;
use gpio_sysfs::{Gpio, PinConfig, PinFs, PinHandle, SimulatedSysfs, SysfsFs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Sysfs GPIO - drive outputs and watch inputs through /sys/class/gpio
#[derive(Parser, Debug)]
#[command(name = "gpio_sysfs")]
#[command(version)]
#[command(about = "Drive and watch GPIO lines through the sysfs attribute interface")]
#[command(long_about = None)]
struct Args {
    /// Path to service configuration [default: /etc/gpio_sysfs/config.toml, if present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// GPIO class directory (overrides the config file)
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Use the in-memory kernel model instead of real sysfs
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open PIN as output and drive it high
    Set {
        /// GPIO number
        pin: u32,
    },
    /// Open PIN as output and drive it low
    Reset {
        /// GPIO number
        pin: u32,
    },
    /// Open PIN as input and print its value
    Read {
        /// GPIO number
        pin: u32,
    },
    /// Open PIN as input and log every change until Ctrl-C
    Watch {
        /// GPIO number
        pin: u32,
        /// Poll interval in milliseconds (defaults to the config value)
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Open every pin listed in the config and log input changes until Ctrl-C
    Run,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run().await {
        error!("gpio_sysfs failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Tracing comes up before the config result is inspected so that load
    // errors are reported.
    let config = load_config(&args);
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);
    let config = config?;

    info!(
        "{} v{} starting (root {})",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION"),
        config.sysfs.root.display()
    );

    if args.simulate {
        info!("Simulation mode enabled");
        let sim = SimulatedSysfs::new(config.sysfs.root.clone());
        execute(Gpio::from_config(sim, &config), &args.command, &config).await
    } else {
        execute(Gpio::from_config(SysfsFs, &config), &args.command, &config).await
    }
}

/// Load `--config`, or the default path when it exists, then apply
/// command-line overrides and validate.
fn load_config(args: &Args) -> Result<GpioConfig, ConfigError> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let mut config = match &args.config {
        Some(path) => GpioConfig::load(path)?,
        None if default_path.exists() => GpioConfig::load(default_path)?,
        None => GpioConfig::default(),
    };
    if let Some(root) = &args.root {
        config.sysfs.root = root.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn execute<F: PinFs>(
    gpio: Gpio<F>,
    command: &Command,
    config: &GpioConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Set { pin } => {
            let handle = gpio.open(PinConfig::output(*pin)).await?;
            handle.set().await?;
            info!("GPIO {} = {}", pin, handle.value());
            close_quietly(&handle).await;
        }
        Command::Reset { pin } => {
            let handle = gpio.open(PinConfig::output(*pin)).await?;
            handle.reset().await?;
            info!("GPIO {} = {}", pin, handle.value());
            close_quietly(&handle).await;
        }
        Command::Read { pin } => {
            let handle = gpio.open(PinConfig::input(*pin)).await?;
            println!("{}", handle.value());
            close_quietly(&handle).await;
        }
        Command::Watch { pin, interval_ms } => {
            let interval = interval_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.poll_interval());
            let handle = gpio
                .open(PinConfig::input(*pin).with_poll_interval(interval))
                .await?;
            watch(std::slice::from_ref(&handle)).await?;
            close_quietly(&handle).await;
        }
        Command::Run => {
            let pins = config.pin_configs();
            if pins.is_empty() {
                warn!("No [[pins]] configured, nothing to do");
                return Ok(());
            }
            let handles = gpio.open_all(&pins).await?;
            watch(&handles).await?;
            for handle in &handles {
                close_quietly(handle).await;
            }
        }
    }
    Ok(())
}

/// Log changes of `handles` until Ctrl-C.
async fn watch<F: PinFs>(handles: &[PinHandle<F>]) -> Result<(), Box<dyn std::error::Error>> {
    for handle in handles {
        info!(
            "GPIO {} ({}) initial value {}",
            handle.pin(),
            handle.direction(),
            handle.value()
        );
        handle.on(|event| {
            info!(
                "GPIO {} changed {} -> {}",
                event.pin, event.previous, event.value
            )
        })?;
    }

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");
    Ok(())
}

async fn close_quietly<F: PinFs>(handle: &PinHandle<F>) {
    if let Err(e) = handle.close().await {
        warn!("{}", e);
    }
}

/// Setup tracing subscriber based on CLI arguments and config.
///
/// `-v` forces DEBUG, otherwise `RUST_LOG` wins over the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let filter = if args.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level.as_directive()))
    };

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
