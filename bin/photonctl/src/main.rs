//! ---
//! pl_section: "04-cli"
//! pl_subsection: "binary"
//! pl_type: "source"
//! pl_scope: "code"
//! pl_description: "Diagnostic CLI for driving pins on a photonlink device."
//! pl_version: "v0.1.0-prealpha"
//! pl_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use photonlink_client::{ControllerConfig, DeviceController, Pin, PinMode, HIGH, LOW};
use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

#[derive(Debug, Parser)]
#[command(author, version, about = "Drive pins on a cloud-registered photonlink device", long_about = None)]
struct Cli {
    /// Cloud-registered device identifier.
    #[arg(long, env = "PHOTONLINK_DEVICE_ID")]
    device_id: String,
    /// Access token for the cloud directory service.
    #[arg(long, env = "PHOTONLINK_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,
    /// Alternative directory service base URL.
    #[arg(long, env = "PHOTONLINK_API_BASE")]
    api_base: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the pin capability table.
    Pins,
    /// Set a pin's mode.
    Mode {
        #[arg(value_parser = parse_pin)]
        pin: Pin,
        #[arg(value_parser = parse_mode)]
        mode: PinMode,
    },
    /// Write a digital level (high/low) to a pin.
    Digital {
        #[arg(value_parser = parse_pin)]
        pin: Pin,
        #[arg(value_parser = parse_level)]
        level: u8,
    },
    /// Write an analog (PWM) value to a pin.
    Analog {
        #[arg(value_parser = parse_pin)]
        pin: Pin,
        value: u8,
    },
    /// Write a servo position in degrees to a pin.
    Servo {
        #[arg(value_parser = parse_pin)]
        pin: Pin,
        degrees: u8,
    },
    /// Set the on-board RGB LED from a hex colour.
    Rgb { color: String },
    /// Set the continuous-read sampling interval in milliseconds.
    Interval { ms: u32 },
    /// Stream readings for a pin until interrupted.
    Watch {
        #[arg(value_parser = parse_pin)]
        pin: Pin,
        /// Subscribe to analog readings instead of digital ones.
        #[arg(long)]
        analog: bool,
    },
}

fn parse_pin(raw: &str) -> Result<Pin, String> {
    raw.parse().map_err(|err| format!("{err}"))
}

fn parse_mode(raw: &str) -> Result<PinMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "input" => Ok(PinMode::Input),
        "output" => Ok(PinMode::Output),
        "analog" => Ok(PinMode::Analog),
        "pwm" => Ok(PinMode::Pwm),
        "servo" => Ok(PinMode::Servo),
        other => Err(format!("unknown mode {other:?} (input|output|analog|pwm|servo)")),
    }
}

fn parse_level(raw: &str) -> Result<u8, String> {
    match raw.to_ascii_lowercase().as_str() {
        "high" | "1" => Ok(HIGH),
        "low" | "0" => Ok(LOW),
        other => Err(format!("unknown level {other:?} (high|low)")),
    }
}

fn init_logging() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = ControllerConfig::new(cli.device_id, cli.access_token);
    if let Some(api_base) = cli.api_base {
        config = config.with_api_base(api_base);
    }
    let controller = DeviceController::connect(config).await?;

    match cli.command {
        Commands::Pins => {
            for descriptor in controller.pins().await {
                if descriptor.name.is_empty() {
                    println!("(reserved)");
                    continue;
                }
                let modes: Vec<String> = descriptor
                    .supported_modes
                    .iter()
                    .map(|mode| mode.to_string())
                    .collect();
                println!(
                    "{:<3} modes=[{}] mode={} value={}",
                    descriptor.name,
                    modes.join(","),
                    descriptor
                        .mode
                        .map(|mode| mode.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    descriptor.value
                );
            }
        }
        Commands::Mode { pin, mode } => controller.pin_mode(pin, mode).await?,
        Commands::Digital { pin, level } => {
            controller.pin_mode(pin, PinMode::Output).await?;
            controller.digital_write(pin, level).await?;
        }
        Commands::Analog { pin, value } => {
            controller.pin_mode(pin, PinMode::Pwm).await?;
            controller.analog_write(pin, value).await?;
        }
        Commands::Servo { pin, degrees } => {
            controller.pin_mode(pin, PinMode::Servo).await?;
            controller.servo_write(pin, degrees).await?;
        }
        Commands::Rgb { color } => {
            let rgb = controller.internal_rgb(color).await?;
            println!("rgb set to {},{},{}", rgb.red, rgb.green, rgb.blue);
        }
        Commands::Interval { ms } => controller.set_sampling_interval(ms).await?,
        Commands::Watch { pin, analog } => {
            let print = move |value: u16| println!("{pin} -> {value}");
            if analog {
                controller.pin_mode(pin, PinMode::Analog).await?;
                controller.analog_read(pin, print).await?;
            } else {
                controller.pin_mode(pin, PinMode::Input).await?;
                controller.digital_read(pin, print).await?;
            }
            tracing::info!(%pin, "watching; press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
        }
    }

    // The writer task drains queued commands asynchronously; give it a
    // moment before the process exits.
    tokio::time::sleep(Duration::from_millis(50)).await;
    Ok(())
}
