use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tokio::time::{sleep, Duration};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use vfd_modbus::{
    command::Command,
    config::{Config, DeviceConfig},
    drive,
    registers::StatusBlock,
    simulator::SimulatedDrive,
    transport, ReadFunction, Transport,
};

/// Read telemetry from and send commands to a VPC-M0701S inverter over Modbus RTU
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// YAML configuration file
    #[clap(short, long, default_value = "config.yml")]
    config: PathBuf,

    /// Device name from the configuration, the first device when omitted
    #[clap(short, long)]
    device: Option<String>,

    /// Talk to an in-memory inverter instead of the configured bus
    #[clap(long)]
    simulate: bool,

    /// Print telemetry as JSON
    #[clap(long)]
    json: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read telemetry once
    Telemetry,
    /// Read telemetry repeatedly until interrupted
    Monitor {
        #[clap(long, default_value = "1000")]
        interval_ms: u64,
    },
    /// Write the frequency setpoint in Hz
    SetFrequency { hz: f32 },
    /// Write the run control word
    Start,
    /// Write the stop control word
    Stop,
    /// Write a raw control word, decimal or 0x-prefixed hex
    ControlWord {
        #[clap(value_parser = parse_word)]
        word: u16,
    },
    /// Clear the active fault
    ClearFault,
}

fn parse_word(s: &str) -> Result<u16, String> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
    .map_err(|err| format!("invalid register value `{s}`: {err}"))
}

fn init_logging() {
    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_default();
    let format_layer = fmt::layer().with_target(false);
    Registry::default()
        .with(filter_layer)
        .with(format_layer)
        .init();
}

fn simulated(device: &DeviceConfig) -> SimulatedDrive {
    let block = StatusBlock {
        status_dir: 0x0003,
        set_freq: 5000,
        running_freq: 4950,
        running_curr: 120,
        dc_bus_volt: 3600,
        temperature: 45,
    };
    SimulatedDrive::vpc_m0701s(device, block, 0, ReadFunction::Auto)
}

async fn print_telemetry<T: Transport + ?Sized>(
    transport: &mut T,
    device: &DeviceConfig,
    json: bool,
) -> Result<()> {
    let telemetry = drive::read_telemetry(transport, device)
        .await
        .with_context(|| format!("reading telemetry from `{}`", device.name))?;
    if json {
        println!("{}", serde_json::to_string(&telemetry)?);
    } else {
        println!("{telemetry}");
    }
    Ok(())
}

async fn run<T: Transport + ?Sized>(
    transport: &mut T,
    device: &DeviceConfig,
    args: &Args,
) -> Result<()> {
    let command = match args.command {
        Commands::Telemetry => return print_telemetry(transport, device, args.json).await,
        Commands::Monitor { interval_ms } => loop {
            if let Err(err) = print_telemetry(transport, device, args.json).await {
                eprintln!("{err:#}");
            }
            sleep(Duration::from_millis(interval_ms)).await;
        },
        Commands::SetFrequency { hz } => {
            drive::write_frequency_hz(transport, device, hz)
                .await
                .with_context(|| format!("setting frequency of `{}`", device.name))?;
            info!(device = %device.name, hz, "frequency set");
            return Ok(());
        }
        Commands::Start => Command::ControlWord(drive::CONTROL_RUN),
        Commands::Stop => Command::ControlWord(drive::CONTROL_STOP),
        Commands::ControlWord { word } => Command::ControlWord(word),
        Commands::ClearFault => Command::ClearFault,
    };
    command
        .execute(transport, device)
        .await
        .with_context(|| format!("sending {command:?} to `{}`", device.name))?;
    info!(device = %device.name, ?command, "command sent");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();

    let config = if args.simulate && !args.config.exists() {
        Config {
            devices: vec![DeviceConfig::default()],
            ..Default::default()
        }
    } else {
        Config::from_file(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    };
    let device = config.device(args.device.as_deref())?;

    if args.simulate {
        let mut transport = simulated(device);
        run(&mut transport, device, &args).await
    } else {
        let mut transport = transport::open(&config.transport)
            .await
            .context("opening modbus transport")?;
        run(&mut transport, device, &args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("18"), Ok(18));
        assert_eq!(parse_word("0x12"), Ok(0x12));
        assert_eq!(parse_word("0X12"), Ok(0x12));
        assert!(parse_word("0x").is_err());
        assert!(parse_word("70000").is_err());
    }

    #[test]
    fn test_control_word_argument() {
        let args = Args::try_parse_from(["vfdctl", "control-word", "0x0012"]).unwrap();
        assert!(matches!(args.command, Commands::ControlWord { word: 0x0012 }));
    }
}
