//! Pellet stove CLI
//!
//! A command-line interface for reading and controlling a pellet stove over its
//! UDP protocol.
//!
//! This tool allows users to:
//! - Switch the stove on and off.
//! - Read temperatures, status, smoke, pressure and pellet motor values.
//! - Read and set the requested temperature, power level and fan speed.
//! - Read and set the stove clock.
//! - Read and overwrite the four timer programs.
//! - Read any raw register for exploring the device.
//!
//! The CLI leverages the `pellet_stove_lib` crate for protocol definitions and client operations.

use anyhow::{bail, Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use flexi_logger::{Logger, LoggerHandle};
use log::*;
use pellet_stove_lib::{client::Stove, config::StoveConfig, protocol as proto};
use std::panic;

mod commandline;

fn logging_init(loglevel: LevelFilter) -> Result<LoggerHandle> {
    let log_handle = Logger::try_with_env_or_str(loglevel.as_str())
        .context("Cannot init logging")?
        .start()
        .context("Cannot start logging")?;

    panic::set_hook(Box::new(|panic_info| {
        let (filename, line, column) = panic_info
            .location()
            .map(|loc| (loc.file(), loc.line(), loc.column()))
            .unwrap_or(("<unknown_file>", 0, 0));

        let cause_str = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            *s
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.as_str()
        } else {
            "<unknown_panic_cause>"
        };

        error!(
            target: "panic",
            "Thread '{}' panicked at '{}': {}:{} - Cause: {}",
            std::thread::current().name().unwrap_or("<unnamed>"),
            filename,
            line,
            column,
            cause_str
        );
    }));
    Ok(log_handle)
}

/// Prints an optional reading, the stove reports missing values as `-1`.
fn reading<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn confirm_write(written: bool, what: &str) -> Result<()> {
    if written {
        println!("{what}: done.");
        Ok(())
    } else {
        bail!("{what}: the stove did not confirm the write");
    }
}

fn stove_config(args: &commandline::CliArgs) -> Result<StoveConfig> {
    if let Some(path) = &args.config {
        return StoveConfig::from_yaml_file(path)
            .with_context(|| format!("Cannot load configuration from {}", path.display()));
    }
    let Some(host) = &args.host else {
        bail!("Either --host or --config is required");
    };
    Ok(StoveConfig::new(host.clone())
        .with_port(args.port)
        .with_timeout(args.timeout))
}

fn handle_set_schedule(
    stove: &mut Stove,
    slot: proto::ScheduleSlot,
    program: &proto::ScheduleProgram,
    skip_confirmation: bool,
) -> Result<()> {
    println!("Current program {slot}: {}", stove.get_schedule(slot));
    if !skip_confirmation
        && !Confirm::new()
            .with_prompt(format!("Overwrite timer program {slot}?"))
            .default(false)
            .show_default(true)
            .interact()
            .context("Failed to get user confirmation.")?
    {
        info!("Set schedule aborted by user.");
        return Ok(());
    }
    confirm_write(
        stove.set_schedule(slot, program),
        &format!("Timer program {slot}"),
    )
}

fn main() -> Result<()> {
    let args = commandline::CliArgs::parse();

    let _log_handle = logging_init(args.verbose.log_level_filter())?;
    info!(
        "Pellet stove CLI started. Log level: {}",
        args.verbose.log_level_filter()
    );

    let config = stove_config(&args)?;
    info!("Connecting to stove at {}:{}...", config.host, config.port);
    let mut stove = Stove::from_config(&config);
    stove
        .connect()
        .with_context(|| format!("Cannot open socket for {}:{}", config.host, config.port))?;

    match &args.command {
        commandline::CliCommands::On => confirm_write(stove.switch_on(), "Switch on")?,
        commandline::CliCommands::Off => confirm_write(stove.switch_off(), "Switch off")?,
        commandline::CliCommands::Status => {
            println!("Status: {}", stove.get_status());
        }
        commandline::CliCommands::Temperature => {
            println!("Temperatures (°C): {}", stove.get_temperature());
        }
        commandline::CliCommands::SetTemperature { temperature } => {
            info!("Executing: Set temperature to {temperature} °C");
            confirm_write(
                stove.set_temperature(*temperature),
                &format!("Temperature set to {temperature} °C"),
            )?;
        }
        commandline::CliCommands::Power => {
            println!("Power: {}", reading(stove.get_power()));
        }
        commandline::CliCommands::SetPower { power } => {
            info!("Executing: Set power to {power}");
            confirm_write(stove.set_power(*power), &format!("Power set to {power}"))?;
        }
        commandline::CliCommands::FanSpeed => {
            println!("Fan speed: {}", reading(stove.get_fan_speed()));
        }
        commandline::CliCommands::SetFanSpeed { fan_speed } => {
            info!("Executing: Set fan speed to {fan_speed}");
            confirm_write(
                stove.set_fan_speed(*fan_speed),
                &format!("Fan speed set to {fan_speed}"),
            )?;
        }
        commandline::CliCommands::Smoke => {
            let info = stove.get_smoke_info();
            println!("Smoke rotor speed (RPM): {}", reading(info.rotor_speed));
            println!("Smoke temperature (°C): {}", reading(info.temperature));
        }
        commandline::CliCommands::Pressure => {
            let info = stove.get_pressure_info();
            println!("Pressure (Pa): {}", reading(info.pressure));
            println!("Requested pressure (Pa): {}", reading(info.pressure_request));
        }
        commandline::CliCommands::PelletMotor => {
            let info = stove.get_pellet_motor_info();
            println!("Pellet motor speed: {}", reading(info.speed));
            println!("Requested pellet motor speed: {}", reading(info.speed_request));
            println!("Pellet motor current (mA): {}", reading(info.current));
        }
        commandline::CliCommands::DateTime => {
            let date_time = stove
                .get_date_time()
                .context("Cannot read the stove clock")?;
            println!("Stove clock: {date_time}");
        }
        commandline::CliCommands::SetDateTime { date_time } => {
            let date_time = date_time.unwrap_or_else(|| chrono::Local::now().naive_local());
            info!("Executing: Set stove clock to {date_time}");
            confirm_write(
                stove.set_date_time(&date_time),
                &format!("Stove clock set to {date_time}"),
            )?;
        }
        commandline::CliCommands::Schedule { slot } => {
            println!("Timer program {slot}: {}", stove.get_schedule(*slot));
        }
        commandline::CliCommands::SetSchedule {
            slot,
            start,
            end,
            days,
            power,
            temperature,
            fan_speed,
            yes,
        } => {
            let program = proto::ScheduleProgram {
                start_time: *start,
                end_time: *end,
                days: *days,
                power: *power,
                temperature: *temperature,
                fan_speed: *fan_speed,
            };
            handle_set_schedule(&mut stove, *slot, &program, *yes)?;
        }
        commandline::CliCommands::Raw { bank, address } => {
            let register = proto::Register::new(*bank, address.clone());
            let raw = stove
                .read_raw(register)
                .with_context(|| format!("Cannot read register {bank};{address}"))?;
            println!("{raw}");
        }
    }

    Ok(())
}
