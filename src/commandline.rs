use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use pellet_stove_lib::protocol as proto;
use std::path::PathBuf;
use std::time::Duration;

fn parse_power(s: &str) -> Result<proto::Power, String> {
    let power = clap_num::number_range(s, proto::Power::MIN as i32, proto::Power::MAX as i32)?;
    proto::Power::try_from(power).map_err(|e| e.to_string())
}

fn parse_fan_speed(s: &str) -> Result<proto::FanSpeed, String> {
    let speed = clap_num::number_range(
        s,
        proto::FanSpeed::MIN as i32,
        proto::FanSpeed::MAX as i32,
    )?;
    proto::FanSpeed::try_from(speed).map_err(|e| e.to_string())
}

fn parse_slot(s: &str) -> Result<proto::ScheduleSlot, String> {
    let slot = clap_num::number_range(s, proto::ScheduleSlot::MIN, proto::ScheduleSlot::MAX)?;
    proto::ScheduleSlot::try_from(slot).map_err(|e| e.to_string())
}

fn parse_schedule_time(s: &str) -> Result<proto::ScheduleTime, String> {
    s.parse().map_err(|e: pellet_stove_lib::Error| e.to_string())
}

fn parse_days(s: &str) -> Result<proto::DayMask, String> {
    let mask = clap_num::maybe_hex_range::<u8>(s, 0, 0x7F)?;
    Ok(proto::DayMask::from(mask))
}

fn parse_date_time(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
        .map_err(|e| format!("Invalid date/time '{s}', expected 'YYYY-MM-DD HH:MM': {e}"))
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Switch the stove on.
    On,

    /// Switch the stove off.
    Off,

    /// Read the low nibble of the four status registers.
    Status,

    /// Read setpoint, ambient, flame and smoke temperatures.
    Temperature,

    /// Set the requested room temperature in °C.
    SetTemperature {
        temperature: u16,
    },

    /// Read the heating power level (0 to 7).
    Power,

    /// Set the heating power level.
    SetPower {
        /// Power level from 0 to 7.
        #[arg(value_parser = parse_power)]
        power: proto::Power,
    },

    /// Read the convection fan speed (0 to 7).
    FanSpeed,

    /// Set the convection fan speed.
    SetFanSpeed {
        /// Fan speed from 0 to 7.
        #[arg(value_parser = parse_fan_speed)]
        fan_speed: proto::FanSpeed,
    },

    /// Read smoke extractor speed and smoke temperature.
    Smoke,

    /// Read measured and requested pressure.
    Pressure,

    /// Read pellet motor speed, requested speed and current.
    PelletMotor,

    /// Read the stove clock.
    DateTime,

    /// Set the stove clock.
    /// Without argument the local time of this computer is used.
    #[clap(verbatim_doc_comment)]
    SetDateTime {
        /// Date and time as "YYYY-MM-DD HH:MM".
        #[arg(value_parser = parse_date_time)]
        date_time: Option<NaiveDateTime>,
    },

    /// Read one of the four timer programs.
    Schedule {
        /// Program slot from 1 to 4.
        #[arg(value_parser = parse_slot)]
        slot: proto::ScheduleSlot,
    },

    /// Overwrite one of the four timer programs.
    /// Times are given as "HHhMM" in ten minute steps, e.g. "5H00" or "17h30".
    /// An omitted start or end time is stored as unset.
    #[clap(verbatim_doc_comment)]
    SetSchedule {
        /// Program slot from 1 to 4.
        #[arg(value_parser = parse_slot)]
        slot: proto::ScheduleSlot,

        #[arg(long, value_parser = parse_schedule_time)]
        start: Option<proto::ScheduleTime>,

        #[arg(long, value_parser = parse_schedule_time)]
        end: Option<proto::ScheduleTime>,

        /// Weekday bit mask, bit 0 is Monday and bit 6 Sunday.
        /// Can be given in decimal or hexadecimal (e.g. "0x1F" for Monday to Friday).
        #[arg(long, value_parser = parse_days, default_value = "0x7F", verbatim_doc_comment)]
        days: proto::DayMask,

        #[arg(long, value_parser = parse_power)]
        power: proto::Power,

        /// Requested room temperature in °C.
        #[arg(long)]
        temperature: u16,

        #[arg(long, value_parser = parse_fan_speed)]
        fan_speed: proto::FanSpeed,

        /// Do not ask for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Read a raw register, e.g. "raw 0 2F".
    Raw {
        /// Memory bank token: 0, 21, 25, 80, A1 or A5.
        bank: proto::Bank,
        /// Register address as hex digits.
        address: String,
    },
}

const fn about_text() -> &'static str {
    "Pellet stove CLI - Read and control a pellet stove over its UDP protocol."
}

#[derive(Parser, Debug)]
#[command(name="stovectl", author, version, about=about_text(), long_about = None, propagate_version = true)]
pub struct CliArgs {
    /// Configure verbosity of logging output.
    /// -v for info, -vv for debug, -vvv for trace. Default shows warnings.
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    /// Host name or IP address of the stove.
    #[arg(long, required_unless_present = "config")]
    pub host: Option<String>,

    /// UDP port of the stove.
    #[arg(global = true, long, default_value_t = proto::DEFAULT_PORT)]
    pub port: u16,

    /// Receive timeout of a single request.
    /// Examples: "1s", "500ms".
    #[arg(global = true, long, default_value = "1s", value_parser = humantime::parse_duration, verbatim_doc_comment)]
    pub timeout: Duration,

    /// YAML file with host, port and timeout. Replaces the connection arguments.
    #[arg(long, conflicts_with = "host")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommands,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_arguments() {
        let args = CliArgs::parse_from([
            "stovectl",
            "--host",
            "10.0.0.7",
            "set-schedule",
            "1",
            "--start",
            "5H00",
            "--days",
            "0x1F",
            "--power",
            "4",
            "--temperature",
            "22",
            "--fan-speed",
            "3",
        ]);
        assert_eq!(args.host.as_deref(), Some("10.0.0.7"));
        assert_eq!(args.port, 2390);
        assert_eq!(args.timeout, Duration::from_secs(1));
        match args.command {
            CliCommands::SetSchedule {
                slot,
                start,
                end,
                days,
                yes,
                ..
            } => {
                assert_eq!(*slot, 1);
                assert_eq!(start.map(|t| t.to_string()), Some("05H00".to_string()));
                assert_eq!(end, None);
                assert_eq!(*days, 0x1F);
                assert!(!yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(CliArgs::try_parse_from(["stovectl", "--host", "h", "set-power", "8"]).is_err());
        assert!(CliArgs::try_parse_from(["stovectl", "--host", "h", "schedule", "5"]).is_err());
        assert!(CliArgs::try_parse_from(["stovectl", "power"]).is_err());
    }

    #[test]
    fn parse_set_date_time() {
        let args =
            CliArgs::parse_from(["stovectl", "--host", "h", "set-date-time", "2026-10-17 14:35"]);
        assert_eq!(
            args.command,
            CliCommands::SetDateTime {
                date_time: Some(parse_date_time("2026-10-17 14:35").unwrap())
            }
        );
        assert!(parse_date_time("17/10/2026").is_err());
    }
}
