//! Wire format and register table of the pellet stove UDP protocol.
//!
//! The stove answers plain ASCII datagrams:
//!
//! * read request `"<bank>;<address>\n"`, answered by a base-10 integer (`-1` = no data),
//! * write request `"<bank>;<address>;<hex value>\n"`, answered by a text containing
//!   [`SUCCESS_MARKER`] when the value was accepted.
//!
//! Banks and addresses are sent verbatim as the tokens listed here. The device
//! parser is undocumented, so the tokens are kept exactly as observed rather than
//! re-derived from a numeric scheme.

use crate::transport::Error as ReplyError;
use crate::Error;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Weekday};
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

pub const DEFAULT_PORT: u16 = 2390;

/// Largest reply datagram accepted for a read request.
pub const MAX_READ_REPLY_SIZE: usize = 20;
/// Largest reply datagram accepted for a write request.
pub const MAX_WRITE_REPLY_SIZE: usize = 30;

pub const SUCCESS_MARKER: &str = "successfully";
pub const NO_DATA: i32 = -1;

/// Memory region selector of a register reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Live measurements (`"0"`).
    Live,
    /// User settings and schedules, read side (`"21"`).
    Settings,
    /// Real time clock, read side (`"25"`).
    Clock,
    /// Command register, write only (`"80"`).
    Command,
    /// User settings and schedules, write side (`"A1"`).
    SettingsWrite,
    /// Real time clock, write side (`"A5"`).
    ClockWrite,
}

impl Bank {
    pub const fn token(&self) -> &'static str {
        match self {
            Bank::Live => "0",
            Bank::Settings => "21",
            Bank::Clock => "25",
            Bank::Command => "80",
            Bank::SettingsWrite => "A1",
            Bank::ClockWrite => "A5",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Bank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Bank::Live,
            Bank::Settings,
            Bank::Clock,
            Bank::Command,
            Bank::SettingsWrite,
            Bank::ClockWrite,
        ]
        .into_iter()
        .find(|bank| bank.token().eq_ignore_ascii_case(s))
        .ok_or_else(|| format!("Unknown bank '{s}'"))
    }
}

/// A `(bank, address)` pair identifying one stove value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Register {
    bank: Bank,
    address: Cow<'static, str>,
}

impl Register {
    /// Creates a register with a literal address token.
    pub const fn fixed(bank: Bank, address: &'static str) -> Self {
        Self {
            bank,
            address: Cow::Borrowed(address),
        }
    }

    pub fn new(bank: Bank, address: impl Into<Cow<'static, str>>) -> Self {
        Self {
            bank,
            address: address.into(),
        }
    }

    pub fn bank(&self) -> Bank {
        self.bank
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Encodes the read request line for this register.
    pub fn encode_read_request(&self) -> String {
        format!("{};{}\n", self.bank, self.address)
    }

    /// Encodes the write request line, the value is sent as lowercase hex.
    pub fn encode_write_request(&self, value: u16) -> String {
        format!("{};{};{:x}\n", self.bank, self.address, value)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.bank, self.address)
    }
}

pub const WRITE_SWITCH_REG: Register = Register::fixed(Bank::Command, "E8");
pub const SWITCH_ON_VALUE: u16 = 0x55;
pub const SWITCH_OFF_VALUE: u16 = 0xAA;

pub const READ_SMOKE_ROTOR_SPEED_REG: Register = Register::fixed(Bank::Live, "2F");
pub const READ_SMOKE_TEMPERATURE_REG: Register = Register::fixed(Bank::Live, "2");
pub const READ_FLAME_TEMPERATURE_REG: Register = Register::fixed(Bank::Live, "0");
pub const READ_AMBIENT_TEMPERATURE_REG: Register = Register::fixed(Bank::Live, "67");

pub const READ_PRESSURE_REG: Register = Register::fixed(Bank::Live, "25");
pub const READ_PRESSURE_REQUEST_REG: Register = Register::fixed(Bank::Live, "17");

pub const READ_PELLET_MOTOR_SPEED_REG: Register = Register::fixed(Bank::Live, "e");
pub const READ_PELLET_MOTOR_CURRENT_REG: Register = Register::fixed(Bank::Live, "4");

pub const READ_STATUS_08_REG: Register = Register::fixed(Bank::Live, "8");
pub const READ_STATUS_10_REG: Register = Register::fixed(Bank::Live, "10");
pub const READ_STATUS_22_REG: Register = Register::fixed(Bank::Live, "22");
pub const READ_STATUS_73_REG: Register = Register::fixed(Bank::Live, "73");

pub const READ_SETPOINT_REG: Register = Register::fixed(Bank::Settings, "62");
pub const WRITE_SETPOINT_REG: Register = Register::fixed(Bank::SettingsWrite, "62");

pub const READ_POWER_REG: Register = Register::fixed(Bank::Settings, "60");
pub const WRITE_POWER_REG: Register = Register::fixed(Bank::SettingsWrite, "60");

pub const READ_FAN_SPEED_REG: Register = Register::fixed(Bank::Settings, "6C");
pub const WRITE_FAN_SPEED_REG: Register = Register::fixed(Bank::SettingsWrite, "6C");

pub const READ_CLOCK_HOUR_REG: Register = Register::fixed(Bank::Clock, "0");
pub const READ_CLOCK_MINUTE_REG: Register = Register::fixed(Bank::Clock, "1");
pub const READ_CLOCK_DAY_REG: Register = Register::fixed(Bank::Clock, "2");
pub const READ_CLOCK_MONTH_REG: Register = Register::fixed(Bank::Clock, "3");
pub const READ_CLOCK_YEAR_REG: Register = Register::fixed(Bank::Clock, "4");

pub const WRITE_CLOCK_HOUR_REG: Register = Register::fixed(Bank::ClockWrite, "0");
pub const WRITE_CLOCK_MINUTE_REG: Register = Register::fixed(Bank::ClockWrite, "1");
pub const WRITE_CLOCK_DAY_REG: Register = Register::fixed(Bank::ClockWrite, "2");
pub const WRITE_CLOCK_MONTH_REG: Register = Register::fixed(Bank::ClockWrite, "3");
pub const WRITE_CLOCK_YEAR_REG: Register = Register::fixed(Bank::ClockWrite, "4");
pub const WRITE_CLOCK_WEEKDAY_REG: Register = Register::fixed(Bank::ClockWrite, "5");

pub const CLOCK_YEAR_OFFSET: i32 = 2000;

/// Decodes the reply to a read request.
///
/// The reply is a base-10 integer, surrounding whitespace and NUL padding are
/// ignored. The sentinel [`NO_DATA`] is reported as [`ReplyError::DeviceUnavailable`].
pub fn decode_read_reply(data: &[u8]) -> Result<i32, ReplyError> {
    let text = String::from_utf8_lossy(data);
    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    match trimmed.parse::<i32>() {
        Ok(NO_DATA) => Err(ReplyError::DeviceUnavailable),
        Ok(value) => Ok(value),
        Err(_) => Err(ReplyError::MalformedReply(trimmed.to_string())),
    }
}

/// Checks the reply to a write request for the success marker.
pub fn decode_write_reply(data: &[u8]) -> Result<(), ReplyError> {
    let text = String::from_utf8_lossy(data);
    if text.to_ascii_lowercase().contains(SUCCESS_MARKER) {
        Ok(())
    } else {
        Err(ReplyError::Rejected(text.trim().to_string()))
    }
}

pub fn low_byte(value: i32) -> i32 {
    value & 0xFF
}

pub fn high_byte(value: i32) -> i32 {
    value >> 8
}

pub fn low_nibble(value: i32) -> u8 {
    (value & 0xF) as u8
}

/// Stove heating power level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32"))]
pub struct Power(u8);

impl Power {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 7;

    pub fn encode_for_write_register(&self) -> u16 {
        self.0 as u16
    }
}

impl TryFrom<i32> for Power {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (Self::MIN as i32..=Self::MAX as i32).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::PowerOutOfRange(value))
        }
    }
}

impl Deref for Power {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convection fan speed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "i32"))]
pub struct FanSpeed(u8);

impl FanSpeed {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 7;

    pub fn encode_for_write_register(&self) -> u16 {
        self.0 as u16
    }
}

impl TryFrom<i32> for FanSpeed {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        if (Self::MIN as i32..=Self::MAX as i32).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::FanSpeedOutOfRange(value))
        }
    }
}

impl Deref for FanSpeed {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw value of a schedule time register that means "not set".
pub const SCHEDULE_TIME_UNSET: u16 = 0x90;

/// Base address of each schedule slot, index 0 is unused.
const SCHEDULE_SLOT_BASE: [u16; 5] = [0, 0x8C, 0xA0, 0xB4, 0xC8];

pub const SCHEDULE_START_TIME_OFFSET: u16 = 0;
pub const SCHEDULE_END_TIME_OFFSET: u16 = 2;
pub const SCHEDULE_DAYS_OFFSET: u16 = 4;
pub const SCHEDULE_POWER_OFFSET: u16 = 6;
pub const SCHEDULE_TEMPERATURE_OFFSET: u16 = 8;
pub const SCHEDULE_FAN_SPEED_OFFSET: u16 = 14;

/// One of the four timer programs stored in the stove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8"))]
pub struct ScheduleSlot(u8);

impl ScheduleSlot {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    pub fn base_address(&self) -> u16 {
        SCHEDULE_SLOT_BASE[self.0 as usize]
    }

    /// Register at `offset` from the slot base in the given bank.
    ///
    /// Schedule addresses are sent as lowercase hex.
    pub fn register(&self, bank: Bank, offset: u16) -> Register {
        Register::new(bank, format!("{:x}", self.base_address() + offset))
    }
}

impl TryFrom<u8> for ScheduleSlot {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::ScheduleSlotOutOfRange(value))
        }
    }
}

impl Deref for ScheduleSlot {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Start or end time of a schedule program.
///
/// The stove stores times in ten minute steps (six steps per hour), so the
/// minute is truncated to a multiple of ten when encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleTime {
    hour: u8,
    minute: u8,
}

impl ScheduleTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, Error> {
        if hour < 24 && minute < 60 {
            Ok(Self { hour, minute })
        } else {
            Err(Error::InvalidScheduleTime(format!("{hour}H{minute}")))
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Decodes a raw schedule time register, `None` means the time is not set.
    pub fn decode(raw: i32) -> Result<Option<Self>, Error> {
        match raw {
            r if r == SCHEDULE_TIME_UNSET as i32 => Ok(None),
            0..=0x8F => Ok(Some(Self {
                hour: (raw / 6) as u8,
                minute: ((raw % 6) * 10) as u8,
            })),
            _ => Err(Error::ScheduleTimeOutOfRange(raw)),
        }
    }

    pub fn encode(time: Option<&Self>) -> u16 {
        match time {
            Some(time) => time.hour as u16 * 6 + time.minute as u16 / 10,
            None => SCHEDULE_TIME_UNSET,
        }
    }
}

impl FromStr for ScheduleTime {
    type Err = Error;

    /// Parses `"5H00"`, `"17h30"` or `"05H10"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidScheduleTime(s.to_string());
        let upper = s.trim().to_ascii_uppercase();
        let (hour, minute) = upper.split_once('H').ok_or_else(invalid)?;
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}H{:02}", self.hour, self.minute)
    }
}

/// Weekdays a schedule program is active on, bit 0 is Monday and bit 6 Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DayMask(u8);

impl DayMask {
    pub const ALL: DayMask = DayMask(0x7F);

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        std::iter::successors(Some(Weekday::Mon), |day| Some(day.succ()))
            .take(7)
            .filter(|day| self.contains(*day))
    }

    pub fn encode_for_write_register(&self) -> u16 {
        self.0 as u16
    }
}

impl From<u8> for DayMask {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl FromIterator<Weekday> for DayMask {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut mask = DayMask::default();
        for day in iter {
            mask.insert(day);
        }
        mask
    }
}

impl Deref for DayMask {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for DayMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.days().map(|d| d.to_string()).collect::<Vec<_>>();
        if days.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&days.join(","))
        }
    }
}

/// Helper to print an optional reading.
struct Reading<'a, T>(&'a Option<T>);

impl<T: fmt::Display> fmt::Display for Reading<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str("n/a"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SmokeInfo {
    /// Smoke extractor speed in RPM.
    pub rotor_speed: Option<i32>,
    /// Smoke temperature in °C.
    pub temperature: Option<i32>,
}

impl SmokeInfo {
    /// The device reports the extractor speed in tens of RPM.
    pub fn decode_rotor_speed(raw: i32) -> i32 {
        raw * 10
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PressureInfo {
    /// Measured pressure in Pa.
    pub pressure: Option<f32>,
    /// Requested pressure in Pa.
    pub pressure_request: Option<i32>,
}

impl PressureInfo {
    /// The device reports the pressure in tenths of Pa.
    pub fn decode_pressure(raw: i32) -> f32 {
        raw as f32 / 10.0
    }

    pub fn decode_pressure_request(raw: i32) -> i32 {
        low_byte(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PelletMotorInfo {
    pub speed: Option<i32>,
    pub speed_request: Option<i32>,
    /// Motor current in mA.
    pub current: Option<i32>,
}

impl PelletMotorInfo {
    /// Splits the speed word: low byte is the actual speed, high byte the requested one.
    pub fn decode(speed_word: Option<i32>, current: Option<i32>) -> Self {
        Self {
            speed: speed_word.map(low_byte),
            speed_request: speed_word.map(high_byte),
            current,
        }
    }
}

/// Low nibbles of the four status registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Status {
    pub param_08: Option<u8>,
    pub param_10: Option<u8>,
    pub param_22: Option<u8>,
    pub param_73: Option<u8>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x08={} 0x10={} 0x22={} 0x73={}",
            Reading(&self.param_08),
            Reading(&self.param_10),
            Reading(&self.param_22),
            Reading(&self.param_73)
        )
    }
}

/// Main temperatures in °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Temperatures {
    pub setpoint: Option<i32>,
    pub ambient: Option<i32>,
    pub flame: Option<i32>,
    pub smoke: Option<i32>,
}

impl fmt::Display for Temperatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "setpoint={} ambient={} flame={} smoke={}",
            Reading(&self.setpoint),
            Reading(&self.ambient),
            Reading(&self.flame),
            Reading(&self.smoke)
        )
    }
}

/// A schedule program as read from the stove.
///
/// Every field is `None` when its register could not be read. The start and end
/// times carry a second level: `Some(None)` means the register was read and the
/// time is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Schedule {
    pub start_time: Option<Option<ScheduleTime>>,
    pub end_time: Option<Option<ScheduleTime>>,
    pub days: Option<DayMask>,
    pub power: Option<i32>,
    pub temperature: Option<i32>,
    pub fan_speed: Option<i32>,
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let time = |t: &Option<Option<ScheduleTime>>| match t {
            Some(Some(time)) => time.to_string(),
            Some(None) => "unset".to_string(),
            None => "n/a".to_string(),
        };
        write!(
            f,
            "start={} end={} days={} power={} temperature={} fan_speed={}",
            time(&self.start_time),
            time(&self.end_time),
            Reading(&self.days),
            Reading(&self.power),
            Reading(&self.temperature),
            Reading(&self.fan_speed)
        )
    }
}

/// A schedule program to be written to the stove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScheduleProgram {
    pub start_time: Option<ScheduleTime>,
    pub end_time: Option<ScheduleTime>,
    pub days: DayMask,
    pub power: Power,
    pub temperature: u16,
    pub fan_speed: FanSpeed,
}

impl ScheduleProgram {
    /// Ordered register writes storing this program into `slot`.
    pub fn encode_for_write(&self, slot: ScheduleSlot) -> Vec<(Register, u16)> {
        let reg = |offset| slot.register(Bank::SettingsWrite, offset);
        vec![
            (
                reg(SCHEDULE_START_TIME_OFFSET),
                ScheduleTime::encode(self.start_time.as_ref()),
            ),
            (
                reg(SCHEDULE_END_TIME_OFFSET),
                ScheduleTime::encode(self.end_time.as_ref()),
            ),
            (
                reg(SCHEDULE_DAYS_OFFSET),
                self.days.encode_for_write_register(),
            ),
            (
                reg(SCHEDULE_POWER_OFFSET),
                self.power.encode_for_write_register(),
            ),
            (reg(SCHEDULE_TEMPERATURE_OFFSET), self.temperature),
            (
                reg(SCHEDULE_FAN_SPEED_OFFSET),
                self.fan_speed.encode_for_write_register(),
            ),
        ]
    }
}

/// Builds the stove date/time from the raw clock registers.
///
/// Each register holds its value in the low byte, the year is stored as an
/// offset from 2000. Returns `None` for an impossible date.
pub fn decode_date_time(
    hour: i32,
    minute: i32,
    day: i32,
    month: i32,
    year: i32,
) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        low_byte(year) + CLOCK_YEAR_OFFSET,
        low_byte(month) as u32,
        low_byte(day) as u32,
    )?
    .and_hms_opt(low_byte(hour) as u32, low_byte(minute) as u32, 0)
}

/// Ordered register writes setting the stove clock, ending with the ISO weekday.
pub fn encode_date_time(date_time: &NaiveDateTime) -> Result<Vec<(Register, u16)>, Error> {
    let year = date_time.year();
    let year_offset = u8::try_from(year - CLOCK_YEAR_OFFSET)
        .map_err(|_| Error::YearOutOfRange(year))?;
    Ok(vec![
        (WRITE_CLOCK_HOUR_REG, date_time.hour() as u16),
        (WRITE_CLOCK_MINUTE_REG, date_time.minute() as u16),
        (WRITE_CLOCK_DAY_REG, date_time.day() as u16),
        (WRITE_CLOCK_MONTH_REG, date_time.month() as u16),
        (WRITE_CLOCK_YEAR_REG, year_offset as u16),
        (
            WRITE_CLOCK_WEEKDAY_REG,
            date_time.weekday().number_from_monday() as u16,
        ),
    ])
}

/// Raw register content with its byte split, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    pub register: Register,
    pub value: i32,
    pub lsb: i32,
    pub msb: i32,
}

impl RawValue {
    pub fn decode(register: Register, value: i32) -> Self {
        Self {
            register,
            value,
            lsb: low_byte(value),
            msb: high_byte(value),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (LSB {:#04x}, MSB {:#04x})",
            self.register, self.value, self.lsb, self.msb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn request_lines() {
        assert_eq!(READ_SMOKE_ROTOR_SPEED_REG.encode_read_request(), "0;2F\n");
        assert_eq!(READ_PELLET_MOTOR_SPEED_REG.encode_read_request(), "0;e\n");
        assert_eq!(READ_FAN_SPEED_REG.encode_read_request(), "21;6C\n");
        assert_eq!(
            WRITE_SWITCH_REG.encode_write_request(SWITCH_ON_VALUE),
            "80;E8;55\n"
        );
        assert_eq!(
            WRITE_SWITCH_REG.encode_write_request(SWITCH_OFF_VALUE),
            "80;E8;aa\n"
        );
        assert_eq!(WRITE_SETPOINT_REG.encode_write_request(24), "A1;62;18\n");
    }

    #[test]
    fn bank_from_str() {
        assert_eq!("a1".parse::<Bank>(), Ok(Bank::SettingsWrite));
        assert_eq!("0".parse::<Bank>(), Ok(Bank::Live));
        assert!("42".parse::<Bank>().is_err());
    }

    #[test]
    fn read_reply() {
        assert_matches!(decode_read_reply(b"215"), Ok(215));
        assert_matches!(decode_read_reply(b"  -12\r\n"), Ok(-12));
        assert_matches!(decode_read_reply(b"-1"), Err(ReplyError::DeviceUnavailable));
        assert_matches!(decode_read_reply(b"-1\n"), Err(ReplyError::DeviceUnavailable));
        assert_matches!(decode_read_reply(b"abc"), Err(ReplyError::MalformedReply(s)) if s == "abc");
        assert_matches!(decode_read_reply(b""), Err(ReplyError::MalformedReply(..)));
    }

    #[test]
    fn write_reply() {
        assert_matches!(decode_write_reply(b"Write successfully"), Ok(()));
        assert_matches!(decode_write_reply(b"SUCCESSFULLY done"), Ok(()));
        assert_matches!(decode_write_reply(b"xx successfully\n"), Ok(()));
        assert_matches!(decode_write_reply(b"Write failed"), Err(ReplyError::Rejected(s)) if s == "Write failed");
        assert_matches!(decode_write_reply(b""), Err(ReplyError::Rejected(..)));
    }

    #[test]
    fn power_and_fan_speed_range() {
        assert_matches!(Power::try_from(0), Ok(p) if *p == 0);
        assert_matches!(Power::try_from(7), Ok(p) if p.encode_for_write_register() == 7);
        assert_matches!(Power::try_from(8), Err(Error::PowerOutOfRange(8)));
        assert_matches!(Power::try_from(-1), Err(Error::PowerOutOfRange(-1)));
        assert_matches!(FanSpeed::try_from(4), Ok(f) if *f == 4);
        assert_matches!(FanSpeed::try_from(9), Err(Error::FanSpeedOutOfRange(9)));
    }

    #[test]
    fn schedule_slot_registers() {
        assert_matches!(ScheduleSlot::try_from(0), Err(Error::ScheduleSlotOutOfRange(0)));
        assert_matches!(ScheduleSlot::try_from(5), Err(Error::ScheduleSlotOutOfRange(5)));

        let bases: Vec<u16> = (1..=4)
            .map(|n| ScheduleSlot::try_from(n).unwrap().base_address())
            .collect();
        assert_eq!(bases, vec![0x8C, 0xA0, 0xB4, 0xC8]);

        let slot = ScheduleSlot::try_from(1).unwrap();
        assert_eq!(
            slot.register(Bank::Settings, SCHEDULE_FAN_SPEED_OFFSET)
                .encode_read_request(),
            "21;9a\n"
        );
        let slot = ScheduleSlot::try_from(4).unwrap();
        assert_eq!(
            slot.register(Bank::SettingsWrite, SCHEDULE_TEMPERATURE_OFFSET)
                .encode_write_request(22),
            "A1;d0;16\n"
        );
    }

    #[test]
    fn schedule_time_packing() {
        let start: ScheduleTime = "5H00".parse().unwrap();
        let raw = ScheduleTime::encode(Some(&start));
        assert_eq!(raw, 30);
        let decoded = ScheduleTime::decode(raw as i32).unwrap().unwrap();
        assert_eq!(decoded.to_string(), "05H00");

        let evening: ScheduleTime = "17h35".parse().unwrap();
        assert_eq!(ScheduleTime::encode(Some(&evening)), 17 * 6 + 3);
        assert_eq!(
            ScheduleTime::decode(17 * 6 + 3).unwrap().unwrap().to_string(),
            "17H30"
        );

        assert_eq!(ScheduleTime::encode(None), 0x90);
        assert_matches!(ScheduleTime::decode(0x90), Ok(None));
        assert_matches!(ScheduleTime::decode(0x91), Err(Error::ScheduleTimeOutOfRange(0x91)));
        assert_matches!(ScheduleTime::decode(-1), Err(Error::ScheduleTimeOutOfRange(-1)));
        assert_eq!(
            ScheduleTime::decode(0x8F).unwrap().unwrap().to_string(),
            "23H50"
        );
    }

    #[test]
    fn schedule_time_parse_errors() {
        assert_matches!("24H00".parse::<ScheduleTime>(), Err(Error::InvalidScheduleTime(..)));
        assert_matches!("12:00".parse::<ScheduleTime>(), Err(Error::InvalidScheduleTime(..)));
        assert_matches!("12H60".parse::<ScheduleTime>(), Err(Error::InvalidScheduleTime(..)));
        assert_matches!("xH10".parse::<ScheduleTime>(), Err(Error::InvalidScheduleTime(..)));
    }

    #[test]
    fn day_mask() {
        let workdays = DayMask::from(0b0011111);
        assert!(workdays.contains(Weekday::Mon));
        assert!(workdays.contains(Weekday::Fri));
        assert!(!workdays.contains(Weekday::Sat));
        assert_eq!(workdays.to_string(), "Mon,Tue,Wed,Thu,Fri");

        let weekend: DayMask = [Weekday::Sat, Weekday::Sun].into_iter().collect();
        assert_eq!(*weekend, 0b1100000);
        assert_eq!(DayMask::default().to_string(), "-");
    }

    #[test]
    fn pellet_motor_split() {
        let info = PelletMotorInfo::decode(Some(0x0105), Some(480));
        assert_eq!(info.speed, Some(5));
        assert_eq!(info.speed_request, Some(1));
        assert_eq!(info.current, Some(480));

        let info = PelletMotorInfo::decode(None, Some(480));
        assert_eq!(info.speed, None);
        assert_eq!(info.speed_request, None);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(SmokeInfo::decode_rotor_speed(135), 1350);
        assert_eq!(PressureInfo::decode_pressure(125), 12.5);
        assert_eq!(PressureInfo::decode_pressure_request(0x1234), 0x34);
        assert_eq!(low_nibble(0x5A), 0xA);
    }

    #[test]
    fn date_time_decode() {
        let dt = decode_date_time(14, 35, 17, 10, 26).unwrap();
        assert_eq!(dt.to_string(), "2026-10-17 14:35:00");
        // upper byte is ignored
        let dt = decode_date_time(0x0114, 35, 17, 10, 0x0A1A).unwrap();
        assert_eq!(dt.to_string(), "2026-10-17 20:35:00");
        assert_eq!(decode_date_time(10, 0, 31, 2, 26), None);
    }

    #[test]
    fn date_time_encode() {
        let dt = NaiveDate::from_ymd_opt(2026, 10, 17)
            .unwrap()
            .and_hms_opt(14, 35, 12)
            .unwrap();
        let steps = encode_date_time(&dt).unwrap();
        let values: Vec<u16> = steps.iter().map(|(_, v)| *v).collect();
        // 2026-10-17 is a Saturday
        assert_eq!(values, vec![14, 35, 17, 10, 26, 6]);
        assert_eq!(steps[5].0, WRITE_CLOCK_WEEKDAY_REG);

        let old = NaiveDate::from_ymd_opt(1999, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_matches!(encode_date_time(&old), Err(Error::YearOutOfRange(1999)));
    }

    #[test]
    fn schedule_program_encode() {
        let program = ScheduleProgram {
            start_time: Some("5H00".parse().unwrap()),
            end_time: None,
            days: DayMask::from(0b1111100),
            power: Power::try_from(4).unwrap(),
            temperature: 22,
            fan_speed: FanSpeed::try_from(3).unwrap(),
        };
        let lines: Vec<String> = program
            .encode_for_write(ScheduleSlot::try_from(1).unwrap())
            .iter()
            .map(|(reg, value)| reg.encode_write_request(*value))
            .collect();
        assert_eq!(
            lines,
            vec![
                "A1;8c;1e\n",
                "A1;8e;90\n",
                "A1;90;7c\n",
                "A1;92;4\n",
                "A1;94;16\n",
                "A1;9a;3\n",
            ]
        );
    }

    #[test]
    fn raw_value_split() {
        let raw = RawValue::decode(Register::fixed(Bank::Live, "4"), 0x0105);
        assert_eq!(raw.lsb, 5);
        assert_eq!(raw.msb, 1);
        assert_eq!(raw.to_string(), "0;4: 261 (LSB 0x05, MSB 0x01)");
    }
}
