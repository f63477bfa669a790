use crate::{
    config::StoveConfig,
    protocol as proto,
    transport::{self, Transport, UdpTransport},
};
use chrono::NaiveDateTime;
use log::*;

/// Client for a pellet stove.
///
/// Each accessor issues its register transactions one after another and blocks
/// for up to the receive timeout per transaction. Failures never escape: reads
/// yield `None` (per field for multi-register readings) and writes yield `false`.
///
/// The client is meant for one thread. Use [`crate::safe_client::SafeClient`]
/// to share a stove between threads.
#[derive(Debug)]
pub struct Stove<T = UdpTransport> {
    transport: T,
}

impl Stove<UdpTransport> {
    /// Creates an unconnected client for the stove at `host:port`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pellet_stove_lib::client::Stove;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut stove = Stove::new("192.168.1.50", 2390);
    /// stove.connect()?;
    /// println!("Temperatures (°C): {}", stove.get_temperature());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::with_transport(UdpTransport::new(host, port))
    }

    pub fn from_config(config: &StoveConfig) -> Self {
        Self::with_transport(UdpTransport::from_config(config))
    }
}

impl<T: Transport> Stove<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Opens the channel to the stove, a second call does nothing.
    pub fn connect(&mut self) -> transport::Result<()> {
        self.transport.connect()
    }

    fn read(&mut self, register: &proto::Register) -> Option<i32> {
        match self.transport.read(register) {
            Ok(value) => Some(value),
            Err(transport::Error::DeviceUnavailable) => {
                debug!("No data for register {register}");
                None
            }
            Err(err) => {
                warn!("Cannot read register {register}: {err}");
                None
            }
        }
    }

    fn write(&mut self, register: &proto::Register, value: u16) -> bool {
        match self.transport.write(register, value) {
            Ok(()) => true,
            Err(err) => {
                warn!("Cannot write {value:#x} to register {register}: {err}");
                false
            }
        }
    }

    /// Writes the steps in order and stops at the first failure.
    fn write_sequence(&mut self, steps: &[(proto::Register, u16)]) -> bool {
        for (n, (register, value)) in steps.iter().enumerate() {
            if !self.write(register, *value) {
                warn!(
                    "Write sequence aborted at step {} of {}",
                    n + 1,
                    steps.len()
                );
                return false;
            }
        }
        true
    }

    /// Reads any register, for exploring the device.
    pub fn read_raw(&mut self, register: proto::Register) -> Option<proto::RawValue> {
        let value = self.read(&register)?;
        Some(proto::RawValue::decode(register, value))
    }

    pub fn switch_on(&mut self) -> bool {
        self.write(&proto::WRITE_SWITCH_REG, proto::SWITCH_ON_VALUE)
    }

    pub fn switch_off(&mut self) -> bool {
        self.write(&proto::WRITE_SWITCH_REG, proto::SWITCH_OFF_VALUE)
    }

    /// Reads the smoke extractor speed (RPM) and the smoke temperature (°C).
    pub fn get_smoke_info(&mut self) -> proto::SmokeInfo {
        proto::SmokeInfo {
            rotor_speed: self
                .read(&proto::READ_SMOKE_ROTOR_SPEED_REG)
                .map(proto::SmokeInfo::decode_rotor_speed),
            temperature: self.read(&proto::READ_SMOKE_TEMPERATURE_REG),
        }
    }

    /// Reads the measured and the requested pressure (Pa).
    pub fn get_pressure_info(&mut self) -> proto::PressureInfo {
        proto::PressureInfo {
            pressure: self
                .read(&proto::READ_PRESSURE_REG)
                .map(proto::PressureInfo::decode_pressure),
            pressure_request: self
                .read(&proto::READ_PRESSURE_REQUEST_REG)
                .map(proto::PressureInfo::decode_pressure_request),
        }
    }

    /// Reads the pellet feed motor speed, its requested speed and its current (mA).
    pub fn get_pellet_motor_info(&mut self) -> proto::PelletMotorInfo {
        let speed_word = self.read(&proto::READ_PELLET_MOTOR_SPEED_REG);
        let current = self.read(&proto::READ_PELLET_MOTOR_CURRENT_REG);
        proto::PelletMotorInfo::decode(speed_word, current)
    }

    pub fn get_status(&mut self) -> proto::Status {
        proto::Status {
            param_08: self.read(&proto::READ_STATUS_08_REG).map(proto::low_nibble),
            param_10: self.read(&proto::READ_STATUS_10_REG).map(proto::low_nibble),
            param_22: self.read(&proto::READ_STATUS_22_REG).map(proto::low_nibble),
            param_73: self.read(&proto::READ_STATUS_73_REG).map(proto::low_nibble),
        }
    }

    /// Reads the setpoint, ambient, flame and smoke temperatures (°C).
    pub fn get_temperature(&mut self) -> proto::Temperatures {
        proto::Temperatures {
            setpoint: self.read(&proto::READ_SETPOINT_REG),
            ambient: self.read(&proto::READ_AMBIENT_TEMPERATURE_REG),
            flame: self.read(&proto::READ_FLAME_TEMPERATURE_REG),
            smoke: self.read(&proto::READ_SMOKE_TEMPERATURE_REG),
        }
    }

    /// Sets the requested room temperature (°C).
    pub fn set_temperature(&mut self, temperature: u16) -> bool {
        self.write(&proto::WRITE_SETPOINT_REG, temperature)
    }

    pub fn get_power(&mut self) -> Option<i32> {
        self.read(&proto::READ_POWER_REG)
    }

    pub fn set_power(&mut self, power: proto::Power) -> bool {
        self.write(&proto::WRITE_POWER_REG, power.encode_for_write_register())
    }

    pub fn get_fan_speed(&mut self) -> Option<i32> {
        self.read(&proto::READ_FAN_SPEED_REG)
    }

    pub fn set_fan_speed(&mut self, fan_speed: proto::FanSpeed) -> bool {
        self.write(
            &proto::WRITE_FAN_SPEED_REG,
            fan_speed.encode_for_write_register(),
        )
    }

    /// Reads the stove clock, `None` if a field is missing or the date is invalid.
    pub fn get_date_time(&mut self) -> Option<NaiveDateTime> {
        let hour = self.read(&proto::READ_CLOCK_HOUR_REG)?;
        let minute = self.read(&proto::READ_CLOCK_MINUTE_REG)?;
        let day = self.read(&proto::READ_CLOCK_DAY_REG)?;
        let month = self.read(&proto::READ_CLOCK_MONTH_REG)?;
        let year = self.read(&proto::READ_CLOCK_YEAR_REG)?;
        let date_time = proto::decode_date_time(hour, minute, day, month, year);
        if date_time.is_none() {
            warn!("Stove clock holds an invalid date: {year}-{month}-{day} {hour}:{minute}");
        }
        date_time
    }

    /// Sets the stove clock, stops at the first rejected field.
    pub fn set_date_time(&mut self, date_time: &NaiveDateTime) -> bool {
        match proto::encode_date_time(date_time) {
            Ok(steps) => self.write_sequence(&steps),
            Err(err) => {
                warn!("Cannot set stove clock: {err}");
                false
            }
        }
    }

    fn read_schedule_time(
        &mut self,
        register: &proto::Register,
    ) -> Option<Option<proto::ScheduleTime>> {
        let raw = self.read(register)?;
        match proto::ScheduleTime::decode(raw) {
            Ok(time) => Some(time),
            Err(err) => {
                warn!("Register {register}: {err}");
                None
            }
        }
    }

    pub fn get_schedule(&mut self, slot: proto::ScheduleSlot) -> proto::Schedule {
        let reg = |offset| slot.register(proto::Bank::Settings, offset);
        proto::Schedule {
            start_time: self.read_schedule_time(&reg(proto::SCHEDULE_START_TIME_OFFSET)),
            end_time: self.read_schedule_time(&reg(proto::SCHEDULE_END_TIME_OFFSET)),
            days: self
                .read(&reg(proto::SCHEDULE_DAYS_OFFSET))
                .map(|raw| proto::DayMask::from(proto::low_byte(raw) as u8)),
            power: self.read(&reg(proto::SCHEDULE_POWER_OFFSET)),
            temperature: self.read(&reg(proto::SCHEDULE_TEMPERATURE_OFFSET)),
            fan_speed: self.read(&reg(proto::SCHEDULE_FAN_SPEED_OFFSET)),
        }
    }

    /// Stores a schedule program, stops at the first rejected register.
    pub fn set_schedule(
        &mut self,
        slot: proto::ScheduleSlot,
        program: &proto::ScheduleProgram,
    ) -> bool {
        self.write_sequence(&program.encode_for_write(slot))
    }
}
