//! Thread-safe stove client.
//!
//! Interleaved requests on one socket would mix up request/reply pairs, so
//! [`SafeClient`] serializes every accessor behind a mutex. Multi-register
//! accessors hold the lock for their whole transaction sequence.
//!
//! ## Example
//!
//! ```no_run
//! use pellet_stove_lib::{config::StoveConfig, safe_client::SafeClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SafeClient::connect(&StoveConfig::new("192.168.1.50"))?;
//!
//!     let poller = client.clone();
//!     std::thread::spawn(move || println!("Temperatures: {}", poller.get_temperature()));
//!
//!     println!("Power: {:?}", client.get_power());
//!     Ok(())
//! }
//! ```

use crate::{
    client::Stove,
    config::StoveConfig,
    protocol as proto,
    transport::{self, Transport, UdpTransport},
};
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle sharing one [`Stove`] between threads.
#[derive(Debug)]
pub struct SafeClient<T = UdpTransport> {
    stove: Arc<Mutex<Stove<T>>>,
}

impl<T> Clone for SafeClient<T> {
    fn clone(&self) -> Self {
        Self {
            stove: self.stove.clone(),
        }
    }
}

impl SafeClient<UdpTransport> {
    /// Creates the client and opens its socket.
    pub fn connect(config: &StoveConfig) -> transport::Result<Self> {
        let mut stove = Stove::from_config(config);
        stove.connect()?;
        Ok(Self::new(stove))
    }
}

impl<T: Transport> SafeClient<T> {
    pub fn new(stove: Stove<T>) -> Self {
        Self {
            stove: Arc::new(Mutex::new(stove)),
        }
    }

    /// Creates a new `SafeClient` from a shared stove.
    pub fn from_shared(stove: Arc<Mutex<Stove<T>>>) -> Self {
        Self { stove }
    }

    /// Clones the shared stove.
    pub fn clone_shared(&self) -> Arc<Mutex<Stove<T>>> {
        self.stove.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Stove<T>> {
        // Accessors keep no state between calls, so a poisoned lock is still usable.
        self.stove.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read_raw(&self, register: proto::Register) -> Option<proto::RawValue> {
        self.lock().read_raw(register)
    }

    pub fn switch_on(&self) -> bool {
        self.lock().switch_on()
    }

    pub fn switch_off(&self) -> bool {
        self.lock().switch_off()
    }

    pub fn get_smoke_info(&self) -> proto::SmokeInfo {
        self.lock().get_smoke_info()
    }

    pub fn get_pressure_info(&self) -> proto::PressureInfo {
        self.lock().get_pressure_info()
    }

    pub fn get_pellet_motor_info(&self) -> proto::PelletMotorInfo {
        self.lock().get_pellet_motor_info()
    }

    pub fn get_status(&self) -> proto::Status {
        self.lock().get_status()
    }

    pub fn get_temperature(&self) -> proto::Temperatures {
        self.lock().get_temperature()
    }

    pub fn set_temperature(&self, temperature: u16) -> bool {
        self.lock().set_temperature(temperature)
    }

    pub fn get_power(&self) -> Option<i32> {
        self.lock().get_power()
    }

    pub fn set_power(&self, power: proto::Power) -> bool {
        self.lock().set_power(power)
    }

    pub fn get_fan_speed(&self) -> Option<i32> {
        self.lock().get_fan_speed()
    }

    pub fn set_fan_speed(&self, fan_speed: proto::FanSpeed) -> bool {
        self.lock().set_fan_speed(fan_speed)
    }

    pub fn get_date_time(&self) -> Option<NaiveDateTime> {
        self.lock().get_date_time()
    }

    pub fn set_date_time(&self, date_time: &NaiveDateTime) -> bool {
        self.lock().set_date_time(date_time)
    }

    pub fn get_schedule(&self, slot: proto::ScheduleSlot) -> proto::Schedule {
        self.lock().get_schedule(slot)
    }

    pub fn set_schedule(
        &self,
        slot: proto::ScheduleSlot,
        program: &proto::ScheduleProgram,
    ) -> bool {
        self.lock().set_schedule(slot, program)
    }
}
