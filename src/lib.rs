//! A library for controlling pellet stoves through their UDP control protocol.
//!
//! The stove listens on UDP port 2390 for short ASCII requests that read or
//! write one register, identified by a memory bank token and an address. This
//! crate maps named stove attributes (temperatures, power, fan speed, motor
//! speeds, clock, timer programs) onto those registers.
//!
//! 1.  **[`client::Stove`]**: single-threaded client with one accessor per stove
//!     attribute. Accessors never fail loudly, unreadable values are `None`
//!     and rejected writes return `false`.
//!
//! 2.  **[`safe_client::SafeClient`]**: cloneable, thread-safe handle that
//!     serializes accessors on the shared socket.
//!
//! The register table, value types and wire encoding live in [`protocol`], the
//! UDP request/reply primitive in [`transport`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use pellet_stove_lib::{client::Stove, protocol::Power};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut stove = Stove::new("192.168.1.50", 2390);
//!     stove.connect()?;
//!
//!     println!("Temperatures (°C): {}", stove.get_temperature());
//!     if !stove.set_power(Power::try_from(4)?) {
//!         eprintln!("The stove did not accept the new power level");
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod protocol;
pub mod safe_client;
pub mod transport;

pub use error::Error;
