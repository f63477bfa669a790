/// Errors raised while building or decoding stove register values.
///
/// These never reach the accessor surface of [`crate::client::Stove`]; they are
/// returned by the typed constructors in [`crate::protocol`] so that invalid
/// input is rejected before any datagram is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Power {0} out of range (0 to 7)")]
    PowerOutOfRange(i32),
    #[error("Fan speed {0} out of range (0 to 7)")]
    FanSpeedOutOfRange(i32),
    #[error("Schedule slot {0} out of range (1 to 4)")]
    ScheduleSlotOutOfRange(u8),
    #[error("Invalid schedule time '{0}', expected HHhMM")]
    InvalidScheduleTime(String),
    #[error("Raw schedule time {0:#x} out of range")]
    ScheduleTimeOutOfRange(i32),
    #[error("Year {0} out of range (2000 to 2255)")]
    YearOutOfRange(i32),
}
