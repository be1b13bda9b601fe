//! Fixed host-to-sensor command frames.
//!
//! Every command is a 16-byte literal from the datasheet, checksum included.
//! Nothing here is derived at runtime.

/// Length of every command frame.
pub const LEN: usize = 16;

/// Enter low-power standby. Stops the fan and the laser.
pub(crate) const SLEEP: [u8; LEN] = [
    0x33, 0x3E, 0x00, 0x0C, 0xA1, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x1E,
];

/// Leave standby. Readings stabilise ~30 s after wake while the fan spins up.
pub(crate) const WAKE: [u8; LEN] = [
    0x33, 0x3E, 0x00, 0x0C, 0xA1, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x1F,
];

/// Switch to active reporting: the sensor streams frames unprompted.
pub(crate) const ACTIVE_MODE: [u8; LEN] = [
    0x33, 0x3E, 0x00, 0x0C, 0xA2, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x1F,
];

/// Switch to passive reporting: the sensor answers requests only.
pub(crate) const PASSIVE_MODE: [u8; LEN] = [
    0x33, 0x3E, 0x00, 0x0C, 0xA2, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x20,
];

/// Request one measurement frame while in passive mode.
pub(crate) const REQUEST_READ: [u8; LEN] = [
    0x33, 0x3E, 0x00, 0x0C, 0xA4, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x21,
];

/// Last reporting mode the driver asked the sensor to take.
///
/// Purely advisory; the sensor powers up in [`Mode::Active`] and nothing is
/// read back to confirm a switch. Its only use is gating the request-read
/// command, which the sensor ignores outside passive mode anyway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Active,
    Passive,
}
