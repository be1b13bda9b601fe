//! Driver for the A4CG particulate matter sensor.
//!
//! The sensor speaks a fixed-structure binary protocol over a 9600 baud
//! serial link: measurement frames flow sensor-to-host and are decoded one
//! byte at a time by [`FrameDecoder`], and five fixed command frames flow
//! host-to-sensor to switch power and reporting modes. [`A4cg`] wires both
//! onto an `embedded-hal-nb` serial port.
//!
//! Decoding never blocks and never allocates: each poll consumes at most one
//! byte, and a measurement is committed to the caller's [`Reading`] only
//! after its checksum verifies.

#![cfg_attr(not(test), no_std)]

mod command;
mod frame;
mod sensor;

/// Monotonic millisecond clock, consumed only for timeout bookkeeping.
///
/// Elapsed time is computed with wrapping arithmetic, so any free-running
/// `u32` millisecond counter works.
pub trait Clock {
    fn now_millis(&mut self) -> u32;
}

impl<F: FnMut() -> u32> Clock for F {
    fn now_millis(&mut self) -> u32 {
        self()
    }
}

pub use command::Mode;
pub use frame::{FrameDecoder, FrameError, Reading, Step, PAYLOAD_CAPACITY};
pub use sensor::{A4cg, Error};
