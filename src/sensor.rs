use embedded_hal_nb::serial::{Read, Write};
use log::{debug, trace};

use crate::command::{self, Mode};
use crate::frame::{FrameDecoder, Reading, Step};
use crate::Clock;

/// Errors from the blocking read path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// No validated frame arrived before the deadline.
    Timeout,
    /// The underlying serial read failed.
    Serial(E),
}

/// Driver for one A4CG sensor on a serial link.
///
/// Owns both halves of the transport plus the frame decoder, so multiple
/// sensors are just multiple `A4cg` values. Nothing in here blocks except
/// [`read_until`](A4cg::read_until), and that only against the caller's
/// clock.
#[derive(Debug)]
pub struct A4cg<Tx, Rx> {
    tx: Tx,
    rx: Rx,
    decoder: FrameDecoder,
    mode: Mode,
}

impl<Tx: Write, Rx: Read> A4cg<Tx, Rx> {
    /// Worst-case time for the sensor to answer a single request, in
    /// milliseconds. The conventional `read_until` timeout.
    pub const SINGLE_RESPONSE_MS: u32 = 1000;
    /// Worst-case time for a full measurement cycle.
    pub const TOTAL_RESPONSE_MS: u32 = 1000 * 10;
    /// Time to wait after [`wake_up`](A4cg::wake_up) before readings are
    /// trustworthy, while the fan comes up to speed. Advisory.
    pub const STEADY_RESPONSE_MS: u32 = 1000 * 30;

    /// The fixed line rate of the sensor.
    pub const BAUD_RATE: u32 = 9600;

    pub fn new(tx: Tx, rx: Rx) -> A4cg<Tx, Rx> {
        A4cg {
            tx,
            rx,
            decoder: FrameDecoder::new(),
            mode: Mode::Active,
        }
    }

    /// Non-blocking poll: consume at most one byte from the transport.
    ///
    /// Returns `Ok(())` and writes `*data` only when that byte completed a
    /// checksum-validated frame. `WouldBlock` means no byte was available or
    /// the frame is still in flight; call again. Discarded frames (bad
    /// checksum, unknown length) are logged and collapse to `WouldBlock`,
    /// so a corrupt frame just means waiting for the next one.
    pub fn read(&mut self, data: &mut Reading) -> nb::Result<(), Rx::Error> {
        let byte = self.rx.read()?;
        match self.decoder.push(byte) {
            Step::Complete(reading) => {
                trace!("frame complete: {:?}", reading);
                *data = reading;
                Ok(())
            }
            Step::Discarded(e) => {
                debug!("frame discarded: {:?}", e);
                Err(nb::Error::WouldBlock)
            }
            Step::Pending => Err(nb::Error::WouldBlock),
        }
    }

    /// Blocking poll with a deadline.
    ///
    /// Polls [`read`](A4cg::read) until a frame lands or `timeout_ms`
    /// milliseconds have elapsed on `clock`. Always polls at least once, so
    /// a zero timeout still drains a byte that is already waiting. This is a
    /// bounded spin; callers on a cooperative runtime that need to yield
    /// between bytes should drive `read` from their own loop instead.
    pub fn read_until<C: Clock>(
        &mut self,
        clock: &mut C,
        data: &mut Reading,
        timeout_ms: u32,
    ) -> Result<(), Error<Rx::Error>> {
        let start = clock.now_millis();
        loop {
            match self.read(data) {
                Ok(()) => return Ok(()),
                Err(nb::Error::WouldBlock) => {}
                Err(nb::Error::Other(e)) => return Err(Error::Serial(e)),
            }
            if clock.now_millis().wrapping_sub(start) >= timeout_ms {
                return Err(Error::Timeout);
            }
        }
    }

    /// Put the sensor into low-power standby.
    pub fn sleep(&mut self) -> Result<(), Tx::Error> {
        debug!("entering standby");
        self.send(&command::SLEEP)
    }

    /// Wake the sensor from standby.
    ///
    /// Wait [`STEADY_RESPONSE_MS`](A4cg::STEADY_RESPONSE_MS) before trusting
    /// readings.
    pub fn wake_up(&mut self) -> Result<(), Tx::Error> {
        debug!("waking up");
        self.send(&command::WAKE)
    }

    /// Switch the sensor to active reporting, its power-on default.
    pub fn active_mode(&mut self) -> Result<(), Tx::Error> {
        debug!("switching to active mode");
        self.send(&command::ACTIVE_MODE)?;
        self.mode = Mode::Active;
        Ok(())
    }

    /// Switch the sensor to passive, request-driven reporting.
    pub fn passive_mode(&mut self) -> Result<(), Tx::Error> {
        debug!("switching to passive mode");
        self.send(&command::PASSIVE_MODE)?;
        self.mode = Mode::Passive;
        Ok(())
    }

    /// Ask for one measurement frame. Does nothing unless the last mode
    /// switch was to passive; the reply is picked up by a later
    /// [`read`](A4cg::read) or [`read_until`](A4cg::read_until).
    pub fn request_read(&mut self) -> Result<(), Tx::Error> {
        if self.mode == Mode::Passive {
            debug!("requesting read");
            self.send(&command::REQUEST_READ)?;
        }
        Ok(())
    }

    /// The reporting mode last requested from the sensor.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Release the transport halves.
    pub fn free(self) -> (Tx, Rx) {
        (self.tx, self.rx)
    }

    fn send(&mut self, frame: &[u8; command::LEN]) -> Result<(), Tx::Error> {
        for &b in frame {
            nb::block!(self.tx.write(b))?;
        }
        nb::block!(self.tx.flush())
    }
}
