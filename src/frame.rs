use heapless::Vec;

/// First byte of every response frame.
const START_1: u8 = 0x32;
/// Second byte of every response frame.
const START_2: u8 = 0x3D;

/// Frame length declared by the 5-field legacy sensor variant.
const FRAME_LEN_SHORT: u16 = 2 * 5 + 2;
/// Frame length declared by the 13-field sensor variant.
const FRAME_LEN_LONG: u16 = 2 * 13 + 2;

/// Only the first 18 payload bytes carry the fields we extract. Frames may
/// declare more; the extra bytes still count toward the checksum.
pub const PAYLOAD_CAPACITY: usize = 18;

/// One decoded measurement frame.
///
/// Mass concentrations follow the sensor convention of µg/m³ ×10 and are not
/// rescaled here. Particle counts are per 0.1 L of air.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reading {
    /// Mass concentration PM1.0, standard particles CF=1.
    pub pm1_0: u16,
    /// Mass concentration PM2.5, standard particles CF=1.
    pub pm2_5: u16,
    /// Mass concentration PM10.0, standard particles CF=1.
    pub pm10_0: u16,
    /// Particles with diameter > 0.3 µm.
    pub particles_0_3: u16,
    /// Particles with diameter > 0.5 µm.
    pub particles_0_5: u16,
    /// Particles with diameter > 1.0 µm.
    pub particles_1_0: u16,
    /// Particles with diameter > 2.5 µm.
    pub particles_2_5: u16,
    /// Particles with diameter > 5.0 µm.
    pub particles_5_0: u16,
    /// Particles with diameter > 10.0 µm.
    pub particles_10_0: u16,
}

/// Why an in-flight frame was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The trailing checksum did not match the running sum of the frame.
    ChecksumMismatch { calculated: u16, received: u16 },
    /// The length field named a frame size no known sensor variant emits.
    UnsupportedLength { length: u16 },
}

/// Outcome of feeding one byte to the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Mid-frame, or between frames. More bytes needed.
    Pending,
    /// A frame completed and passed validation on this byte.
    Complete(Reading),
    /// A frame was abandoned on this byte; the decoder is resynchronising.
    Discarded(FrameError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start1,
    Start2,
    LenHigh,
    LenLow { high: u8 },
    Payload { remaining: u16 },
    ChecksumHigh,
    ChecksumLow { high: u8 },
}

/// Incremental decoder for A4CG response frames.
///
/// Consumes one byte per [`push`](FrameDecoder::push) call and never blocks,
/// so a caller can drive it from any polling strategy and abandon a read at
/// any point. State is durable across calls; a stalled frame resumes when
/// more bytes arrive.
///
/// Resynchronisation drops exactly one byte at a time and waits for the next
/// start marker to line up on its own. The sensor streams frames at a fixed
/// rate, so a transient desync heals within one frame period.
#[derive(Debug)]
pub struct FrameDecoder {
    state: State,
    sum: u16,
    payload: Vec<u8, PAYLOAD_CAPACITY>,
}

impl FrameDecoder {
    pub const fn new() -> FrameDecoder {
        FrameDecoder {
            state: State::Start1,
            sum: 0,
            payload: Vec::new(),
        }
    }

    /// Feed one byte from the wire.
    ///
    /// A [`Reading`] is only ever produced after the trailing checksum has
    /// been verified against the running sum; a partial or corrupt frame can
    /// never leak half-written values.
    pub fn push(&mut self, byte: u8) -> Step {
        match self.state {
            State::Start1 => {
                // Noise between frames is expected; drop it quietly.
                if byte == START_1 {
                    self.sum = byte as u16;
                    self.state = State::Start2;
                }
                Step::Pending
            }
            State::Start2 => {
                if byte == START_2 {
                    self.sum = self.sum.wrapping_add(byte as u16);
                    self.state = State::LenHigh;
                } else {
                    self.state = State::Start1;
                }
                Step::Pending
            }
            State::LenHigh => {
                self.sum = self.sum.wrapping_add(byte as u16);
                self.state = State::LenLow { high: byte };
                Step::Pending
            }
            State::LenLow { high } => {
                let length = u16::from_be_bytes([high, byte]);
                if length != FRAME_LEN_SHORT && length != FRAME_LEN_LONG {
                    self.state = State::Start1;
                    return Step::Discarded(FrameError::UnsupportedLength { length });
                }
                self.sum = self.sum.wrapping_add(byte as u16);
                self.payload.clear();
                // The length field counts the payload plus the two checksum
                // bytes that follow it.
                self.state = State::Payload {
                    remaining: length - 2,
                };
                Step::Pending
            }
            State::Payload { remaining } => {
                self.sum = self.sum.wrapping_add(byte as u16);
                // Bytes past the 18 significant ones are summed but not kept.
                let _ = self.payload.push(byte);
                self.state = if remaining == 1 {
                    State::ChecksumHigh
                } else {
                    State::Payload {
                        remaining: remaining - 1,
                    }
                };
                Step::Pending
            }
            State::ChecksumHigh => {
                self.state = State::ChecksumLow { high: byte };
                Step::Pending
            }
            State::ChecksumLow { high } => {
                let received = u16::from_be_bytes([high, byte]);
                self.state = State::Start1;
                if received == self.sum {
                    Step::Complete(self.extract())
                } else {
                    Step::Discarded(FrameError::ChecksumMismatch {
                        calculated: self.sum,
                        received,
                    })
                }
            }
        }
    }

    /// Forget any in-flight frame and wait for the next start marker.
    pub fn reset(&mut self) {
        self.state = State::Start1;
        self.payload.clear();
    }

    // Fields the short legacy variant never sends decode as zero.
    fn extract(&self) -> Reading {
        let mut buf = [0u8; PAYLOAD_CAPACITY];
        buf[..self.payload.len()].copy_from_slice(&self.payload);
        let word = |i: usize| u16::from_be_bytes([buf[i], buf[i + 1]]);
        Reading {
            pm1_0: word(0),
            pm2_5: word(2),
            pm10_0: word(4),
            particles_0_3: word(6),
            particles_0_5: word(8),
            particles_1_0: word(10),
            particles_2_5: word(12),
            particles_5_0: word(14),
            particles_10_0: word(16),
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> FrameDecoder {
        FrameDecoder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wrap 18 significant payload bytes into a full 13-field frame,
    /// padding the reserved tail and appending the correct checksum.
    fn long_frame(significant: &[u8; 18]) -> std::vec::Vec<u8> {
        let mut frame = vec![START_1, START_2, 0x00, FRAME_LEN_LONG as u8];
        frame.extend_from_slice(significant);
        frame.extend_from_slice(&[0u8; 8]);
        let sum: u16 = frame.iter().fold(0u16, |s, &b| s.wrapping_add(b as u16));
        frame.extend_from_slice(&sum.to_be_bytes());
        frame
    }

    fn decode_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Option<Reading> {
        let mut out = None;
        for &b in bytes {
            if let Step::Complete(reading) = decoder.push(b) {
                assert!(out.is_none(), "more than one frame completed");
                out = Some(reading);
            }
        }
        out
    }

    #[test]
    fn decodes_thirteen_field_frame() {
        let frame = long_frame(&[
            0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05, 0x00, 0x06, 0x00, 0x07,
            0x00, 0x08, 0x00, 0x09,
        ]);
        let mut decoder = FrameDecoder::new();
        let reading = decode_all(&mut decoder, &frame).expect("frame should decode");
        assert_eq!(
            reading,
            Reading {
                pm1_0: 1,
                pm2_5: 2,
                pm10_0: 3,
                particles_0_3: 4,
                particles_0_5: 5,
                particles_1_0: 6,
                particles_2_5: 7,
                particles_5_0: 8,
                particles_10_0: 9,
            }
        );
    }

    #[test]
    fn garbage_never_completes() {
        let mut decoder = FrameDecoder::new();
        for b in [0x00, 0xFF, 0x3D, 0x32, 0x00, 0x42, 0x4D, 0x1C] {
            assert!(!matches!(decoder.push(b), Step::Complete(_)));
        }
    }

    #[test]
    fn resyncs_after_one_garbage_byte() {
        let frame = long_frame(&[0xAB; 18]);
        let mut stream = vec![0x99];
        stream.extend_from_slice(&frame);
        let mut decoder = FrameDecoder::new();
        let reading = decode_all(&mut decoder, &stream).expect("frame should decode");
        assert_eq!(reading.pm1_0, 0xABAB);
        assert_eq!(reading.particles_10_0, 0xABAB);
    }

    #[test]
    fn altered_checksum_is_discarded() {
        let mut frame = long_frame(&[0x11; 18]);
        let last = frame.len() - 1;
        frame[last] = frame[last].wrapping_add(1);
        let mut decoder = FrameDecoder::new();
        let mut discarded = false;
        for &b in &frame {
            match decoder.push(b) {
                Step::Complete(_) => panic!("corrupt frame must not complete"),
                Step::Discarded(FrameError::ChecksumMismatch {
                    calculated,
                    received,
                }) => {
                    assert_eq!(received, calculated.wrapping_add(1));
                    discarded = true;
                }
                _ => {}
            }
        }
        assert!(discarded);
    }

    #[test]
    fn unsupported_length_resyncs() {
        let mut decoder = FrameDecoder::new();
        decoder.push(START_1);
        decoder.push(START_2);
        decoder.push(0x00);
        assert_eq!(
            decoder.push(0x10),
            Step::Discarded(FrameError::UnsupportedLength { length: 0x10 })
        );
        // The decoder is back at the start state and a valid frame goes
        // through untouched.
        let frame = long_frame(&[0x01; 18]);
        let reading = decode_all(&mut decoder, &frame).expect("frame should decode");
        assert_eq!(reading.pm2_5, 0x0101);
    }

    #[test]
    fn short_variant_decodes_missing_fields_as_zero() {
        // 5-field legacy frame: 10 payload bytes, length 12.
        let mut frame = vec![START_1, START_2, 0x00, FRAME_LEN_SHORT as u8];
        frame.extend_from_slice(&[0x00, 0x07, 0x00, 0x08, 0x00, 0x09, 0x00, 0x0A, 0x00, 0x0B]);
        let sum: u16 = frame.iter().fold(0u16, |s, &b| s.wrapping_add(b as u16));
        frame.extend_from_slice(&sum.to_be_bytes());
        let mut decoder = FrameDecoder::new();
        let reading = decode_all(&mut decoder, &frame).expect("frame should decode");
        assert_eq!(reading.pm1_0, 7);
        assert_eq!(reading.particles_0_5, 0);
        assert_eq!(reading.particles_10_0, 0);
    }

    #[test]
    fn back_to_back_frames_each_complete_once() {
        let first = long_frame(&[0x01; 18]);
        let second = long_frame(&[0x02; 18]);
        let mut decoder = FrameDecoder::new();
        assert_eq!(decode_all(&mut decoder, &first).unwrap().pm1_0, 0x0101);
        assert_eq!(decode_all(&mut decoder, &second).unwrap().pm1_0, 0x0202);
    }

    #[test]
    fn saturated_payload_decodes() {
        let frame = long_frame(&[0xFF; 18]);
        let mut decoder = FrameDecoder::new();
        let reading = decode_all(&mut decoder, &frame).expect("frame should decode");
        assert_eq!(reading.pm1_0, 0xFFFF);
        assert_eq!(reading.particles_10_0, 0xFFFF);
    }

    #[test]
    fn reset_abandons_partial_frame() {
        let frame = long_frame(&[0x05; 18]);
        let mut decoder = FrameDecoder::new();
        for &b in &frame[..10] {
            decoder.push(b);
        }
        decoder.reset();
        let reading = decode_all(&mut decoder, &frame).expect("frame should decode");
        assert_eq!(reading.pm10_0, 0x0505);
    }
}
