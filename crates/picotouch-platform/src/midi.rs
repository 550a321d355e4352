//! MIDI channel-voice messages, byte parser, and transports.
//!
//! The device talks MIDI over two links at once (31250-baud serial and USB).
//! Both are polled for input and every outbound message is sent on both;
//! see [`broadcast`].
//!
//! [`MidiParser`] handles running status, skips system real-time bytes
//! (`0xF8..=0xFF`) wherever they appear, and discards system-exclusive data.
//! A Note-On with velocity 0 is reported as a Note-Off.

use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;

/// A decoded channel-voice MIDI message.
///
/// Channels are 0-based (0 - 15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    /// Key released.
    NoteOff {
        /// Channel (0 - 15).
        channel: u8,
        /// Note number (0 - 127).
        note: u8,
        /// Release velocity (0 - 127).
        velocity: u8,
    },
    /// Key pressed with non-zero velocity.
    NoteOn {
        /// Channel (0 - 15).
        channel: u8,
        /// Note number (0 - 127).
        note: u8,
        /// Velocity (1 - 127).
        velocity: u8,
    },
    /// Controller change.
    ControlChange {
        /// Channel (0 - 15).
        channel: u8,
        /// Controller number (0 - 127).
        control: u8,
        /// Controller value (0 - 127).
        value: u8,
    },
    /// Program change.
    ProgramChange {
        /// Channel (0 - 15).
        channel: u8,
        /// Program number (0 - 127).
        program: u8,
    },
    /// Pitch bend, 14-bit with 8192 at centre.
    PitchBend {
        /// Channel (0 - 15).
        channel: u8,
        /// Bend amount (0 - 16383).
        value: u16,
    },
}

impl MidiMessage {
    /// Note-On on channel 0. Velocity 0 yields a Note-Off.
    pub const fn note_on(note: u8, velocity: u8) -> Self {
        if velocity == 0 {
            Self::note_off(note, 0)
        } else {
            Self::NoteOn {
                channel: 0,
                note: note & 0x7F,
                velocity: velocity & 0x7F,
            }
        }
    }

    /// Note-Off on channel 0.
    pub const fn note_off(note: u8, velocity: u8) -> Self {
        Self::NoteOff {
            channel: 0,
            note: note & 0x7F,
            velocity: velocity & 0x7F,
        }
    }

    /// Encodes into `buf`, returning the number of bytes used (2 or 3).
    ///
    /// Always writes a status byte; running status is not used on output.
    pub fn encode(&self, buf: &mut [u8; 3]) -> usize {
        match *self {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            } => {
                *buf = [0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F];
                3
            }
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => {
                *buf = [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F];
                3
            }
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            } => {
                *buf = [0xB0 | (channel & 0x0F), control & 0x7F, value & 0x7F];
                3
            }
            MidiMessage::ProgramChange { channel, program } => {
                buf[0] = 0xC0 | (channel & 0x0F);
                buf[1] = program & 0x7F;
                2
            }
            MidiMessage::PitchBend { channel, value } => {
                *buf = [
                    0xE0 | (channel & 0x0F),
                    (value & 0x7F) as u8,
                    ((value >> 7) & 0x7F) as u8,
                ];
                3
            }
        }
    }
}

/// Number of data bytes that follow a channel status byte.
const fn data_len(status: u8) -> usize {
    match status & 0xF0 {
        0xC0 | 0xD0 => 1,
        _ => 2,
    }
}

/// Incremental MIDI byte-stream parser.
///
/// # Example
///
/// ```rust
/// use picotouch_platform::{MidiMessage, MidiParser};
///
/// let mut parser = MidiParser::new();
/// // Note-On, then a second note using running status, then velocity 0
/// let bytes = [0x90, 60, 100, 64, 90, 60, 0];
/// let messages: Vec<_> = bytes.iter().filter_map(|&b| parser.push(b)).collect();
///
/// assert_eq!(messages, vec![
///     MidiMessage::NoteOn { channel: 0, note: 60, velocity: 100 },
///     MidiMessage::NoteOn { channel: 0, note: 64, velocity: 90 },
///     MidiMessage::NoteOff { channel: 0, note: 60, velocity: 0 },
/// ]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MidiParser {
    running_status: Option<u8>,
    data: [u8; 2],
    len: usize,
    in_sysex: bool,
}

impl MidiParser {
    /// Creates a parser with no running status.
    pub const fn new() -> Self {
        Self {
            running_status: None,
            data: [0; 2],
            len: 0,
            in_sysex: false,
        }
    }

    /// Forget running status and any partial message.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Feed one byte; returns a message when one completes.
    pub fn push(&mut self, byte: u8) -> Option<MidiMessage> {
        match byte {
            // System real-time: may interleave anything, never changes state
            0xF8..=0xFF => None,
            0xF0 => {
                self.in_sysex = true;
                self.running_status = None;
                self.len = 0;
                None
            }
            0xF7 => {
                self.in_sysex = false;
                None
            }
            // System common cancels running status; its data is dropped
            0xF1..=0xF6 => {
                self.in_sysex = false;
                self.running_status = None;
                self.len = 0;
                None
            }
            0x80..=0xEF => {
                self.in_sysex = false;
                self.running_status = Some(byte);
                self.len = 0;
                None
            }
            _ => {
                if self.in_sysex {
                    return None;
                }
                let status = self.running_status?;
                self.data[self.len] = byte;
                self.len += 1;
                if self.len < data_len(status) {
                    return None;
                }
                self.len = 0;
                Self::decode(status, self.data)
            }
        }
    }

    fn decode(status: u8, data: [u8; 2]) -> Option<MidiMessage> {
        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data[0],
                velocity: data[1],
            }),
            0x90 if data[1] == 0 => Some(MidiMessage::NoteOff {
                channel,
                note: data[0],
                velocity: 0,
            }),
            0x90 => Some(MidiMessage::NoteOn {
                channel,
                note: data[0],
                velocity: data[1],
            }),
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                control: data[0],
                value: data[1],
            }),
            0xC0 => Some(MidiMessage::ProgramChange {
                channel,
                program: data[0],
            }),
            0xE0 => Some(MidiMessage::PitchBend {
                channel,
                value: u16::from(data[0]) | (u16::from(data[1]) << 7),
            }),
            // Aftertouch is parsed for framing but not reported
            _ => None,
        }
    }
}

/// Transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The link is not connected (e.g. USB host absent).
    #[error("MIDI transport disconnected")]
    Disconnected,
    /// The outbound buffer had no room for the message.
    #[error("MIDI transport buffer full")]
    BufferFull,
}

/// A byte-oriented MIDI link.
pub trait MidiTransport {
    /// Short name for logs (e.g. `"uart"`, `"usb"`).
    fn name(&self) -> &str;

    /// Next received byte, or `None` if nothing is pending.
    fn read_byte(&mut self) -> Option<u8>;

    /// Send `bytes` as one unit.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}

impl<T: MidiTransport + ?Sized> MidiTransport for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_byte(&mut self) -> Option<u8> {
        (**self).read_byte()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }
}

/// A transport plus its parser.
///
/// Each transport needs its own parser since running status is per link.
#[derive(Debug)]
pub struct MidiPort<T> {
    transport: T,
    parser: MidiParser,
}

impl<T: MidiTransport> MidiPort<T> {
    /// Wraps `transport` with a fresh parser.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            parser: MidiParser::new(),
        }
    }

    /// Reads pending bytes until a message completes, at most `max_bytes`.
    ///
    /// The byte limit bounds the work done per scheduler pass.
    pub fn receive(&mut self, max_bytes: usize) -> Option<MidiMessage> {
        for _ in 0..max_bytes {
            let byte = self.transport.read_byte()?;
            if let Some(message) = self.parser.push(byte) {
                return Some(message);
            }
        }
        None
    }

    /// Encodes and sends `message` on this port.
    pub fn send(&mut self, message: &MidiMessage) -> Result<(), TransportError> {
        let mut buf = [0u8; 3];
        let len = message.encode(&mut buf);
        self.transport.write(&buf[..len])
    }

    /// The wrapped transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The wrapped transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Sends `message` on every port, continuing past failures.
///
/// Returns the number of ports that accepted it. Failures are logged.
pub fn broadcast<T: MidiTransport>(ports: &mut [MidiPort<T>], message: &MidiMessage) -> usize {
    let mut sent = 0;
    for port in ports.iter_mut() {
        match port.send(message) {
            Ok(()) => sent += 1,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(port = port.transport().name(), error = %_err, "midi send failed");
            }
        }
    }
    sent
}

/// In-memory transport for tests and the host simulator.
///
/// Inbound bytes are queued with [`inject`](Self::inject); outbound bytes
/// collect in [`sent`](Self::sent).
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    name: &'static str,
    inbound: VecDeque<u8>,
    sent: Vec<u8>,
    connected: bool,
}

impl MemoryTransport {
    /// Creates a connected, empty transport.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inbound: VecDeque::new(),
            sent: Vec::new(),
            connected: true,
        }
    }

    /// Queue bytes to be read.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Queue an encoded message to be read.
    pub fn inject_message(&mut self, message: &MidiMessage) {
        let mut buf = [0u8; 3];
        let len = message.encode(&mut buf);
        self.inject(&buf[..len]);
    }

    /// Bytes written so far.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Simulate plugging or unplugging the link.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl MidiTransport for MemoryTransport {
    fn name(&self) -> &str {
        self.name
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.inbound.pop_front()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        self.sent.extend_from_slice(bytes);
        Ok(())
    }
}
