//! Shared control-surface state: pads, LEDs, MIDI ports and octave.

use picotouch_platform::{
    LED_COUNT, LedBuffer, MidiMessage, MidiPort, MidiTransport, ModePad, PAD_COUNT,
    TouchDebouncer, TouchEvent, TouchInput, broadcast,
};

/// Most bytes read from one MIDI port per receive call.
pub const MIDI_BYTES_PER_RECEIVE: usize = 16;

/// Base-note window moved by the octave pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Octave {
    base: u8,
    home: u8,
    min: u8,
    max: u8,
}

impl Octave {
    /// Window starting at `home`, limited to `min..=max`.
    pub fn new(home: u8, min: u8, max: u8) -> Self {
        let home = home.clamp(min, max.max(min));
        Self {
            base: home,
            home,
            min,
            max: max.max(min),
        }
    }

    /// Note of pad 0.
    pub fn base(&self) -> u8 {
        self.base
    }

    /// Starting base note.
    pub fn home(&self) -> u8 {
        self.home
    }

    /// Whole octaves away from home, negative below.
    pub fn offset(&self) -> i32 {
        (i32::from(self.base) - i32::from(self.home)).div_euclid(12)
    }

    /// Note played by `pad`, if it is a valid MIDI note.
    pub fn note_for(&self, pad: usize) -> Option<u8> {
        u8::try_from(usize::from(self.base) + pad)
            .ok()
            .filter(|&n| n <= 127)
    }

    /// Pad playing `note` at the current base, if any.
    pub fn pad_for(&self, note: u8) -> Option<usize> {
        note.checked_sub(self.base).map(usize::from)
    }

    /// One octave down, stopping at the minimum. Returns true if it moved.
    pub fn down(&mut self) -> bool {
        let next = self.base.saturating_sub(12).max(self.min);
        let moved = next != self.base;
        self.base = next;
        moved
    }

    /// One octave up, stopping at the maximum. Returns true if it moved.
    pub fn up(&mut self) -> bool {
        let next = self.base.saturating_add(12).min(self.max);
        let moved = next != self.base;
        self.base = next;
        moved
    }

    /// Applies an octave mode pad. Other pads are ignored.
    pub fn shift(&mut self, pad: ModePad) -> bool {
        match pad {
            ModePad::OctaveDown => self.down(),
            ModePad::OctaveUp => self.up(),
            _ => false,
        }
    }
}

/// Boxed transport as stored by [`Surface`].
pub type Port = MidiPort<Box<dyn MidiTransport>>;

/// Pads, LEDs, MIDI and octave shared by every device mode.
pub struct Surface {
    touch: TouchDebouncer,
    samples: [bool; PAD_COUNT],
    held: [bool; PAD_COUNT],
    leds: LedBuffer,
    ports: Vec<Port>,
    next_port: usize,
    octave: Octave,
}

impl Surface {
    /// Surface with no MIDI ports.
    pub fn new(octave: Octave, touch_confirmation: u8) -> Self {
        Self {
            touch: TouchDebouncer::new(PAD_COUNT).with_confirmation(touch_confirmation),
            samples: [false; PAD_COUNT],
            held: [false; PAD_COUNT],
            leds: LedBuffer::new(LED_COUNT),
            ports: Vec::new(),
            next_port: 0,
            octave,
        }
    }

    /// Adds a MIDI port. Outbound messages go to every port.
    pub fn add_port(&mut self, transport: Box<dyn MidiTransport>) {
        tracing::debug!(port = transport.name(), "midi port added");
        self.ports.push(MidiPort::new(transport));
    }

    /// Number of MIDI ports.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Samples `input` and returns the confirmed press/release edges.
    pub fn scan(&mut self, input: &mut dyn TouchInput) -> Vec<TouchEvent> {
        input.sample(&mut self.samples);
        let events = self.touch.poll(&self.samples);
        for event in &events {
            if let Some(held) = self.held.get_mut(event.pad) {
                *held = event.pressed;
            }
        }
        events
    }

    /// True while `pad` is held.
    pub fn is_held(&self, pad: usize) -> bool {
        self.held.get(pad).copied().unwrap_or(false)
    }

    /// Held pads in pad order.
    pub fn held_pads(&self) -> impl Iterator<Item = usize> + '_ {
        self.held
            .iter()
            .enumerate()
            .filter_map(|(pad, &held)| held.then_some(pad))
    }

    /// LED frame buffer.
    pub fn leds(&self) -> &LedBuffer {
        &self.leds
    }

    /// LED frame buffer, mutably.
    pub fn leds_mut(&mut self) -> &mut LedBuffer {
        &mut self.leds
    }

    /// Octave window.
    pub fn octave(&self) -> &Octave {
        &self.octave
    }

    /// Octave window, mutably.
    pub fn octave_mut(&mut self) -> &mut Octave {
        &mut self.octave
    }

    /// Sends `message` on every port. Returns how many accepted it.
    pub fn send(&mut self, message: &MidiMessage) -> usize {
        broadcast(&mut self.ports, message)
    }

    /// Next inbound message. Each call starts from the port after the one
    /// that last delivered, so a busy port cannot starve the others.
    pub fn receive(&mut self) -> Option<MidiMessage> {
        let count = self.ports.len();
        for offset in 0..count {
            let index = (self.next_port + offset) % count;
            if let Some(message) = self.ports[index].receive(MIDI_BYTES_PER_RECEIVE) {
                self.next_port = (index + 1) % count;
                return Some(message);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use picotouch_platform::MemoryTransport;

    struct Pads([bool; PAD_COUNT]);

    impl TouchInput for Pads {
        fn pad_count(&self) -> usize {
            PAD_COUNT
        }

        fn sample(&mut self, out: &mut [bool]) {
            out.copy_from_slice(&self.0);
        }
    }

    #[test]
    fn test_octave_limits() {
        let mut octave = Octave::new(36, 12, 84);
        assert!(octave.down());
        assert!(octave.down());
        assert_eq!(octave.base(), 12);
        assert!(!octave.down());
        assert_eq!(octave.offset(), -2);

        for _ in 0..10 {
            octave.up();
        }
        assert_eq!(octave.base(), 84);
        assert_eq!(octave.offset(), 4);
    }

    #[test]
    fn test_octave_floor_at_zero() {
        let mut octave = Octave::new(24, 0, 60);
        octave.down();
        octave.down();
        assert_eq!(octave.base(), 0);
        assert_eq!(octave.offset(), -2);
        assert_eq!(octave.pad_for(5), Some(5));
        assert!(octave.shift(ModePad::OctaveUp));
        assert!(!octave.shift(ModePad::PatchA));
        assert_eq!(octave.base(), 12);
    }

    #[test]
    fn test_octave_notes() {
        let octave = Octave::new(36, 12, 84);
        assert_eq!(octave.note_for(4), Some(40));
        assert_eq!(octave.pad_for(40), Some(4));
        assert_eq!(octave.pad_for(30), None);
        assert_eq!(Octave::new(120, 0, 127).note_for(16), None);
    }

    #[test]
    fn test_scan_tracks_held() {
        let mut surface = Surface::new(Octave::new(36, 12, 84), 1);
        let mut pads = Pads([false; PAD_COUNT]);
        pads.0[3] = true;
        pads.0[7] = true;

        let events = surface.scan(&mut pads);
        assert_eq!(events, vec![TouchEvent::press(3), TouchEvent::press(7)]);
        assert_eq!(surface.held_pads().collect::<Vec<_>>(), [3, 7]);

        pads.0[3] = false;
        surface.scan(&mut pads);
        assert!(!surface.is_held(3));
        assert!(surface.is_held(7));
        assert!(!surface.is_held(99));
    }

    #[test]
    fn test_midi_in_and_out() {
        let mut surface = Surface::new(Octave::new(36, 12, 84), 1);
        let mut serial = MemoryTransport::new("serial");
        serial.inject_message(&MidiMessage::note_on(60, 90));
        surface.add_port(Box::new(serial));
        let mut usb = MemoryTransport::new("usb");
        usb.set_connected(false);
        surface.add_port(Box::new(usb));

        assert_eq!(surface.receive(), Some(MidiMessage::note_on(60, 90)));
        assert_eq!(surface.receive(), None);
        assert_eq!(surface.send(&MidiMessage::note_off(60, 0)), 1);
    }

    #[test]
    fn test_receive_alternates_busy_ports() {
        let mut surface = Surface::new(Octave::new(36, 12, 84), 1);
        let mut serial = MemoryTransport::new("serial");
        for note in 60..70 {
            serial.inject_message(&MidiMessage::note_on(note, 90));
        }
        surface.add_port(Box::new(serial));
        let mut usb = MemoryTransport::new("usb");
        usb.inject_message(&MidiMessage::note_on(40, 90));
        surface.add_port(Box::new(usb));

        assert_eq!(surface.receive(), Some(MidiMessage::note_on(60, 90)));
        assert_eq!(surface.receive(), Some(MidiMessage::note_on(40, 90)));
        assert_eq!(surface.receive(), Some(MidiMessage::note_on(61, 90)));
        // usb is drained; serial keeps delivering
        assert_eq!(surface.receive(), Some(MidiMessage::note_on(62, 90)));
    }
}
