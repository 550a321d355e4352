//! Property-based tests for the MIDI parser and touch debouncer.

use picotouch_platform::{MidiMessage, MidiParser, TouchDebouncer};
use proptest::prelude::*;

fn message() -> impl Strategy<Value = MidiMessage> {
    prop_oneof![
        (0u8..16, 0u8..128, 1u8..128).prop_map(|(channel, note, velocity)| {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            }
        }),
        (0u8..16, 0u8..128, 0u8..128).prop_map(|(channel, note, velocity)| {
            MidiMessage::NoteOff {
                channel,
                note,
                velocity,
            }
        }),
        (0u8..16, 0u8..128, 0u8..128).prop_map(|(channel, control, value)| {
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            }
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn realtime_bytes_do_not_disturb_parsing(
        messages in prop::collection::vec(message(), 1..20),
        noise in prop::collection::vec((any::<usize>(), 0xF8u8..=0xFF), 0..20),
    ) {
        let mut bytes = Vec::new();
        for msg in &messages {
            let mut buf = [0u8; 3];
            let n = msg.encode(&mut buf);
            bytes.extend_from_slice(&buf[..n]);
        }
        for (pos, byte) in noise {
            let at = pos % (bytes.len() + 1);
            bytes.insert(at, byte);
        }

        let mut parser = MidiParser::new();
        let parsed: Vec<MidiMessage> = bytes.iter().filter_map(|&b| parser.push(b)).collect();
        prop_assert_eq!(parsed, messages);
    }

    #[test]
    fn debouncer_edges_alternate(
        samples in prop::collection::vec(any::<bool>(), 0..200),
        confirmation in 1u8..5,
    ) {
        let mut touch = TouchDebouncer::new(1).with_confirmation(confirmation);
        let mut expect_press = true;
        let mut edges = 0usize;
        let mut changes = 0usize;
        let mut previous = false;
        for &sample in &samples {
            if sample != previous {
                changes += 1;
                previous = sample;
            }
            for event in touch.poll(&[sample]) {
                prop_assert_eq!(event.pressed, expect_press);
                expect_press = !expect_press;
                edges += 1;
            }
        }
        // Every edge needs at least one input change behind it
        prop_assert!(edges <= changes);
        prop_assert_eq!(touch.is_pressed(0), !expect_press);
    }
}
