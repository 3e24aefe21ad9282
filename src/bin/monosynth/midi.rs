//! MIDI keyboard input, forwarded to the engine alongside the computer keys.

use color_eyre::eyre::{eyre, Result as EyreResult};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiInputPort};
use monosynth::io::{midi_to_synth, MidiEvent};
use tracing::{info, warn};

use crate::keyboard::{lock, SharedHandle};

const CLIENT_NAME: &str = "monosynth";

/// Which port to listen on and which channel to follow.
#[derive(Debug, Clone)]
pub struct MidiSource {
    /// Case-insensitive part of the port name.
    pub port: String,
    /// 1-based, as printed on hardware.
    pub channel: u8,
}

/// Open the first port whose name contains `source.port`. Messages keep
/// flowing until the returned connection is dropped.
pub fn connect(source: &MidiSource, handle: SharedHandle) -> EyreResult<MidiInputConnection<()>> {
    let mut input =
        MidiInput::new(CLIENT_NAME).map_err(|err| eyre!("failed to open MIDI input: {err}"))?;
    input.ignore(Ignore::All);

    let (port, name) = find_port(&input, &source.port)?;
    let channel = source.channel.saturating_sub(1);
    info!(port = %name, channel = source.channel, "MIDI input connected");

    input
        .connect(
            &port,
            "monosynth-in",
            move |_stamp, bytes, _| deliver(bytes, channel, &handle),
            (),
        )
        .map_err(|err| eyre!("failed to connect to MIDI port {name}: {err}"))
}

fn find_port(input: &MidiInput, wanted: &str) -> EyreResult<(MidiInputPort, String)> {
    let wanted = wanted.to_lowercase();
    let mut names = Vec::new();
    for port in input.ports() {
        let Ok(name) = input.port_name(&port) else {
            continue;
        };
        if name.to_lowercase().contains(&wanted) {
            return Ok((port, name));
        }
        names.push(name);
    }

    if names.is_empty() {
        Err(eyre!("no MIDI input ports found"))
    } else {
        Err(eyre!(
            "no MIDI input port matches \"{wanted}\" (available: {})",
            names.join(", ")
        ))
    }
}

/// Parse one raw message and send it on if it is meant for `channel` (0-based).
fn deliver(bytes: &[u8], channel: u8, handle: &SharedHandle) {
    let Some(msg) = MidiEvent::parse(bytes).and_then(|event| midi_to_synth(event, channel)) else {
        return;
    };
    if let Err(err) = lock(handle).send(msg) {
        warn!(%err, ?msg, "MIDI message dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monosynth::{synth::channel, SynthConfig};
    use std::sync::{Arc, Mutex};

    #[test]
    fn bytes_reach_the_engine() {
        let (handle, mut synth) = channel(&SynthConfig::default()).unwrap();
        let handle = Arc::new(Mutex::new(handle));
        let mut out = vec![0.0; 64];

        deliver(&[0x90, 69, 100], 0, &handle);
        synth.render_block(&mut out);
        let playing = synth.voice().map(|v| v.frequency());
        assert!(playing.is_some_and(|hz| (hz - 440.0).abs() < 1e-3));

        // other channels and unsupported messages are ignored
        deliver(&[0x93, 81, 100], 0, &handle);
        deliver(&[0xF8], 0, &handle);
        synth.render_block(&mut out);
        let playing = synth.voice().map(|v| v.frequency());
        assert!(playing.is_some_and(|hz| (hz - 440.0).abs() < 1e-3));

        deliver(&[0xB0, 123, 0], 0, &handle);
        synth.render_block(&mut out);
        assert!(synth.voice().is_none());
    }
}
