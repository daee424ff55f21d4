//! Native demo: registers a decaying-sine unit, runs the construction
//! handshake, and plays until the unit retires itself.
//!
//! Usage: `demo [config.json]` with the optional file deserializing into
//! `HostConfig`.

use std::env;
use std::f32::consts::TAU;
use std::fs;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use worklet_host::bridge::{InitPayload, RenderBridge};
use worklet_host::host::{AudioHost, HostConfig};
use worklet_host::registry;
use worklet_host::traits::RenderUnit;

struct DecayingSine {
    phase: f32,
    step: f32,
    amplitude: f32,
    decay: f32,
}

impl DecayingSine {
    fn new(frequency: f32, sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            step: TAU * frequency / sample_rate,
            amplitude: 1.0,
            // ~4 seconds to inaudible at 48 kHz
            decay: 0.99995,
        }
    }
}

impl RenderUnit for DecayingSine {
    fn render(&mut self, output: &mut [f32]) -> bool {
        for sample in output.iter_mut() {
            *sample = self.phase.sin() * self.amplitude;
            self.phase = (self.phase + self.step) % TAU;
            self.amplitude *= self.decay;
        }
        self.amplitude > 1e-4
    }
}

fn main() -> anyhow::Result<()> {
    let config: HostConfig = match env::args().nth(1) {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("failed to parse config {path}"))?
        }
        None => HostConfig::default(),
    };

    let unit = Box::new(DecayingSine::new(220.0, config.sample_rate as f32));
    let handle = registry::register(unit);

    // Same handshake the worklet path performs; natively there is no
    // separate module or memory to attach.
    let payload = InitPayload {
        module: (),
        memory: (),
        handle,
    };
    let bridge = RenderBridge::construct_with_quantum(payload, |_, _| Ok(()), config.block_size)?;

    let host = AudioHost::start(bridge, &config)?;
    println!("=== AUDIO CONFIGURATION ===");
    println!("Channels: {}", host.channels());
    println!("Sample rate: {} Hz", host.sample_rate());
    println!("Block size: {} frames", config.block_size);
    println!("Playing 220 Hz decaying sine...");

    thread::sleep(Duration::from_secs(5));
    Ok(())
}
