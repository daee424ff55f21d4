//! CPAL-based audio host for driving a render bridge natively.
//!
//! Mirrors what the browser's audio graph does for the worklet path: opens
//! an output device, then calls the bridge once per quantum from the
//! stream's real-time callback. Useful for development and for hosts that
//! ship the same unit natively.

use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Sample, SampleFormat, SizedSample, StreamConfig, SupportedBufferSize};
use dasp_sample::FromSample;
use serde::Deserialize;

use crate::bridge::{RenderBridge, RENDER_QUANTUM_FRAMES};

/// Configuration for the native audio host. Deserializable so host
/// binaries can load it from a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub sample_rate: u32,
    /// Frames per render quantum requested from the device. Must match the
    /// quantum the bridge was constructed with.
    pub block_size: usize,
    /// Linear output gain applied after the bridge.
    pub gain: f32,
    /// Preferred CPAL host name (e.g. "jack"); falls back to the platform
    /// default when absent or unavailable.
    pub preferred_host: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            block_size: RENDER_QUANTUM_FRAMES,
            gain: 0.2,
            preferred_host: None,
        }
    }
}

/// Owns the output stream driving one render bridge.
pub struct AudioHost {
    _stream: cpal::Stream,
    sample_rate: u32,
    channels: u16,
}

impl AudioHost {
    /// Opens an output device and starts rendering. The bridge's quantum
    /// size should equal `config.block_size`; the callback splits whatever
    /// block the device actually delivers into bridge-sized quanta.
    pub fn start(bridge: RenderBridge, config: &HostConfig) -> anyhow::Result<Self> {
        let host = select_host(config.preferred_host.as_deref());
        let device = host
            .default_output_device()
            .context("no default output device")?;
        let default_config = device
            .default_output_config()
            .context("no default output config")?;
        let sample_format = default_config.sample_format();

        let requested = config.block_size as u32;
        let buffer_size = match *default_config.buffer_size() {
            SupportedBufferSize::Range { min, max } if !(min..=max).contains(&requested) => {
                log::warn!(
                    "device cannot deliver {requested}-frame blocks (supports {min}..={max}); using its default"
                );
                BufferSize::Default
            }
            _ => BufferSize::Fixed(requested),
        };

        let stream_config = StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size,
        };

        let channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate.0;
        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, bridge, config.gain),
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, bridge, config.gain),
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, bridge, config.gain),
            other => anyhow::bail!("unsupported sample format {other:?}"),
        }?;
        stream.play().context("failed to start output stream")?;

        Ok(Self {
            _stream: stream,
            sample_rate,
            channels,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}

fn select_host(preferred: Option<&str>) -> cpal::Host {
    if let Some(name) = preferred {
        for id in cpal::available_hosts() {
            if id.name().eq_ignore_ascii_case(name) {
                match cpal::host_from_id(id) {
                    Ok(host) => return host,
                    Err(err) => {
                        log::warn!("failed to open host {name}: {err}; using default");
                        break;
                    }
                }
            }
        }
        log::warn!("preferred host {name} not available; using default");
    }
    cpal::default_host()
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut bridge: RenderBridge,
    gain: f32,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let quantum = bridge.quantum_frames();
    // Scratch quantum allocated here, before the stream starts; the
    // callback itself must stay allocation-free.
    let mut scratch = vec![0.0f32; quantum];
    let mut cursor = quantum;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            for frame in data.chunks_mut(channels) {
                if cursor == quantum {
                    bridge.render(&mut scratch);
                    cursor = 0;
                }
                let sample = T::from_sample(scratch[cursor] * gain);
                for out in frame.iter_mut() {
                    *out = sample;
                }
                cursor += 1;
            }
        },
        |err| log::error!("output stream error: {err}"),
        None,
    )?;
    Ok(stream)
}
