//! Audio output device (cpal)
//!
//! Opens the default output device and renders the shared mixer from the
//! device callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};

use super::AudioError;
use super::mixer::{Mixer, SharedMixer};
use crate::settings::AudioSettings;

/// A running output stream bound to a mixer
pub struct AudioOutput {
    /// Kept alive for the lifetime of the output
    stream: Stream,
    sample_rate: u32,
    channels: usize,
}

impl AudioOutput {
    /// Open the default output device and a mixer running at its rate
    pub fn open_default(settings: &AudioSettings) -> Result<(Self, SharedMixer), AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(AudioError::NoDevice)?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let sample_rate = config.sample_rate.0;
        let channels = config.channels as usize;
        let mixer = Mixer::new(sample_rate, settings.effective_gain(), settings.analysis_size).shared();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, mixer.clone())?,
            SampleFormat::I16 => build_stream::<i16>(&device, &config, mixer.clone())?,
            SampleFormat::U16 => build_stream::<u16>(&device, &config, mixer.clone())?,
            other => return Err(AudioError::UnsupportedFormat(format!("{other:?}"))),
        };
        stream.play()?;

        log::info!(
            "Audio: {} @ {}Hz, {} ch ({:?})",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels,
            sample_format
        );

        Ok((
            Self {
                stream,
                sample_rate,
                channels,
            },
            mixer,
        ))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Resume device callbacks
    pub fn play(&self) {
        if let Err(e) = self.stream.play() {
            log::warn!("Failed to resume audio stream: {e}");
        }
    }

    /// Pause device callbacks
    pub fn pause(&self) {
        if let Err(e) = self.stream.pause() {
            log::warn!("Failed to pause audio stream: {e}");
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: SharedMixer,
) -> Result<Stream, AudioError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch: Vec<f32> = Vec::new();

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            scratch.resize(data.len(), 0.0);
            match mixer.lock() {
                Ok(mut m) => m.render(&mut scratch, channels),
                Err(_) => scratch.fill(0.0),
            }
            for (out, &sample) in data.iter_mut().zip(scratch.iter()) {
                *out = T::from_sample(sample);
            }
        },
        |err| log::error!("Audio stream error: {err}"),
        None,
    )?;
    Ok(stream)
}
