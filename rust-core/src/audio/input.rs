//! Microphone capture using cpal
//!
//! Captures from the default (or a named) input device, downmixes to mono
//! and queues PCM16 LE bytes for block analysis.

use super::buffer::PcmProducer;
use super::pcm::{i16_to_float, u16_to_float};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("No audio input device found")]
    NoDevice,

    #[error("Failed to get device name: {0}")]
    DeviceName(String),

    #[error("Failed to get default config: {0}")]
    DefaultConfig(String),

    #[error("Failed to build stream: {0}")]
    BuildStream(String),

    #[error("Failed to play stream: {0}")]
    PlayStream(String),

    #[error("Unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("Device runs at {found} Hz but {required} Hz is required. Change the device sample rate in system settings.")]
    UnsupportedSampleRate { required: u32, found: u32 },
}

/// Audio input device information
#[derive(Debug, Clone)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Audio input stream
pub struct AudioInput {
    stream: Stream,
    device_info: AudioDeviceInfo,
}

impl AudioInput {
    /// Create audio input from default device
    ///
    /// # Arguments
    /// * `producer` - Block buffer producer for captured audio
    /// * `required_sample_rate` - Refuse devices running at any other rate
    pub fn from_default_device(
        producer: PcmProducer,
        required_sample_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(AudioError::NoDevice)?;

        Self::from_device(device, producer, required_sample_rate)
    }

    /// Create audio input from the input device with the given name
    pub fn from_named_device(
        name: &str,
        producer: PcmProducer,
        required_sample_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host
            .input_devices()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or(AudioError::NoDevice)?;

        Self::from_device(device, producer, required_sample_rate)
    }

    /// Create audio input from specific device
    pub fn from_device(
        device: Device,
        producer: PcmProducer,
        required_sample_rate: Option<u32>,
    ) -> Result<Self, AudioError> {
        let name = device
            .name()
            .map_err(|e| AudioError::DeviceName(e.to_string()))?;

        let config = device
            .default_input_config()
            .map_err(|e| AudioError::DefaultConfig(e.to_string()))?;

        let sample_rate = config.sample_rate().0;

        if let Some(required) = required_sample_rate {
            if sample_rate != required {
                return Err(AudioError::UnsupportedSampleRate {
                    required,
                    found: sample_rate,
                });
            }
        }

        let channels = config.channels();
        let sample_format = config.sample_format();

        let device_info = AudioDeviceInfo {
            name: name.clone(),
            sample_rate,
            channels,
        };

        log::info!(
            "Opening input device '{}' ({} Hz, {} ch, {:?})",
            name,
            sample_rate,
            channels,
            sample_format
        );

        let stream_config: StreamConfig = config.into();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, producer, |s| s)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, producer, i16_to_float)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, producer, u16_to_float)?,
            other => {
                return Err(AudioError::UnsupportedSampleFormat(format!("{:?}", other)));
            }
        };

        Ok(Self {
            stream,
            device_info,
        })
    }

    /// Start capturing audio
    pub fn start(&self) -> Result<(), AudioError> {
        self.stream
            .play()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Pause audio capture
    pub fn pause(&self) -> Result<(), AudioError> {
        self.stream
            .pause()
            .map_err(|e| AudioError::PlayStream(e.to_string()))
    }

    /// Get device information
    pub fn device_info(&self) -> &AudioDeviceInfo {
        &self.device_info
    }
}

/// Build an input stream for device samples of type `T`
///
/// The callback converts, downmixes and encodes into buffers it owns, so it
/// does not allocate once they have grown to the device's period size.
fn build_stream<T>(
    device: &Device,
    stream_config: &StreamConfig,
    mut producer: PcmProducer,
    to_float: fn(T) -> f32,
) -> Result<Stream, AudioError>
where
    T: SizedSample + 'static,
{
    let frame_len = stream_config.channels.max(1) as usize;
    let mut mono = Vec::new();

    device
        .build_input_stream(
            stream_config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                downmix_to_mono_into(data, frame_len, to_float, &mut mono);
                // Overflow is counted by the buffer and reported by the consumer
                producer.push_samples(&mono);
            },
            move |err| {
                log::error!("Audio input error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::BuildStream(e.to_string()))
}

/// Average interleaved frames down to one channel
pub fn downmix_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    let mut mono = Vec::with_capacity(data.len() / channels.max(1));
    downmix_to_mono_into(data, channels, |s| s, &mut mono);
    mono
}

/// Convert and average interleaved frames into a reused buffer
///
/// `out` is cleared first. A trailing partial frame is dropped.
pub fn downmix_to_mono_into<T: Copy>(
    data: &[T],
    channels: usize,
    to_float: impl Fn(T) -> f32,
    out: &mut Vec<f32>,
) {
    out.clear();

    if channels <= 1 {
        out.extend(data.iter().map(|&s| to_float(s)));
        return;
    }

    out.extend(data.chunks_exact(channels).map(|frame| {
        frame.iter().map(|&s| to_float(s)).sum::<f32>() / channels as f32
    }));
}

/// List available audio input devices
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, AudioError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let device_iter = host
        .input_devices()
        .map_err(|e| AudioError::DeviceName(e.to_string()))?;

    for device in device_iter {
        if let Ok(name) = device.name() {
            if let Ok(config) = device.default_input_config() {
                devices.push(AudioDeviceInfo {
                    name,
                    sample_rate: config.sample_rate().0,
                    channels: config.channels(),
                });
            }
        }
    }

    Ok(devices)
}
