//! Audio ingest: WAV files, PCM blocks and microphone capture with cpal

pub mod pcm;
pub mod wav;
pub mod buffer;
pub mod input;
pub mod monitor;

pub use wav::{WavClip, WavError};
pub use buffer::{BlockConsumer, PcmBlockBuffer, PcmProducer};
pub use input::{AudioError, AudioInput};
pub use monitor::{BlockProcessor, MonitorError, StressMonitor};
