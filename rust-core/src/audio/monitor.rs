//! Live stress monitor - analysis loop stays on a Rust thread
//!
//! Microphone blocks are analyzed as soon as a whole block has accumulated;
//! callers poll the latest reading or receive every reading over a channel.

use crate::audio::buffer::{BlockConsumer, PcmBlockBuffer};
use crate::audio::input::{AudioError, AudioInput};
use crate::config::CaptureConfig;
use crate::spectrum::{AnalyzerConfig, StressAnalyzer, StressError, StressReading};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Idle wait between polls when no block is ready
const IDLE_POLL: Duration = Duration::from_millis(2);

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Analyzer(#[from] StressError),

    #[error("Monitor is already running")]
    AlreadyRunning,
}

/// Pops whole blocks from the buffer and analyzes them in order
pub struct BlockProcessor {
    analyzer: StressAnalyzer,
    consumer: BlockConsumer,
    blocks_analyzed: u64,
    last_dropped: u64,
}

impl BlockProcessor {
    pub fn new(analyzer: StressAnalyzer, consumer: BlockConsumer) -> Self {
        Self {
            analyzer,
            consumer,
            blocks_analyzed: 0,
            last_dropped: 0,
        }
    }

    /// Analyze every block currently queued
    ///
    /// Blocks that fail analysis are logged and skipped.
    ///
    /// # Returns
    /// Number of blocks taken from the buffer
    pub fn process_available<F>(&mut self, mut on_reading: F) -> usize
    where
        F: FnMut(StressReading),
    {
        let mut taken = 0;

        while let Some(block) = self.consumer.pop_block() {
            taken += 1;
            self.blocks_analyzed += 1;

            match self.analyzer.analyze(&block) {
                Ok(reading) => {
                    log::debug!("Block {}: {}", self.blocks_analyzed, reading);
                    on_reading(reading);
                }
                Err(e) => log::warn!("Skipping block {}: {}", self.blocks_analyzed, e),
            }
        }

        let dropped = self.consumer.dropped_bytes();
        if dropped > self.last_dropped {
            log::warn!(
                "Capture buffer overflowed, {} bytes dropped so far",
                dropped
            );
            self.last_dropped = dropped;
        }

        taken
    }

    /// Blocks taken from the buffer so far
    pub fn blocks_analyzed(&self) -> u64 {
        self.blocks_analyzed
    }
}

/// Microphone stress monitor
pub struct StressMonitor {
    /// Analysis settings (sample rate replaced by the device's)
    analysis: AnalyzerConfig,

    /// Capture settings
    capture: CaptureConfig,

    /// Latest reading
    latest: Arc<Mutex<Option<StressReading>>>,

    /// Blocks analyzed since start
    blocks_analyzed: Arc<AtomicU64>,

    /// Reading channel
    sender: Sender<StressReading>,
    receiver: Option<Receiver<StressReading>>,

    /// Audio input stream
    audio_input: Option<AudioInput>,

    /// Processing thread handle
    process_thread: Option<JoinHandle<()>>,

    /// Running flag
    running: Arc<AtomicBool>,
}

impl StressMonitor {
    /// Create new monitor
    pub fn new(analysis: AnalyzerConfig, capture: CaptureConfig) -> Self {
        let (sender, receiver) = mpsc::channel();

        Self {
            analysis,
            capture,
            latest: Arc::new(Mutex::new(None)),
            blocks_analyzed: Arc::new(AtomicU64::new(0)),
            sender,
            receiver: Some(receiver),
            audio_input: None,
            process_thread: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start capture and analysis
    ///
    /// # Returns
    /// Name of the input device
    pub fn start(&mut self) -> Result<String, MonitorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(MonitorError::AlreadyRunning);
        }

        let rb = PcmBlockBuffer::new(self.analysis.block_len, self.capture.buffer_blocks);
        let (producer, consumer) = rb.split();

        let required = self.capture.required_sample_rate;
        let input = match &self.capture.device {
            Some(name) => AudioInput::from_named_device(name, producer, required)?,
            None => AudioInput::from_default_device(producer, required)?,
        };

        let device_name = input.device_info().name.clone();
        let sample_rate = input.device_info().sample_rate;

        // Analyze at whatever rate the device delivers
        let analyzer = StressAnalyzer::new(self.analysis.with_sample_rate(sample_rate))?;

        input.start()?;
        self.audio_input = Some(input);

        self.running.store(true, Ordering::SeqCst);
        self.blocks_analyzed.store(0, Ordering::SeqCst);

        let latest = Arc::clone(&self.latest);
        let blocks_analyzed = Arc::clone(&self.blocks_analyzed);
        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();

        let handle = std::thread::spawn(move || {
            let mut processor = BlockProcessor::new(analyzer, consumer);

            while running.load(Ordering::SeqCst) {
                let taken = processor.process_available(|reading| {
                    if let Ok(mut guard) = latest.lock() {
                        *guard = Some(reading);
                    }
                    // Nobody listening is fine
                    let _ = sender.send(reading);
                });

                if taken > 0 {
                    blocks_analyzed.store(processor.blocks_analyzed(), Ordering::SeqCst);
                } else {
                    std::thread::sleep(IDLE_POLL);
                }
            }
        });

        self.process_thread = Some(handle);

        log::info!("Stress monitor started on '{}' at {} Hz", device_name, sample_rate);

        Ok(device_name)
    }

    /// Stop capture and join the analysis thread
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.process_thread.take() {
            join_analysis_thread(handle);
        }

        if let Some(input) = self.audio_input.take() {
            if let Err(e) = input.pause() {
                log::warn!("Failed to pause audio input: {}", e);
            }
        }
    }

    /// Check if the monitor is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Most recent reading, if any block has been analyzed
    pub fn latest(&self) -> Option<StressReading> {
        self.latest.lock().ok().and_then(|guard| *guard)
    }

    /// Number of blocks analyzed since the last start
    pub fn blocks_analyzed(&self) -> u64 {
        self.blocks_analyzed.load(Ordering::SeqCst)
    }

    /// Take the receiver for every reading (only once)
    pub fn take_readings(&mut self) -> Option<Receiver<StressReading>> {
        self.receiver.take()
    }
}

/// Join the analysis thread, logging a panic instead of re-raising it
///
/// # Returns
/// `true` if the thread exited normally
fn join_analysis_thread(handle: JoinHandle<()>) -> bool {
    match handle.join() {
        Ok(()) => true,
        Err(payload) => {
            log::warn!("Analysis thread panicked: {}", panic_message(payload.as_ref()));
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Drop for StressMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
