//! Lock-free PCM byte ring buffer sliced into fixed-size blocks
//!
//! The capture callback pushes PCM16 LE bytes; the analysis thread pops
//! whole `block_len * 2`-byte blocks in FIFO order. Bytes past the last whole
//! block stay queued for the next pop.

use super::pcm::{decode_pcm16_le, encode_pcm16_le_into, BYTES_PER_SAMPLE};
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Bounded PCM block buffer
pub struct PcmBlockBuffer {
    producer: HeapProducer<u8>,
    consumer: HeapConsumer<u8>,
    block_len: usize,
}

impl PcmBlockBuffer {
    /// Create new block buffer
    ///
    /// # Arguments
    /// * `block_len` - Samples per block
    /// * `capacity_blocks` - How many whole blocks fit before writes are dropped
    pub fn new(block_len: usize, capacity_blocks: usize) -> Self {
        let capacity = block_len.max(1) * BYTES_PER_SAMPLE * capacity_blocks.max(1);
        let rb = HeapRb::<u8>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            block_len: block_len.max(1),
        }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (PcmProducer, BlockConsumer) {
        let dropped = Arc::new(AtomicU64::new(0));
        (
            PcmProducer {
                producer: self.producer,
                encoded: Vec::new(),
                dropped_bytes: Arc::clone(&dropped),
            },
            BlockConsumer {
                consumer: self.consumer,
                block_bytes: self.block_len * BYTES_PER_SAMPLE,
                scratch: vec![0; self.block_len * BYTES_PER_SAMPLE],
                dropped_bytes: dropped,
            },
        )
    }

    /// Samples per block
    pub fn block_len(&self) -> usize {
        self.block_len
    }
}

/// Producer end (capture callback side)
pub struct PcmProducer {
    producer: HeapProducer<u8>,
    encoded: Vec<u8>,
    dropped_bytes: Arc<AtomicU64>,
}

impl PcmProducer {
    /// Append PCM16 LE bytes
    ///
    /// The write is all-or-nothing: a chunk that does not fit (or that is not
    /// a whole number of samples) is dropped and counted, so the queue never
    /// holds half a sample.
    ///
    /// # Returns
    /// `true` if the chunk was queued
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() % BYTES_PER_SAMPLE != 0 || self.producer.free_len() < bytes.len() {
            self.dropped_bytes
                .fetch_add(bytes.len() as u64, Ordering::Relaxed);
            return false;
        }

        self.producer.push_slice(bytes);
        true
    }

    /// Convert float samples to PCM16 LE and append them
    ///
    /// The encode buffer is reused, so steady-state calls do not allocate.
    pub fn push_samples(&mut self, samples: &[f32]) -> bool {
        let mut encoded = std::mem::take(&mut self.encoded);
        encode_pcm16_le_into(samples, &mut encoded);
        let queued = self.push(&encoded);
        self.encoded = encoded;
        queued
    }

    /// Get number of free bytes
    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }
}

/// Consumer end (analysis side)
pub struct BlockConsumer {
    consumer: HeapConsumer<u8>,
    block_bytes: usize,
    scratch: Vec<u8>,
    dropped_bytes: Arc<AtomicU64>,
}

impl BlockConsumer {
    /// Pop the oldest whole block as normalized samples
    ///
    /// Returns `None` until a full block has accumulated.
    pub fn pop_block(&mut self) -> Option<Vec<f64>> {
        if self.consumer.len() < self.block_bytes {
            return None;
        }

        let read = self.consumer.pop_slice(&mut self.scratch);
        debug_assert_eq!(read, self.block_bytes);

        Some(decode_pcm16_le(&self.scratch[..read]))
    }

    /// Check if at least one whole block is queued
    pub fn has_block(&self) -> bool {
        self.consumer.len() >= self.block_bytes
    }

    /// Get number of queued bytes
    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Samples per block
    pub fn block_len(&self) -> usize {
        self.block_bytes / BYTES_PER_SAMPLE
    }

    /// Total bytes the producer has dropped on overflow
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped_bytes.load(Ordering::Relaxed)
    }
}
