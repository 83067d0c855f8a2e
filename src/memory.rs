//! Accounting of the memory held by a trainer
use std::mem::size_of;

/// Running total of the bytes reserved for buffers of a training run.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    bytes: usize,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        MemoryLedger { bytes: 0 }
    }

    /// Books `count` values of type `T` for the buffer `what`.
    pub fn reserve<T>(&mut self, what: &str, count: usize) {
        let bytes = count * size_of::<T>();
        self.bytes += bytes;
        log::debug!("memory: reserve {bytes} bytes for {what} (total {})", self.bytes);
    }

    /// Releases `count` values of type `T` booked for `what`.
    pub fn release<T>(&mut self, what: &str, count: usize) {
        let bytes = count * size_of::<T>();
        self.bytes = self.bytes.saturating_sub(bytes);
        log::debug!("memory: release {bytes} bytes of {what} (total {})", self.bytes);
    }

    /// Releases everything booked so far.
    pub fn release_all(&mut self) {
        if self.bytes > 0 {
            log::debug!("memory: release {} bytes", self.bytes);
        }
        self.bytes = 0;
    }

    /// Returns the number of bytes currently booked.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}
