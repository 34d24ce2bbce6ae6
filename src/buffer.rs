//! Shared message buffer.
//!
//! Holds the raw chatbox message and the mode selector behind a single lock,
//! so the worker always reads both fields from the same write.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Maximum number of bytes the buffer accepts.
pub const BUFFER_CAPACITY: usize = 4096;

/// Content the buffer holds before anything is written.
pub const DEFAULT_PLACEHOLDER: &str = "[placeholder]";

/// Errors returned by buffer mutations. The buffer is untouched on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("message is {len} bytes, capacity is {capacity} bytes")]
    CapacityExceeded { len: usize, capacity: usize },
}

/// Consistent copy of the buffer state at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: Vec<u8>,
    pub mode: i32,
}

/// Thread-safe message buffer handle.
///
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct MessageBuffer {
    inner: Arc<RwLock<BufferInner>>,
}

struct BufferInner {
    content: Vec<u8>,
    mode: i32,
}

impl MessageBuffer {
    /// Create a buffer holding `placeholder` with mode 0.
    pub fn new(placeholder: &[u8]) -> Result<Self, BufferError> {
        check_capacity(placeholder.len())?;
        Ok(Self {
            inner: Arc::new(RwLock::new(BufferInner {
                content: placeholder.to_vec(),
                mode: 0,
            })),
        })
    }

    /// Replace the content wholesale.
    pub fn set(&self, bytes: &[u8]) -> Result<(), BufferError> {
        check_capacity(bytes.len())?;
        let mut inner = self.inner.write();
        inner.content.clear();
        inner.content.extend_from_slice(bytes);
        Ok(())
    }

    /// Append to the current content.
    pub fn append(&self, bytes: &[u8]) -> Result<(), BufferError> {
        let mut inner = self.inner.write();
        check_capacity(inner.content.len() + bytes.len())?;
        inner.content.extend_from_slice(bytes);
        Ok(())
    }

    /// Replace content and mode in one step.
    pub fn replace(&self, bytes: &[u8], mode: i32) -> Result<(), BufferError> {
        check_capacity(bytes.len())?;
        let mut inner = self.inner.write();
        inner.content.clear();
        inner.content.extend_from_slice(bytes);
        inner.mode = mode;
        Ok(())
    }

    pub fn set_mode(&self, mode: i32) {
        self.inner.write().mode = mode;
    }

    pub fn mode(&self) -> i32 {
        self.inner.read().mode
    }

    /// Read content and mode together.
    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        Snapshot {
            content: inner.content.clone(),
            mode: inner.mode,
        }
    }
}

impl Default for MessageBuffer {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(BufferInner {
                content: DEFAULT_PLACEHOLDER.as_bytes().to_vec(),
                mode: 0,
            })),
        }
    }
}

fn check_capacity(len: usize) -> Result<(), BufferError> {
    if len > BUFFER_CAPACITY {
        return Err(BufferError::CapacityExceeded {
            len,
            capacity: BUFFER_CAPACITY,
        });
    }
    Ok(())
}
