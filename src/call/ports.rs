use std::sync::atomic::{AtomicU16, Ordering};

use crate::error::{OrchestratorError, Result};

/// Hands out media ports from `[min, max]`, wrapping back to `min`.
///
/// A pure generator: ports are never released and the live sessions are
/// never consulted, so a call outliving a full lap of the range can collide
/// with a new one.
#[derive(Debug)]
pub struct PortAllocator {
    min: u16,
    max: u16,
    cursor: AtomicU16,
}

impl PortAllocator {
    pub fn new(min: u16, max: u16) -> Result<Self> {
        if min > max {
            return Err(OrchestratorError::InvalidPortRange { min, max });
        }

        Ok(Self {
            min,
            max,
            cursor: AtomicU16::new(min),
        })
    }

    /// Return the cursor and advance it; `max` is handed out before wrapping.
    pub fn next_port(&self) -> u16 {
        let (min, max) = (self.min, self.max);
        match self
            .cursor
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |port| {
                Some(if port >= max { min } else { port + 1 })
            }) {
            Ok(port) | Err(port) => port,
        }
    }

    /// Port the next call to `next_port` will return
    pub fn peek(&self) -> u16 {
        self.cursor.load(Ordering::SeqCst)
    }

    pub fn range(&self) -> (u16, u16) {
        (self.min, self.max)
    }
}
