//! The send loop.
//!
//! Each tick snapshots the buffer, renders it and sends the result, then
//! sleeps until the next tick or until a stop is requested. Any render or
//! transport error ends the run; there is no retry.

use std::time::Duration;

use thiserror::Error;

use crate::buffer::MessageBuffer;
use crate::render::{render, Facilities, RenderError};
use crate::shutdown::StopSignal;
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub interval: Duration,
    /// Passed through to the transport with every message.
    pub open: bool,
}

pub struct Worker {
    buffer: MessageBuffer,
    transport: Box<dyn Transport>,
    facilities: Facilities,
    settings: WorkerSettings,
    stop: StopSignal,
}

impl Worker {
    pub fn new(
        buffer: MessageBuffer,
        transport: Box<dyn Transport>,
        facilities: Facilities,
        settings: WorkerSettings,
        stop: StopSignal,
    ) -> Self {
        Self {
            buffer,
            transport,
            facilities,
            settings,
            stop,
        }
    }

    /// Run until stopped (`Ok`) or until a tick fails (`Err`).
    pub async fn run(mut self) -> Result<(), WorkerError> {
        let mut ticks: u64 = 0;
        while !self.stop.is_stopped() {
            self.tick().await?;
            ticks += 1;

            tokio::select! {
                _ = self.stop.wait() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        tracing::info!(ticks, "Worker stopped");
        Ok(())
    }

    async fn tick(&mut self) -> Result<(), WorkerError> {
        let snapshot = self.buffer.snapshot();
        let text = render(snapshot.mode, &snapshot.content, &mut self.facilities)?;
        self.transport.send(&text, self.settings.open).await?;
        tracing::debug!(mode = snapshot.mode, bytes = text.len(), "Message sent");
        Ok(())
    }
}
