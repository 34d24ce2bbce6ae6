//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatcast::buffer::MessageBuffer;
use chatcast::controller::Controller;
use chatcast::error_log::ErrorLog;
use chatcast::transport::{Connector, Transport, TransportError};
use chatcast::worker::WorkerSettings;
use parking_lot::Mutex;
use tempfile::TempDir;

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;
pub type SentLog = Arc<Mutex<Vec<(String, bool)>>>;

/// Writer that appends into a shared byte vector.
pub struct SpyWriter(pub SpyBuffer);

impl Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn spy_text(spy: &SpyBuffer) -> String {
    String::from_utf8_lossy(&spy.lock()).into_owned()
}

/// Connector whose transports record every send.
#[derive(Clone, Default)]
pub struct RecordingConnector {
    pub sent: SentLog,
    pub connects: Arc<Mutex<usize>>,
    /// Fail sends after this many successful ones.
    pub fail_after: Option<usize>,
    pub refuse_connect: bool,
}

struct RecordingTransport {
    sent: SentLog,
    fail_after: Option<usize>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&mut self, text: &str, open: bool) -> Result<(), TransportError> {
        let mut sent = self.sent.lock();
        if self.fail_after.is_some_and(|limit| sent.len() >= limit) {
            return Err(TransportError::Send {
                target: "recording".to_string(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            });
        }
        sent.push((text.to_string(), open));
        Ok(())
    }
}

#[async_trait]
impl Connector for RecordingConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        *self.connects.lock() += 1;
        if self.refuse_connect {
            return Err(TransportError::Bind {
                target: "recording".to_string(),
                source: io::Error::new(io::ErrorKind::AddrNotAvailable, "no route"),
            });
        }
        Ok(Box::new(RecordingTransport {
            sent: Arc::clone(&self.sent),
            fail_after: self.fail_after,
        }))
    }
}

/// Controller wired to a recording connector and a temp error log.
pub struct Harness {
    pub controller: Arc<Controller>,
    pub connector: RecordingConnector,
    pub error_log: PathBuf,
    pub dir: TempDir,
}

pub fn harness(interval: Duration) -> Harness {
    harness_with(RecordingConnector::default(), interval)
}

pub fn harness_with(connector: RecordingConnector, interval: Duration) -> Harness {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let error_log = dir.path().join("output.log");
    let controller = Controller::new(
        MessageBuffer::default(),
        Arc::new(connector.clone()),
        WorkerSettings {
            interval,
            open: true,
        },
        Duration::from_secs(1),
        ErrorLog::new(error_log.clone()),
    );
    Harness {
        controller: Arc::new(controller),
        connector,
        error_log,
        dir,
    }
}

/// Poll until `condition` holds or fail after two seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
