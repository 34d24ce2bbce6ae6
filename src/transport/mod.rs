//! Outbound datagram transport.
//!
//! A [`Connector`] opens one [`Transport`] per worker run; the run owns it
//! until it ends.

pub mod osc;

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};

use crate::config::DestinationConfig;

pub use osc::{OscArg, OscError, OscMessage};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to resolve {target}: {source}")]
    Resolve {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open socket for {target}: {source}")]
    Bind {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to send to {target}: {source}")]
    Send {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode message: {0}")]
    Encode(#[from] OscError),
}

/// Sends rendered messages to the fixed destination.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: &str, open: bool) -> Result<(), TransportError>;
}

/// Opens a fresh transport at the start of every run.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}

/// OSC over UDP.
#[derive(Debug, Clone)]
pub struct OscConnector {
    target: String,
    address: String,
}

impl OscConnector {
    pub fn new(host: impl Into<String>, port: u16, address: impl Into<String>) -> Self {
        Self {
            target: format!("{}:{}", host.into(), port),
            address: address.into(),
        }
    }

    pub fn from_config(destination: &DestinationConfig) -> Self {
        Self::new(
            destination.host.clone(),
            destination.port,
            destination.address.clone(),
        )
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl Connector for OscConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        let resolve_error = |source| TransportError::Resolve {
            target: self.target.clone(),
            source,
        };
        let destination = lookup_host(self.target.as_str())
            .await
            .map_err(resolve_error)?
            .next()
            .ok_or_else(|| {
                resolve_error(io::Error::new(
                    io::ErrorKind::NotFound,
                    "no address for host",
                ))
            })?;

        // Left unconnected: a connected socket reports ICMP port-unreachable
        // as a failed send while the receiver is not up yet.
        let local = if destination.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local)
            .await
            .map_err(|source| TransportError::Bind {
                target: self.target.clone(),
                source,
            })?;

        tracing::debug!(%destination, address = %self.address, "OSC socket ready");
        Ok(Box::new(OscTransport {
            socket,
            destination,
            target: self.target.clone(),
            address: self.address.clone(),
        }))
    }
}

/// An unconnected UDP socket sending to one resolved destination.
pub struct OscTransport {
    socket: UdpSocket,
    destination: SocketAddr,
    target: String,
    address: String,
}

#[async_trait]
impl Transport for OscTransport {
    async fn send(&mut self, text: &str, open: bool) -> Result<(), TransportError> {
        let message = OscMessage::new(
            self.address.clone(),
            vec![OscArg::Str(text.to_string()), OscArg::Bool(open)],
        );
        let packet = message.encode()?;
        self.socket
            .send_to(&packet, self.destination)
            .await
            .map_err(|source| TransportError::Send {
                target: self.target.clone(),
                source,
            })?;
        Ok(())
    }
}
