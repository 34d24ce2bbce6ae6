//! Minimal OSC 1.0 message encoding.
//!
//! Only what the chatbox needs: string and boolean arguments.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OscError {
    #[error("OSC address '{0}' must start with '/'")]
    InvalidAddress(String),

    #[error("OSC strings cannot contain NUL bytes")]
    EmbeddedNul,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscArg {
    Str(String),
    Bool(bool),
}

impl OscArg {
    fn type_tag(&self) -> u8 {
        match self {
            OscArg::Str(_) => b's',
            OscArg::Bool(true) => b'T',
            OscArg::Bool(false) => b'F',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }

    /// Serialize to a single datagram.
    pub fn encode(&self) -> Result<Vec<u8>, OscError> {
        if !self.address.starts_with('/') {
            return Err(OscError::InvalidAddress(self.address.clone()));
        }

        let mut packet = Vec::with_capacity(64);
        write_padded_str(&mut packet, &self.address)?;

        let mut tags = Vec::with_capacity(self.args.len() + 1);
        tags.push(b',');
        tags.extend(self.args.iter().map(OscArg::type_tag));
        write_padded(&mut packet, &tags);

        for arg in &self.args {
            if let OscArg::Str(s) = arg {
                write_padded_str(&mut packet, s)?;
            }
        }

        Ok(packet)
    }
}

fn write_padded_str(packet: &mut Vec<u8>, s: &str) -> Result<(), OscError> {
    if s.as_bytes().contains(&0) {
        return Err(OscError::EmbeddedNul);
    }
    write_padded(packet, s.as_bytes());
    Ok(())
}

// NUL-terminate, then pad to a multiple of four bytes.
fn write_padded(packet: &mut Vec<u8>, bytes: &[u8]) {
    packet.extend_from_slice(bytes);
    let pad = 4 - (bytes.len() % 4);
    packet.extend(std::iter::repeat(0u8).take(pad));
}
