//! Protocol link
//!
//! Wraps a byte-oriented serial link with marker and credential helpers.
//! Every receive takes a [`Wait`]: either block until a byte arrives or give
//! up after a number of milliseconds. Waiting is done by polling the link and
//! sleeping on the caller's delay between polls.

use embedded_hal::delay::DelayNs;

use doorlock_hal::uart::SerialLink;
use doorlock_protocol::{Credential, CredentialReader, Marker};

use crate::error::{LinkError, ProtocolError};

/// How long a receive may wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Wait {
    /// Block until a byte arrives
    Forever,
    /// Give up after this many milliseconds
    Millis(u32),
}

impl Wait {
    /// `Millis` when a bound is configured, `Forever` otherwise
    pub fn bounded(ms: Option<u32>) -> Self {
        ms.map_or(Wait::Forever, Wait::Millis)
    }
}

/// Marker-level view of a serial link
pub struct Link<S> {
    serial: S,
    poll_ms: u32,
}

impl<S: SerialLink> Link<S> {
    /// Wrap a serial link, sleeping `poll_ms` between receive polls
    pub fn new(serial: S, poll_ms: u32) -> Self {
        Self {
            serial,
            poll_ms: poll_ms.max(1),
        }
    }

    /// Send one marker
    pub fn send(&mut self, marker: Marker) -> Result<(), LinkError> {
        trace!("tx {:?}", marker);
        self.serial
            .send(marker.to_byte())
            .map_err(|_| LinkError::Serial)
    }

    /// Send a credential payload (4 bytes, LSB first)
    pub fn send_credential(&mut self, credential: Credential) -> Result<(), LinkError> {
        trace!("tx credential");
        self.serial
            .send_all(&credential.to_bytes())
            .map_err(|_| LinkError::Serial)
    }

    /// Take a byte if one is waiting
    pub fn poll_byte(&mut self) -> Result<Option<u8>, LinkError> {
        self.serial.try_receive().map_err(|_| LinkError::Serial)
    }

    /// Receive one raw byte
    pub fn recv_byte<D: DelayNs>(&mut self, delay: &mut D, wait: Wait) -> Result<u8, LinkError> {
        let mut waited_ms = 0u32;
        loop {
            if let Some(byte) = self.poll_byte()? {
                return Ok(byte);
            }
            if let Wait::Millis(limit) = wait {
                if waited_ms >= limit {
                    return Err(LinkError::Timeout);
                }
            }
            delay.delay_ms(self.poll_ms);
            waited_ms = waited_ms.saturating_add(self.poll_ms);
        }
    }

    /// Receive one marker
    ///
    /// A byte outside the alphabet is a desync.
    pub fn recv_marker<D: DelayNs>(
        &mut self,
        delay: &mut D,
        wait: Wait,
    ) -> Result<Marker, LinkError> {
        let byte = self.recv_byte(delay, wait)?;
        let marker = Marker::from_byte(byte)
            .ok_or(LinkError::Desync(ProtocolError::UnknownByte(byte)))?;
        trace!("rx {:?}", marker);
        Ok(marker)
    }

    /// Receive a 4-byte credential payload
    ///
    /// `wait` applies to each byte.
    pub fn recv_credential<D: DelayNs>(
        &mut self,
        delay: &mut D,
        wait: Wait,
    ) -> Result<Credential, LinkError> {
        let mut reader = CredentialReader::new();
        loop {
            let byte = self.recv_byte(delay, wait)?;
            if let Some(credential) = reader.feed(byte) {
                trace!("rx credential");
                return Ok(credential);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// Release the wrapped serial link
    pub fn release(self) -> S {
        self.serial
    }
}
