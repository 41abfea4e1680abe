//! In-memory UART between the two node threads

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use doorlock_hal::uart::SerialLink;

/// The peer end of the link was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialClosed;

/// One end of a duplex byte link
///
/// Every transmitted byte is also kept in a local log so a scenario can
/// check the exact marker sequence afterwards.
pub struct ChannelSerial {
    tx: Sender<u8>,
    rx: Receiver<u8>,
    sent: Vec<u8>,
}

/// Create two connected link ends
pub fn serial_pair() -> (ChannelSerial, ChannelSerial) {
    let (a_tx, b_rx) = channel();
    let (b_tx, a_rx) = channel();
    (
        ChannelSerial {
            tx: a_tx,
            rx: a_rx,
            sent: Vec::new(),
        },
        ChannelSerial {
            tx: b_tx,
            rx: b_rx,
            sent: Vec::new(),
        },
    )
}

impl ChannelSerial {
    /// Bytes transmitted from this end so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Consume the end, keeping only the transmit log
    pub fn into_sent(self) -> Vec<u8> {
        self.sent
    }
}

impl SerialLink for ChannelSerial {
    type Error = SerialClosed;

    fn send(&mut self, byte: u8) -> Result<(), SerialClosed> {
        self.tx.send(byte).map_err(|_| SerialClosed)?;
        self.sent.push(byte);
        Ok(())
    }

    fn try_receive(&mut self) -> Result<Option<u8>, SerialClosed> {
        match self.rx.try_recv() {
            Ok(byte) => Ok(Some(byte)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(SerialClosed),
        }
    }
}
