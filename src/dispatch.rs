use parking_lot::Mutex;
use tracing::{info, warn};

use crate::command::{CommandName, payload_for};
use crate::frame::{FrameError, encode, to_hex, validate_reply};
use crate::link::{Link, LinkError, LinkState};

/// What became of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Written, and a reply (possibly empty) came back.
    Acked(Vec<u8>),
    /// Written, but the device stayed silent until the read timeout.
    NoResponse,
    /// The link failed. It stays unusable until reconnected.
    TransportFailure(String),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::TransportFailure(_))
    }

    /// Operator-facing status line.
    pub fn status(&self, name: CommandName) -> String {
        match self {
            Outcome::Acked(reply) => format!("sent {name}, received: {}", to_hex(reply)),
            Outcome::NoResponse => format!("no response (timeout) for: {name}"),
            Outcome::TransportFailure(reason) => format!("error: {reason}"),
        }
    }
}

/// Turns command names into frames on the link, one at a time. The frame has
/// no sequence number, so the next write waits until the previous read is done.
pub struct Dispatcher {
    link: Mutex<Link>,
}

impl Dispatcher {
    pub fn new(link: Link) -> Self {
        Self {
            link: Mutex::new(link),
        }
    }

    /// Codec errors come back as `Err`; link trouble is an [`Outcome`].
    pub fn send(&self, name: CommandName) -> Result<Outcome, FrameError> {
        let mut link = self.link.lock();
        let frame = encode(payload_for(name), link.framing())?;
        let frame_hex = to_hex(&frame);

        if let Err(e) = link.write(&frame) {
            warn!(command = %name, frame = %frame_hex, error = %e, "write failed");
            return Ok(Outcome::TransportFailure(e.to_string()));
        }

        match link.read_reply() {
            Ok(bytes) => {
                let reply = validate_reply(bytes)?;
                info!(command = %name, frame = %frame_hex, reply = %to_hex(&reply), "sent");
                Ok(Outcome::Acked(reply))
            }
            Err(LinkError::ReadTimeout(after)) => {
                info!(command = %name, frame = %frame_hex, reply = "timeout", ?after, "sent");
                Ok(Outcome::NoResponse)
            }
            Err(e) => {
                warn!(command = %name, frame = %frame_hex, error = %e, "read failed");
                Ok(Outcome::TransportFailure(e.to_string()))
            }
        }
    }

    pub fn state(&self) -> LinkState {
        self.link.lock().state()
    }

    pub fn describe(&self) -> String {
        self.link.lock().describe()
    }

    pub fn reconnect(&self) -> Result<(), LinkError> {
        self.link.lock().reopen()
    }

    pub fn close(&self) {
        self.link.lock().close();
    }
}
