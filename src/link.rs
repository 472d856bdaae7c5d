use std::io;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::frame::Framing;
use crate::port::Target;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid link configuration: {0}")]
    Config(String),
    #[error("open {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("connect to {target} timed out after {timeout:?}")]
    ConnectTimeout { target: String, timeout: Duration },
    #[error("link i/o: {0}")]
    Io(#[from] io::Error),
    #[error("no reply within {0:?}")]
    ReadTimeout(Duration),
    #[error("link faulted, reconnect first")]
    Faulted,
    #[error("link not connected")]
    NotConnected,
}

/// A byte pipe to the device: serial port, TCP socket, or a test double.
pub trait Channel: Send {
    /// Writes the whole frame or fails.
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()>;
    /// `Ok(None)` means the read timed out with nothing received.
    fn read_reply(&mut self) -> io::Result<Option<Vec<u8>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
    Faulted,
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub target: Target,
    pub framing: Framing,
}

/// Sole owner of the device handle. Any I/O error faults the link until it is
/// reopened.
pub struct Link {
    target: Option<Target>,
    framing: Framing,
    reply_timeout: Duration,
    channel: Option<Box<dyn Channel>>,
    state: LinkState,
}

impl Link {
    pub fn open(config: LinkConfig) -> Result<Self, LinkError> {
        let mut link = Link {
            reply_timeout: config.target.reply_timeout(),
            target: Some(config.target),
            framing: config.framing,
            channel: None,
            state: LinkState::Disconnected,
        };
        link.reopen()?;
        Ok(link)
    }

    /// Wraps an already-open channel. Such a link cannot be reopened.
    pub fn from_channel(
        channel: Box<dyn Channel>,
        framing: Framing,
        reply_timeout: Duration,
    ) -> Self {
        Link {
            target: None,
            framing,
            reply_timeout,
            channel: Some(channel),
            state: LinkState::Connected,
        }
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn describe(&self) -> String {
        self.target
            .as_ref()
            .map(Target::describe)
            .unwrap_or_else(|| "<attached>".to_string())
    }

    pub fn reopen(&mut self) -> Result<(), LinkError> {
        self.close();
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| LinkError::Config("no target to reopen".into()))?;
        let channel = target.open()?;
        info!(link = %target.describe(), framing = self.framing.as_str(), "link connected");
        self.channel = Some(channel);
        self.state = LinkState::Connected;
        Ok(())
    }

    pub fn write(&mut self, frame: &[u8]) -> Result<(), LinkError> {
        let res = self.ready()?.write_frame(frame);
        res.map_err(|e| self.fault(e))
    }

    pub fn read_reply(&mut self) -> Result<Vec<u8>, LinkError> {
        let res = self.ready()?.read_reply();
        match res {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => Err(LinkError::ReadTimeout(self.reply_timeout)),
            Err(e) => Err(self.fault(e)),
        }
    }

    /// Safe to call repeatedly and in any state.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            drop(channel);
            debug!(link = %self.describe(), "link closed");
        }
        self.state = LinkState::Disconnected;
    }

    fn ready(&mut self) -> Result<&mut dyn Channel, LinkError> {
        match self.state {
            LinkState::Faulted => Err(LinkError::Faulted),
            LinkState::Disconnected => Err(LinkError::NotConnected),
            LinkState::Connected => match self.channel.as_mut() {
                Some(channel) => Ok(&mut **channel),
                None => Err(LinkError::NotConnected),
            },
        }
    }

    fn fault(&mut self, err: io::Error) -> LinkError {
        warn!(link = %self.describe(), error = %err, "link faulted");
        self.channel = None;
        self.state = LinkState::Faulted;
        LinkError::Io(err)
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        self.close();
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{Reply, Wire};
    use super::*;
    use crate::port::SerialTarget;
    use std::sync::atomic::Ordering;

    fn attached(wire: &Wire) -> Link {
        Link::from_channel(wire.channel(), Framing::Raw, Duration::from_secs(2))
    }

    #[test]
    fn write_and_read_on_connected_link() {
        let wire = Wire::default();
        wire.push_reply(Reply::Bytes(vec![0x01]));
        let mut link = attached(&wire);
        link.write(&[0xAA, 0xBB]).unwrap();
        assert_eq!(link.read_reply().unwrap(), vec![0x01]);
        assert_eq!(link.read_reply().unwrap(), Vec::<u8>::new());
        assert_eq!(wire.writes(), vec![vec![0xAA, 0xBB]]);
        assert_eq!(link.state(), LinkState::Connected);
    }

    #[test]
    fn read_timeout_is_not_a_fault() {
        let wire = Wire::default();
        wire.push_reply(Reply::Timeout);
        let mut link = attached(&wire);
        assert!(matches!(
            link.read_reply(),
            Err(LinkError::ReadTimeout(d)) if d == Duration::from_secs(2)
        ));
        assert_eq!(link.state(), LinkState::Connected);
        link.write(&[0x01]).unwrap();
    }

    #[test]
    fn write_error_faults_and_fails_fast() {
        let wire = Wire::default();
        wire.fail_writes.store(true, Ordering::SeqCst);
        let mut link = attached(&wire);
        assert!(matches!(link.write(&[0x01]), Err(LinkError::Io(_))));
        assert_eq!(link.state(), LinkState::Faulted);
        assert_eq!(wire.drops.load(Ordering::SeqCst), 1);

        wire.fail_writes.store(false, Ordering::SeqCst);
        assert!(matches!(link.write(&[0x02]), Err(LinkError::Faulted)));
        assert!(matches!(link.read_reply(), Err(LinkError::Faulted)));
        assert_eq!(wire.io_count(), 0);
    }

    #[test]
    fn read_error_faults() {
        let wire = Wire::default();
        wire.push_reply(Reply::Fail);
        let mut link = attached(&wire);
        assert!(matches!(link.read_reply(), Err(LinkError::Io(_))));
        assert_eq!(link.state(), LinkState::Faulted);
    }

    #[test]
    fn close_is_idempotent() {
        let wire = Wire::default();
        let mut link = attached(&wire);
        link.close();
        link.close();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(matches!(link.write(&[0x01]), Err(LinkError::NotConnected)));
        drop(link);
        assert_eq!(wire.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn close_after_fault() {
        let wire = Wire::default();
        wire.push_reply(Reply::Fail);
        let mut link = attached(&wire);
        let _ = link.read_reply();
        link.close();
        link.close();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert_eq!(wire.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_closes_once() {
        let wire = Wire::default();
        {
            let _link = attached(&wire);
        }
        assert_eq!(wire.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attached_link_cannot_reopen() {
        let wire = Wire::default();
        let mut link = attached(&wire);
        assert!(matches!(link.reopen(), Err(LinkError::Config(_))));
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[test]
    fn open_unreachable_serial_fails() {
        let cfg = LinkConfig {
            target: Target::Serial(SerialTarget::new("/dev/does-not-exist-gimbal")),
            framing: Framing::Raw,
        };
        assert!(matches!(Link::open(cfg), Err(LinkError::Connect { .. })));
    }
}
