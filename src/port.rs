use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::link::{Channel, LinkError};

/// Once an ack starts arriving, the reply ends after this much silence.
const REPLY_GAP: Duration = Duration::from_millis(20);

/// Serial profile. 115200 8N1 with a 1 s read timeout unless told otherwise.
#[derive(Debug, Clone)]
pub struct SerialTarget {
    pub dev: String,
    pub baud: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub timeout: Duration,
    /// Pause between write and read so the device has time to answer.
    pub settle: Duration,
}

impl SerialTarget {
    pub fn new(dev: impl Into<String>) -> Self {
        Self {
            dev: dev.into(),
            baud: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            timeout: Duration::from_secs(1),
            settle: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TcpTarget {
    pub host: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl TcpTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Target {
    Serial(SerialTarget),
    Tcp(TcpTarget),
}

impl Target {
    pub fn describe(&self) -> String {
        match self {
            Target::Serial(s) => format!("{}@{}", s.dev, s.baud),
            Target::Tcp(t) => format!("{}:{}", t.host, t.port),
        }
    }

    /// How long a reply may take before the read gives up.
    pub fn reply_timeout(&self) -> Duration {
        match self {
            Target::Serial(s) => s.timeout,
            Target::Tcp(t) => t.read_timeout,
        }
    }

    pub fn open(&self) -> Result<Box<dyn Channel>, LinkError> {
        match self {
            Target::Serial(s) => Ok(Box::new(open_serial(s)?)),
            Target::Tcp(t) => Ok(Box::new(open_tcp(t)?)),
        }
    }
}

pub fn open_serial(opts: &SerialTarget) -> Result<SerialChannel, LinkError> {
    let builder = serialport::new(&opts.dev, opts.baud)
        .timeout(opts.timeout)
        .data_bits(opts.data_bits)
        .parity(opts.parity)
        .stop_bits(opts.stop_bits)
        .flow_control(FlowControl::None);

    let port = builder.open().map_err(|e| LinkError::Connect {
        target: opts.dev.clone(),
        source: io::Error::from(e),
    })?;
    debug!(dev = %opts.dev, baud = opts.baud, "serial port open");
    Ok(SerialChannel {
        port,
        settle: opts.settle,
    })
}

pub fn open_tcp(opts: &TcpTarget) -> Result<TcpChannel, LinkError> {
    let target = format!("{}:{}", opts.host, opts.port);
    let addrs = (opts.host.as_str(), opts.port)
        .to_socket_addrs()
        .map_err(|e| LinkError::Connect {
            target: target.clone(),
            source: e,
        })?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, opts.connect_timeout) {
            Ok(stream) => {
                stream
                    .set_read_timeout(Some(opts.read_timeout))
                    .and_then(|_| stream.set_nodelay(true))
                    .map_err(|e| LinkError::Connect {
                        target: target.clone(),
                        source: e,
                    })?;
                debug!(%addr, "tcp connected");
                return Ok(TcpChannel { stream });
            }
            Err(e) => last_err = Some(e),
        }
    }

    Err(connect_error(target, opts.connect_timeout, last_err))
}

fn connect_error(target: String, timeout: Duration, last_err: Option<io::Error>) -> LinkError {
    match last_err {
        Some(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
            LinkError::ConnectTimeout { target, timeout }
        }
        Some(e) => LinkError::Connect { target, source: e },
        None => LinkError::Connect {
            target,
            source: io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses"),
        },
    }
}

pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    settle: Duration,
}

impl Channel for SerialChannel {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        // late bytes from an earlier ack must not answer this frame
        let stale = self.port.bytes_to_read().map_err(io::Error::from)?;
        if stale > 0 {
            debug!(stale, "discarding unclaimed input");
            self.port.clear(ClearBuffer::Input).map_err(io::Error::from)?;
        }
        self.port.write_all(frame)?;
        self.port.flush()
    }

    // Waits up to the port timeout for the first bytes, then keeps reading until
    // the line goes quiet. A timeout is not an error on this profile.
    fn read_reply(&mut self) -> io::Result<Option<Vec<u8>>> {
        if !self.settle.is_zero() {
            std::thread::sleep(self.settle);
        }
        let mut buf = [0u8; 256];
        let mut reply = loop {
            match self.port.read(&mut buf) {
                Ok(n) => break buf[..n].to_vec(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(Some(Vec::new())),
                Err(e) => return Err(e),
            }
        };
        loop {
            std::thread::sleep(REPLY_GAP);
            let waiting = self.port.bytes_to_read().map_err(io::Error::from)? as usize;
            if waiting == 0 {
                break;
            }
            let mut more = vec![0u8; waiting];
            let n = self.port.read(&mut more)?;
            reply.extend_from_slice(&more[..n]);
        }
        Ok(Some(reply))
    }
}

pub struct TcpChannel {
    stream: TcpStream,
}

impl Channel for TcpChannel {
    fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame)?;
        self.stream.flush()
    }

    fn read_reply(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut buf = [0u8; 1024];
        loop {
            match self.stream.read(&mut buf) {
                Ok(n) => return Ok(Some(buf[..n].to_vec())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // platform-dependent kind for SO_RCVTIMEO expiry
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
                {
                    return Ok(None);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub fn parse_parity(s: &str) -> Result<Parity, String> {
    match s.to_ascii_lowercase().as_str() {
        "none" => Ok(Parity::None),
        "even" => Ok(Parity::Even),
        "odd" => Ok(Parity::Odd),
        _ => Err(format!("parity must be none, even or odd, got '{s}'")),
    }
}

pub fn parse_data_bits(s: &str) -> Result<DataBits, String> {
    match s {
        "5" => Ok(DataBits::Five),
        "6" => Ok(DataBits::Six),
        "7" => Ok(DataBits::Seven),
        "8" => Ok(DataBits::Eight),
        _ => Err(format!("data bits must be 5..8, got '{s}'")),
    }
}

pub fn parse_stop_bits(s: &str) -> Result<StopBits, String> {
    match s {
        "1" => Ok(StopBits::One),
        "2" => Ok(StopBits::Two),
        _ => Err(format!("stop bits must be 1 or 2, got '{s}'")),
    }
}
