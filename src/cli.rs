use clap::{Args, Parser, Subcommand};
use serialport::{DataBits, Parity, StopBits};
use std::time::Duration;

use crate::frame::Framing;
use crate::link::{LinkConfig, LinkError};
use crate::port::{
    SerialTarget, Target, TcpTarget, parse_data_bits, parse_parity, parse_stop_bits,
};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "gimbal-link",
    about = "Pan-tilt camera gimbal control over serial or TCP"
)]
pub struct Cli {
    /// Debug-level logging unless RUST_LOG says otherwise
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Print the command table
    List,
    /// Print the encoded frame for a command without opening a link
    Frame(FrameOpts),
    /// Send one or more commands and exit
    Send(SendOpts),
    /// Interactive press/release console
    Console(ConsoleOpts),
}

#[derive(Args, Debug, Clone)]
pub struct LinkOpts {
    /// Serial device path
    #[arg(long, conflicts_with = "host")]
    pub dev: Option<String>,
    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,
    /// Data bits (5..8)
    #[arg(long, default_value = "8", value_parser = parse_data_bits)]
    pub data_bits: DataBits,
    /// Parity: none, even or odd
    #[arg(long, default_value = "none", value_parser = parse_parity)]
    pub parity: Parity,
    /// Stop bits (1 or 2)
    #[arg(long, default_value = "1", value_parser = parse_stop_bits)]
    pub stop_bits: StopBits,
    /// Serial read timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub serial_timeout_ms: u64,
    /// Pause between serial write and read in milliseconds
    #[arg(long, default_value_t = 50)]
    pub settle_ms: u64,

    /// Camera IP or hostname
    #[arg(long)]
    pub host: Option<String>,
    /// Camera TCP port
    #[arg(long, default_value_t = 2000)]
    pub port: u16,
    /// TCP connect timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub connect_timeout_ms: u64,
    /// TCP reply timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub read_timeout_ms: u64,

    /// raw or wrapped; defaults to raw on serial, wrapped on TCP
    #[arg(long)]
    pub framing: Option<Framing>,
}

impl LinkOpts {
    pub fn link_config(&self) -> Result<LinkConfig, LinkError> {
        let target = match (&self.dev, &self.host) {
            (Some(dev), None) => Target::Serial(SerialTarget {
                baud: self.baud,
                data_bits: self.data_bits,
                parity: self.parity,
                stop_bits: self.stop_bits,
                timeout: Duration::from_millis(self.serial_timeout_ms),
                settle: Duration::from_millis(self.settle_ms),
                ..SerialTarget::new(dev.as_str())
            }),
            (None, Some(host)) => Target::Tcp(TcpTarget {
                connect_timeout: Duration::from_millis(self.connect_timeout_ms),
                read_timeout: Duration::from_millis(self.read_timeout_ms),
                ..TcpTarget::new(host.as_str(), self.port)
            }),
            (Some(_), Some(_)) => {
                return Err(LinkError::Config("give either --dev or --host, not both".into()));
            }
            (None, None) => {
                return Err(LinkError::Config("one of --dev or --host is required".into()));
            }
        };
        let framing = self.framing.unwrap_or(match target {
            Target::Serial(_) => Framing::Raw,
            Target::Tcp(_) => Framing::Wrapped,
        });
        Ok(LinkConfig { target, framing })
    }
}

#[derive(Args, Debug, Clone)]
pub struct FrameOpts {
    /// Command name (see `list`)
    pub command: String,
    /// raw or wrapped
    #[arg(long, default_value = "wrapped")]
    pub framing: Framing,
}

#[derive(Args, Debug, Clone)]
pub struct SendOpts {
    #[command(flatten)]
    pub link: LinkOpts,
    /// Command names, sent in order
    #[arg(required = true)]
    pub commands: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ConsoleOpts {
    #[command(flatten)]
    pub link: LinkOpts,
    /// Do not send stop/stop_zoom when taking control
    #[arg(long, default_value_t = false)]
    pub skip_resync: bool,
}
