use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::cli::ConsoleOpts;
use crate::command::{CommandName, lookup};
use crate::dispatch::Dispatcher;
use crate::frame::FrameError;
use crate::link::Link;
use crate::motion::{AxisGroup, Direction, MotionController};
use crate::oneshot::print_table;

const HELP: &str = "\
press <dir>     start moving (left right up down zoom_in zoom_out)
release <dir>   stop moving if <dir> is the active direction
send <command>  one-shot command; a bare command name works too
resync          send stop and stop_zoom
reconnect       reopen the link
status          link and axis state
list            command table
quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Press(Direction),
    Release(Direction),
    Send(CommandName),
    Resync,
    Reconnect,
    Status,
    List,
    Help,
    Quit,
}

pub fn parse_event(line: &str) -> Result<Option<Event>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected argument '{extra}'"));
    }

    let direction = |arg: Option<&str>| -> Result<Direction, String> {
        let arg = arg.ok_or_else(|| format!("{verb} needs a direction"))?;
        arg.parse::<Direction>()
            .map_err(|_| format!("not a direction: {arg}"))
    };

    let event = match verb.to_ascii_lowercase().as_str() {
        "press" => Event::Press(direction(arg)?),
        "release" => Event::Release(direction(arg)?),
        "send" => {
            let arg = arg.ok_or("send needs a command name")?;
            Event::Send(lookup(arg).map_err(|e| e.to_string())?)
        }
        "resync" => Event::Resync,
        "reconnect" => Event::Reconnect,
        "status" => Event::Status,
        "list" => Event::List,
        "help" | "?" => Event::Help,
        "quit" | "exit" => Event::Quit,
        _ if arg.is_none() => Event::Send(lookup(verb).map_err(|e| e.to_string())?),
        _ => return Err(format!("unknown verb: {verb}")),
    };
    Ok(Some(event))
}

/// Operator session over one link. Holds the link for its whole life; dropping
/// the session closes it.
pub struct Session {
    motion: MotionController,
    resync_on_connect: bool,
}

impl Session {
    pub fn new(link: Link, resync_on_connect: bool) -> Self {
        Self {
            motion: MotionController::new(Arc::new(Dispatcher::new(link))),
            resync_on_connect,
        }
    }

    /// Handles one event and returns the lines to show the operator.
    pub fn handle(&self, event: Event) -> Result<Vec<String>, FrameError> {
        let lines = match event {
            Event::Press(dir) => match self.motion.press(dir)? {
                Some(outcome) => vec![outcome.status(dir.command())],
                None => vec![format!("already moving {dir}")],
            },
            Event::Release(dir) => match self.motion.release(dir)? {
                Some(outcome) => vec![outcome.status(dir.group().stop_command())],
                None => vec![format!("{dir} not active, release ignored")],
            },
            Event::Send(name) => vec![self.motion.send(name)?.status(name)],
            Event::Resync => self.resync()?,
            Event::Reconnect => {
                let dispatcher = self.motion.dispatcher();
                match dispatcher.reconnect() {
                    Ok(()) => {
                        let mut lines = vec![format!("connected to {}", dispatcher.describe())];
                        if self.resync_on_connect {
                            lines.extend(self.resync()?);
                        }
                        lines
                    }
                    Err(e) => vec![format!("error: {e}")],
                }
            }
            Event::Status => vec![
                format!(
                    "link {} {:?}",
                    self.motion.dispatcher().describe(),
                    self.motion.dispatcher().state()
                ),
                format!("pan_tilt {:?}", self.motion.state(AxisGroup::PanTilt)),
                format!("zoom {:?}", self.motion.state(AxisGroup::Zoom)),
            ],
            Event::List => print_table(),
            Event::Help => HELP.lines().map(str::to_string).collect(),
            Event::Quit => Vec::new(),
        };
        Ok(lines)
    }

    pub fn resync(&self) -> Result<Vec<String>, FrameError> {
        Ok(self
            .motion
            .resync()?
            .into_iter()
            .map(|(name, outcome)| outcome.status(name))
            .collect())
    }

    /// Reads events until `quit` or end of input.
    pub fn run(&self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        if self.resync_on_connect {
            for line in self.resync()? {
                writeln!(output, "{line}")?;
            }
        }
        for line in input.lines() {
            let line = line.context("reading console input")?;
            let event = match parse_event(&line) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(msg) => {
                    writeln!(output, "{msg}")?;
                    continue;
                }
            };
            if event == Event::Quit {
                break;
            }
            for status in self.handle(event)? {
                writeln!(output, "{status}")?;
            }
            output.flush()?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn motion(&self) -> &MotionController {
        &self.motion
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.motion.dispatcher().close();
    }
}

pub fn run(opts: ConsoleOpts) -> Result<()> {
    let config = opts.link.link_config()?;
    let link = Link::open(config).context("opening link")?;
    println!("connected to {} (type 'help')", link.describe());

    let session = Session::new(link, !opts.skip_resync);
    let stdin = std::io::stdin();
    session.run(stdin.lock(), std::io::stdout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Framing;
    use crate::link::LinkState;
    use crate::link::fake::{Reply, Wire};
    use crate::motion::AxisState;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn session(wire: &Wire, resync: bool) -> Session {
        let link = Link::from_channel(wire.channel(), Framing::Raw, Duration::from_secs(1));
        Session::new(link, resync)
    }

    #[test]
    fn parses_events() {
        assert_eq!(
            parse_event("press left").unwrap(),
            Some(Event::Press(Direction::Left))
        );
        assert_eq!(
            parse_event("  RELEASE zoom_out ").unwrap(),
            Some(Event::Release(Direction::ZoomOut))
        );
        assert_eq!(
            parse_event("send take_picture").unwrap(),
            Some(Event::Send(CommandName::TakePicture))
        );
        assert_eq!(
            parse_event("recenter").unwrap(),
            Some(Event::Send(CommandName::Recenter))
        );
        assert_eq!(parse_event("").unwrap(), None);
        assert_eq!(parse_event("quit").unwrap(), Some(Event::Quit));
    }

    #[test]
    fn rejects_bad_events() {
        assert!(parse_event("press").is_err());
        assert!(parse_event("press stop").is_err());
        assert!(parse_event("send").is_err());
        assert!(parse_event("send nope").is_err());
        assert!(parse_event("fly away").is_err());
        assert!(parse_event("press left now").is_err());
        assert!(parse_event("teleport").is_err());
    }

    #[test]
    fn console_script() {
        let wire = Wire::default();
        wire.push_reply(Reply::Bytes(vec![0x55, 0xAA]));
        let s = session(&wire, false);
        let input = b"press left\npress left\nrelease right\nrelease left\nbogus\nquit\npress up\n";
        let mut out = Vec::new();
        s.run(&input[..], &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            vec![
                "sent left, received: 55 AA",
                "already moving left",
                "right not active, release ignored",
                "sent stop, received: -",
                "unknown command: bogus",
            ]
        );
        assert_eq!(wire.writes().len(), 2);
    }

    #[test]
    fn resyncs_on_start() {
        let wire = Wire::default();
        let s = session(&wire, true);
        let mut out = Vec::new();
        s.run(&b""[..], &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "sent stop, received: -\nsent stop_zoom, received: -\n"
        );
    }

    #[test]
    fn fault_is_reported_and_sticky() {
        let wire = Wire::default();
        wire.fail_writes.store(true, Ordering::SeqCst);
        let s = session(&wire, false);
        let lines = s.handle(Event::Press(Direction::Up)).unwrap();
        assert!(lines[0].starts_with("error: "));
        assert_eq!(s.motion().state(AxisGroup::PanTilt), AxisState::Idle);

        wire.fail_writes.store(false, Ordering::SeqCst);
        let lines = s.handle(Event::Send(CommandName::Recenter)).unwrap();
        assert_eq!(lines, vec!["error: link faulted, reconnect first".to_string()]);
        assert!(wire.writes().is_empty());

        // attached links have no target to reopen
        let lines = s.handle(Event::Reconnect).unwrap();
        assert!(lines[0].starts_with("error: "));
        assert_eq!(s.motion().dispatcher().state(), LinkState::Disconnected);
    }

    #[test]
    fn status_reports_axes() {
        let wire = Wire::default();
        let s = session(&wire, false);
        s.handle(Event::Press(Direction::ZoomIn)).unwrap();
        let lines = s.handle(Event::Status).unwrap();
        assert_eq!(lines[1], "pan_tilt Idle");
        assert_eq!(lines[2], "zoom Moving(ZoomIn)");
    }

    #[test]
    fn dropping_session_closes_link_once() {
        let wire = Wire::default();
        let s = session(&wire, false);
        drop(s);
        assert_eq!(wire.drops.load(Ordering::SeqCst), 1);
    }
}
