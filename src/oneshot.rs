use anyhow::{Context, Result, bail};
use strum::IntoEnumIterator;
use tracing::debug;

use crate::cli::{FrameOpts, SendOpts};
use crate::command::{CommandName, lookup, payload_for};
use crate::dispatch::Dispatcher;
use crate::frame::{encode, to_hex, verify_trailer};
use crate::link::Link;

/// One line per command: name, length, trailer check, payload hex.
pub fn print_table() -> Vec<String> {
    CommandName::iter()
        .map(|name| {
            let payload = payload_for(name);
            let check = match verify_trailer(payload) {
                Ok(()) => "ok".to_string(),
                Err(e) => e.to_string(),
            };
            format!(
                "{:<15} {:>2}B {:<4} {}",
                name.name(),
                payload.len(),
                check,
                to_hex(payload)
            )
        })
        .collect()
}

pub fn list() -> Result<()> {
    for line in print_table() {
        println!("{line}");
    }
    Ok(())
}

pub fn frame(opts: FrameOpts) -> Result<()> {
    let name = lookup(&opts.command)?;
    let frame = encode(payload_for(name), opts.framing)?;
    println!("{} [{}] {}", name, opts.framing.as_str(), to_hex(&frame));
    Ok(())
}

pub fn send(opts: SendOpts) -> Result<()> {
    // resolve everything before touching the link
    let names = opts
        .commands
        .iter()
        .map(|c| lookup(c))
        .collect::<Result<Vec<_>, _>>()?;

    let config = opts.link.link_config()?;
    let link = Link::open(config).context("opening link")?;
    let dispatcher = Dispatcher::new(link);
    debug!(link = %dispatcher.describe(), count = names.len(), "sending");

    for name in names {
        let outcome = dispatcher.send(name)?;
        println!("{}", outcome.status(name));
        if outcome.is_failure() {
            bail!("{name} failed, link is down");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lists_every_command() {
        let lines = print_table();
        assert_eq!(lines.len(), CommandName::iter().count());
        assert!(lines[0].starts_with("left"));
        assert!(lines.iter().all(|l| l.contains(" ok ")));
        let zoom20x = lines.iter().find(|l| l.starts_with("zoom20x")).unwrap();
        assert!(zoom20x.contains("16B"));
        assert!(zoom20x.ends_with("A7"));
    }
}
