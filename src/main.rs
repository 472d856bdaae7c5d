use anyhow::Result;
use clap::Parser;

mod cli;
mod command;
mod console;
mod dispatch;
mod frame;
mod link;
mod logging;
mod motion;
mod oneshot;
mod port;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    logging::init(args.debug);
    match args.cmd {
        cli::Cmd::List => oneshot::list(),
        cli::Cmd::Frame(opts) => oneshot::frame(opts),
        cli::Cmd::Send(opts) => oneshot::send(opts),
        cli::Cmd::Console(opts) => console::run(opts),
    }
}
