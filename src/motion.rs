//! Hold-to-move control.
//!
//! The gimbal only knows velocity-style motion: a direction command starts it
//! and it keeps going until a stop arrives. Press and release events from the
//! operator are folded into that start/stop protocol here, one state machine per
//! axis group.

use std::sync::Arc;

use parking_lot::Mutex;
use strum::{Display, EnumString};
use tracing::debug;

use crate::command::CommandName;
use crate::dispatch::{Dispatcher, Outcome};
use crate::frame::FrameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    ZoomIn,
    ZoomOut,
}

impl Direction {
    pub fn group(self) -> AxisGroup {
        match self {
            Direction::Left | Direction::Right | Direction::Up | Direction::Down => {
                AxisGroup::PanTilt
            }
            Direction::ZoomIn | Direction::ZoomOut => AxisGroup::Zoom,
        }
    }

    pub fn command(self) -> CommandName {
        match self {
            Direction::Left => CommandName::Left,
            Direction::Right => CommandName::Right,
            Direction::Up => CommandName::Up,
            Direction::Down => CommandName::Down,
            Direction::ZoomIn => CommandName::ZoomIn,
            Direction::ZoomOut => CommandName::ZoomOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisGroup {
    PanTilt,
    Zoom,
}

impl AxisGroup {
    pub fn stop_command(self) -> CommandName {
        match self {
            AxisGroup::PanTilt => CommandName::Stop,
            AxisGroup::Zoom => CommandName::StopZoom,
        }
    }

    /// The group a command halts, if it is one of the stop commands.
    pub fn stopped_by(name: CommandName) -> Option<AxisGroup> {
        match name {
            CommandName::Stop => Some(AxisGroup::PanTilt),
            CommandName::StopZoom => Some(AxisGroup::Zoom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisState {
    Idle,
    Moving(Direction),
}

pub struct MotionController {
    dispatcher: Arc<Dispatcher>,
    pan_tilt: Mutex<AxisState>,
    zoom: Mutex<AxisState>,
}

impl MotionController {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            pan_tilt: Mutex::new(AxisState::Idle),
            zoom: Mutex::new(AxisState::Idle),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn state(&self, group: AxisGroup) -> AxisState {
        *self.axis(group).lock()
    }

    /// Starts motion in `dir`. Returns `None` when already moving that way.
    /// A press in another direction of the same group replaces the current
    /// motion without an intervening stop.
    pub fn press(&self, dir: Direction) -> Result<Option<Outcome>, FrameError> {
        let mut state = self.axis(dir.group()).lock();
        if *state == AxisState::Moving(dir) {
            debug!(%dir, "repeated press ignored");
            return Ok(None);
        }
        let outcome = self.dispatcher.send(dir.command())?;
        // the device never confirmed the start, so nothing is moving
        *state = if outcome.is_failure() {
            AxisState::Idle
        } else {
            AxisState::Moving(dir)
        };
        Ok(Some(outcome))
    }

    /// Stops motion in `dir`. A release that does not match the active
    /// direction is stale and ignored.
    pub fn release(&self, dir: Direction) -> Result<Option<Outcome>, FrameError> {
        let group = dir.group();
        let mut state = self.axis(group).lock();
        if *state != AxisState::Moving(dir) {
            debug!(%dir, state = ?*state, "stale release ignored");
            return Ok(None);
        }
        let outcome = self.dispatcher.send(group.stop_command());
        *state = AxisState::Idle;
        outcome.map(Some)
    }

    /// One-shot command. Stop commands also reset their axis group.
    pub fn send(&self, name: CommandName) -> Result<Outcome, FrameError> {
        match AxisGroup::stopped_by(name) {
            Some(group) => {
                let mut state = self.axis(group).lock();
                let outcome = self.dispatcher.send(name);
                *state = AxisState::Idle;
                outcome
            }
            None => self.dispatcher.send(name),
        }
    }

    /// Stops both groups unconditionally. Used when (re)taking control of a
    /// device whose motion state is unknown.
    pub fn resync(&self) -> Result<Vec<(CommandName, Outcome)>, FrameError> {
        let mut out = Vec::with_capacity(2);
        for group in [AxisGroup::PanTilt, AxisGroup::Zoom] {
            let name = group.stop_command();
            out.push((name, self.send(name)?));
        }
        Ok(out)
    }

    fn axis(&self, group: AxisGroup) -> &Mutex<AxisState> {
        match group {
            AxisGroup::PanTilt => &self.pan_tilt,
            AxisGroup::Zoom => &self.zoom,
        }
    }
}
