use protocol::Command;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;

use crate::input::{InputSource, InputState, Trigger};
use crate::link::{CommandWriter, GatedLink};
use crate::Error;

/// Pause before sampling again when no rule fired.
pub const IDLE_TICK: Duration = Duration::from_millis(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modifier {
    /// Neither Dpad direction is held.
    Plain,
    Left,
    Right,
}

/// One row of the decision table.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub trigger: Trigger,
    pub modifier: Modifier,
    pub command: Command,
}

impl Rule {
    pub fn matches(&self, state: &InputState) -> bool {
        state.pressed(self.trigger)
            && match self.modifier {
                Modifier::Plain => !state.dpad_left && !state.dpad_right,
                Modifier::Left => state.dpad_left,
                Modifier::Right => state.dpad_right,
            }
    }
}

/// Evaluated in order on every tick. The rules do not exclude each other, all
/// matching rules send their command.
pub const RULES: [Rule; 6] = [
    Rule {
        trigger: Trigger::R2,
        modifier: Modifier::Plain,
        command: Command::Forward,
    },
    Rule {
        trigger: Trigger::R2,
        modifier: Modifier::Right,
        command: Command::PivotRightForward,
    },
    Rule {
        trigger: Trigger::R2,
        modifier: Modifier::Left,
        command: Command::PivotLeftForward,
    },
    Rule {
        trigger: Trigger::L2,
        modifier: Modifier::Plain,
        command: Command::Reverse,
    },
    Rule {
        trigger: Trigger::L2,
        modifier: Modifier::Right,
        command: Command::PivotRightReverse,
    },
    Rule {
        trigger: Trigger::L2,
        modifier: Modifier::Left,
        command: Command::PivotLeftReverse,
    },
];

pub struct Controller<I, W> {
    input: I,
    link: GatedLink<W>,
    idle: Duration,
}

impl<I: InputSource, W: CommandWriter> Controller<I, W> {
    pub fn new(input: I, link: GatedLink<W>) -> Self {
        Controller {
            input,
            link,
            idle: IDLE_TICK,
        }
    }

    pub fn with_idle(mut self, idle: Duration) -> Self {
        self.idle = idle;
        self
    }

    /// Drives the hub until the input source closes, then tells the hub to
    /// shut down. Dropping the future cancels the session.
    pub async fn run(&mut self) -> Result<(), Error> {
        while self.tick().await? {}

        info!("Input closed, shutting down hub");
        self.link.send(Command::Shutdown).await
    }

    /// Walks the decision table once. Returns false when the input source is
    /// gone.
    pub async fn tick(&mut self) -> Result<bool, Error> {
        let mut sent = false;
        for rule in RULES.iter() {
            let Some(state) = self.input.sample() else {
                return Ok(false);
            };
            if !rule.matches(&state) {
                continue;
            }
            self.link.send(rule.command).await?;
            sent = true;

            // the trigger may have been let go in the meantime
            let Some(state) = self.input.sample() else {
                return Ok(false);
            };
            if state.released(rule.trigger) {
                self.link.send(Command::Stop).await?;
            }
        }

        if !sent {
            sleep(self.idle).await;
        }
        Ok(true)
    }
}
