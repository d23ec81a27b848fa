#![cfg_attr(not(test), no_std)]

//! Hub side of the command channel.
//!
//! The hub announces that it is ready, waits for one frame, drives the motors
//! and starts over. Only `bye` ends the loop. Anything that cannot be decoded
//! stops the motors instead of raising an error, so the vehicle always ends up
//! in a known state.

mod fmt;

use embedded_hal_async::delay::DelayNs;
use embedded_io::{Error as _, Read, ReadReady, Write};
use motor::Dispatch;
use protocol::{Command, Frame, FRAME_LEN, READY};

/// Default time between two polls of the input stream.
pub const POLL_INTERVAL_MS: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Announce readiness for the next frame.
    Idle,
    /// Poll the input stream until data is available.
    AwaitingFrame,
    /// Apply a received command to the motors.
    Dispatching(Command),
    /// Terminal state, entered after `bye`.
    ShutDown,
}

pub struct HubLink<Rx, Tx, D, M> {
    rx: Rx,
    tx: Tx,
    delay: D,
    motors: M,
    state: State,
    poll_interval_ms: u32,
}

impl<Rx, Tx, D, M> HubLink<Rx, Tx, D, M>
where
    Rx: Read + ReadReady,
    Tx: Write,
    D: DelayNs,
    M: Dispatch,
{
    pub fn new(rx: Rx, tx: Tx, delay: D, motors: M) -> Self {
        HubLink {
            rx,
            tx,
            delay,
            motors,
            state: State::Idle,
            poll_interval_ms: POLL_INTERVAL_MS,
        }
    }

    pub fn with_poll_interval(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn motors(&self) -> &M {
        &self.motors
    }

    /// Runs until the remote sends `bye`.
    pub async fn run(&mut self) {
        info!("Waiting for commands ...");
        while self.step().await != State::ShutDown {}
        info!("Shut down");
    }

    /// Performs a single state transition and returns the new state.
    pub async fn step(&mut self) -> State {
        self.state = match self.state {
            State::Idle => {
                self.announce();
                State::AwaitingFrame
            }
            State::AwaitingFrame => match self.rx.read_ready() {
                Ok(true) => State::Dispatching(self.read_frame()),
                Ok(false) => {
                    self.delay.delay_ms(self.poll_interval_ms).await;
                    State::AwaitingFrame
                }
                Err(e) => {
                    // keep polling, the link may come back
                    debug!("Polling input failed: {}", e.kind());
                    self.delay.delay_ms(self.poll_interval_ms).await;
                    State::AwaitingFrame
                }
            },
            State::Dispatching(cmd) => {
                let motors = self.motors.apply(cmd);
                debug!("{} -> {}", cmd, motors);
                match cmd {
                    Command::Shutdown => State::ShutDown,
                    _ => State::Idle,
                }
            }
            State::ShutDown => State::ShutDown,
        };
        self.state
    }

    fn announce(&mut self) {
        if let Err(e) = self.tx.write_all(READY) {
            warn!("Failed to announce readiness: {}", e.kind());
            return;
        }
        if let Err(e) = self.tx.flush() {
            warn!("Failed to flush output: {}", e.kind());
        }
    }

    /// Reads one frame without blocking. Whatever is available beyond the
    /// first short read is taken, but a frame that is still incomplete
    /// afterwards decodes as `Unknown`.
    fn read_frame(&mut self) -> Command {
        let mut buf = [0u8; FRAME_LEN];
        let mut len = 0;
        while len < FRAME_LEN {
            match self.rx.read(&mut buf[len..]) {
                Ok(0) => break,
                Ok(n) => len += n,
                Err(e) => {
                    warn!("Failed to read frame: {}", e.kind());
                    break;
                }
            }
            if len < FRAME_LEN && !matches!(self.rx.read_ready(), Ok(true)) {
                break;
            }
        }

        let frame = match Frame::try_from(&buf[..len]) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Malformed frame: {}, stopping", e);
                return Command::Unknown;
            }
        };
        let cmd = frame.command();
        if cmd == Command::Unknown {
            warn!("Unknown command {=[u8]:a}, stopping", &frame.as_bytes()[..]);
        }
        cmd
    }
}
