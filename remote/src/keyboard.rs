use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::input::{Input, InputState, Trigger};
use crate::Error;

const TICK: Duration = Duration::from_millis(10);

/// Terminals do not report key releases, a key counts as held until no key
/// event arrived for this long.
pub const DECAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Input(Input),
    Quit,
    Ignored,
}

pub fn map_key(event: &KeyEvent) -> Key {
    if event.kind == KeyEventKind::Release {
        return Key::Ignored;
    }
    let plain = event.modifiers == KeyModifiers::NONE;
    let control = event.modifiers == KeyModifiers::CONTROL;
    match event.code {
        // stop remote
        // - ESC
        // - CTRL+C
        // - CTRL+D
        KeyCode::Esc => Key::Quit,
        KeyCode::Char('c' | 'd') if control => Key::Quit,

        KeyCode::Up => Key::Input(Input::Trigger(Trigger::R2, u8::MAX)),
        KeyCode::Char('w') if plain => Key::Input(Input::Trigger(Trigger::R2, u8::MAX)),
        KeyCode::Down => Key::Input(Input::Trigger(Trigger::L2, u8::MAX)),
        KeyCode::Char('s') if plain => Key::Input(Input::Trigger(Trigger::L2, u8::MAX)),
        KeyCode::Left => Key::Input(Input::DpadLeft(true)),
        KeyCode::Char('a') if plain => Key::Input(Input::DpadLeft(true)),
        KeyCode::Right => Key::Input(Input::DpadRight(true)),
        KeyCode::Char('d') if plain => Key::Input(Input::DpadRight(true)),
        _ => Key::Ignored,
    }
}

/// Key state with release emulation.
#[derive(Debug)]
pub struct Keys {
    state: InputState,
    last_event: Option<Instant>,
}

impl Keys {
    pub fn new() -> Self {
        Keys {
            state: InputState::default(),
            last_event: None,
        }
    }

    pub fn state(&self) -> InputState {
        self.state
    }

    pub fn press(&mut self, input: Input, now: Instant) {
        self.state.apply(input);
        self.last_event = Some(now);
    }

    /// Releases everything once `DECAY` passed since the last key. Returns
    /// true if the state changed.
    pub fn decay(&mut self, now: Instant) -> bool {
        match self.last_event {
            Some(last) if now.duration_since(last) > DECAY => {
                self.last_event = None;
                self.state = InputState::default();
                true
            }
            _ => false,
        }
    }
}

impl Default for Keys {
    fn default() -> Self {
        Keys::new()
    }
}

struct RawMode;

impl RawMode {
    fn enable() -> Result<Self, Error> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            warn!("could not restore terminal: {e}");
        }
    }
}

/// Log output that stays readable while the terminal is in raw mode, where a
/// bare `\n` does not return the cursor.
pub struct CrLf<W>(pub W);

impl<W: io::Write> io::Write for CrLf<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut lines = buf.split(|&b| b == b'\n');
        if let Some(first) = lines.next() {
            self.0.write_all(first)?;
        }
        for line in lines {
            self.0.write_all(b"\r\n")?;
            self.0.write_all(line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// Writer for the log subscriber.
pub fn stderr() -> CrLf<io::Stderr> {
    CrLf(io::stderr())
}

/// Reads the terminal in raw mode on a background task. The returned
/// receiver closes when the operator quits.
pub fn spawn() -> Result<watch::Receiver<InputState>, Error> {
    let raw_mode = RawMode::enable()?;
    let (tx, rx) = watch::channel(InputState::default());

    tokio::spawn(async move {
        let _raw_mode = raw_mode;
        let mut reader = EventStream::new();
        let mut keys = Keys::new();

        loop {
            tokio::select! {
                maybe_event = reader.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(event))) => match map_key(&event) {
                            Key::Input(input) => {
                                keys.press(input, Instant::now());
                                tx.send_replace(keys.state());
                            }
                            Key::Quit => break,
                            Key::Ignored => {}
                        },
                        Some(Ok(_)) => {}
                        Some(Err(e)) => warn!("Error: {e:?}"),
                        None => break,
                    }
                }
                _ = sleep(TICK) => {
                    if keys.decay(Instant::now()) {
                        tx.send_replace(keys.state());
                    }
                    if tx.is_closed() {
                        break;
                    }
                }
            }
        }
        debug!("keyboard closed");
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Key {
        map_key(&KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_map_key() {
        let full_r2 = Key::Input(Input::Trigger(Trigger::R2, 255));
        assert_eq!(key(KeyCode::Up, KeyModifiers::NONE), full_r2);
        assert_eq!(key(KeyCode::Char('w'), KeyModifiers::NONE), full_r2);

        let full_l2 = Key::Input(Input::Trigger(Trigger::L2, 255));
        assert_eq!(key(KeyCode::Down, KeyModifiers::NONE), full_l2);
        assert_eq!(key(KeyCode::Char('s'), KeyModifiers::NONE), full_l2);

        assert_eq!(
            key(KeyCode::Char('a'), KeyModifiers::NONE),
            Key::Input(Input::DpadLeft(true))
        );
        assert_eq!(
            key(KeyCode::Right, KeyModifiers::NONE),
            Key::Input(Input::DpadRight(true))
        );
        assert_eq!(key(KeyCode::Char('x'), KeyModifiers::NONE), Key::Ignored);
    }

    #[test]
    fn test_quit_keys() {
        assert_eq!(key(KeyCode::Esc, KeyModifiers::NONE), Key::Quit);
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), Key::Quit);
        assert_eq!(key(KeyCode::Char('d'), KeyModifiers::CONTROL), Key::Quit);
        // plain 'd' steers
        assert_ne!(key(KeyCode::Char('d'), KeyModifiers::NONE), Key::Quit);
    }

    #[test]
    fn test_release_events_ignored() {
        let event = KeyEvent::new_with_kind(KeyCode::Up, KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(map_key(&event), Key::Ignored);
    }

    #[test]
    fn test_crlf() {
        use std::io::Write;

        let mut out = CrLf(Vec::new());
        out.write_all(b"Send: fwd\n").unwrap();
        out.write_all(b"Received: a\nb\n").unwrap();
        out.write_all(b"no newline").unwrap();
        assert_eq!(
            out.0,
            b"Send: fwd\r\nReceived: a\r\nb\r\nno newline".to_vec()
        );
    }

    #[test]
    fn test_decay() {
        let start = Instant::now();
        let mut keys = Keys::new();
        assert!(!keys.decay(start + DECAY * 2));

        keys.press(Input::Trigger(Trigger::R2, 255), start);
        keys.press(Input::DpadLeft(true), start + DECAY / 2);
        assert!(keys.state().pressed(Trigger::R2));

        // measured from the last key
        assert!(!keys.decay(start + DECAY + Duration::from_millis(10)));
        assert!(keys.state().dpad_left);

        assert!(keys.decay(start + DECAY * 2));
        assert_eq!(keys.state(), InputState::default());
        assert!(!keys.decay(start + DECAY * 3));
    }
}
