use tokio::sync::watch;

/// Trigger values above this count as pressed, values below as released.
pub const THRESHOLD: u8 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    R2,
    L2,
}

/// Snapshot of the controls the remote reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    // [0..255]
    pub r2: u8,
    pub l2: u8,
    pub dpad_left: bool,
    pub dpad_right: bool,
}

/// A single change reported by an input device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    Trigger(Trigger, u8),
    DpadLeft(bool),
    DpadRight(bool),
}

impl InputState {
    pub fn trigger(&self, trigger: Trigger) -> u8 {
        match trigger {
            Trigger::R2 => self.r2,
            Trigger::L2 => self.l2,
        }
    }

    pub fn pressed(&self, trigger: Trigger) -> bool {
        self.trigger(trigger) > THRESHOLD
    }

    pub fn released(&self, trigger: Trigger) -> bool {
        self.trigger(trigger) < THRESHOLD
    }

    pub fn apply(&mut self, input: Input) {
        match input {
            Input::Trigger(Trigger::R2, value) => self.r2 = value,
            Input::Trigger(Trigger::L2, value) => self.l2 = value,
            Input::DpadLeft(pressed) => self.dpad_left = pressed,
            Input::DpadRight(pressed) => self.dpad_right = pressed,
        }
    }
}

/// Maps an analog trigger value [0.0..1.0] onto [0..255].
pub fn scale_trigger(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * f32::from(u8::MAX)).round() as u8
}

/// Source of the current input state. `None` once the device is gone.
pub trait InputSource {
    fn sample(&mut self) -> Option<InputState>;
}

impl InputSource for watch::Receiver<InputState> {
    fn sample(&mut self) -> Option<InputState> {
        if self.has_changed().is_err() {
            return None;
        }
        Some(*self.borrow_and_update())
    }
}
