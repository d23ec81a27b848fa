#![no_std]

pub use protocol::Command;

mod car;
mod dispatch;

pub use car::Car;
pub use dispatch::{Dispatch, Dispatcher};

/// Target for a single motor.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setpoint {
    Duty(i8), // [-100..100]
    Stop,
}

impl Setpoint {
    /// Clamps the duty cycle into [-100, 100].
    pub fn duty(value: i16) -> Self {
        Setpoint::Duty(value.clamp(-100, 100) as i8)
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorPair {
    pub right: Setpoint,
    pub left: Setpoint,
}

impl MotorPair {
    pub const STOPPED: MotorPair = MotorPair {
        right: Setpoint::Stop,
        left: Setpoint::Stop,
    };

    pub fn new(right: Setpoint, left: Setpoint) -> Self {
        MotorPair { right, left }
    }
}

/// A single motor output, e.g. one PWM channel of an H-bridge.
pub trait Actuator {
    /// Drives the motor with a signed duty cycle in percent.
    fn dc(&mut self, duty: i8);
    fn stop(&mut self);

    fn set(&mut self, setpoint: Setpoint) {
        match setpoint {
            Setpoint::Duty(duty) => self.dc(duty),
            Setpoint::Stop => self.stop(),
        }
    }
}

/// Maps drive commands onto the motors of a vehicle type.
pub trait Drivetrain {
    fn translate(&self, cmd: &Command) -> MotorPair;
}
