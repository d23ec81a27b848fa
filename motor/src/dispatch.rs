use crate::Actuator;
use crate::Command;
use crate::Drivetrain;
use crate::MotorPair;

/// Applies received commands to the motors.
pub trait Dispatch {
    fn apply(&mut self, cmd: Command) -> MotorPair;
}

/// Owns both motors of a differential vehicle. Every `apply` sets the right
/// and then the left motor, with nothing in between.
pub struct Dispatcher<D, R, L> {
    drivetrain: D,
    right: R,
    left: L,
}

impl<D: Drivetrain, R: Actuator, L: Actuator> Dispatcher<D, R, L> {
    pub fn new(drivetrain: D, right: R, left: L) -> Self {
        Dispatcher {
            drivetrain,
            right,
            left,
        }
    }

    pub fn release(self) -> (R, L) {
        (self.right, self.left)
    }
}

impl<D: Drivetrain, R: Actuator, L: Actuator> Dispatch for Dispatcher<D, R, L> {
    fn apply(&mut self, cmd: Command) -> MotorPair {
        let pair = self.drivetrain.translate(&cmd);
        self.right.set(pair.right);
        self.left.set(pair.left);
        pair
    }
}
