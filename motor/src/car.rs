use crate::Command;
use crate::Drivetrain;
use crate::MotorPair;
use crate::Setpoint;

const FULL_SPEED: i8 = 50;
const HALF_SPEED: i8 = 25;

/// Two-wheel differential drive. The right motor is mounted mirrored, so
/// driving forward means a negative duty cycle on the right side.
pub struct Car {
    full: i8,
    half: i8,
}

impl Car {
    pub fn new() -> Self {
        Car::with_speeds(FULL_SPEED, HALF_SPEED)
    }

    /// Speeds in percent, clamped to [0, 100]. `half` is used for the inner
    /// wheel while pivoting.
    pub fn with_speeds(full: i8, half: i8) -> Self {
        Car {
            full: full.clamp(0, 100),
            half: half.clamp(0, 100),
        }
    }
}

impl Default for Car {
    fn default() -> Self {
        Car::new()
    }
}

impl Drivetrain for Car {
    fn translate(&self, cmd: &Command) -> MotorPair {
        let (full, half) = (i16::from(self.full), i16::from(self.half));
        let (right, left) = match cmd {
            Command::Forward => (-full, full),
            Command::Reverse => (full, -full),
            Command::PivotRightForward => (-full, half),
            Command::PivotLeftForward => (-half, full),
            Command::PivotRightReverse => (full, -half),
            Command::PivotLeftReverse => (half, -full),
            Command::Stop | Command::Shutdown | Command::Unknown => return MotorPair::STOPPED,
        };
        MotorPair::new(Setpoint::duty(right), Setpoint::duty(left))
    }
}
