use crate::net::{AngleLayout, DriveCommand, TRACK_SENSOR_COUNT, VehicleState};

/// A driving policy: the only thing a [`Session`](crate::net::Session) needs from the code
/// that actually decides what the car does.
pub trait Driver {
    /// Track range-finder angles to request from the server during the handshake.
    fn init_angles(&self) -> AngleLayout;

    /// Produces the command for one tick. Called exactly once per received snapshot.
    fn control(&mut self, state: &VehicleState) -> DriveCommand;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn init_angles(&self) -> AngleLayout {
        (**self).init_angles()
    }

    fn control(&mut self, state: &VehicleState) -> DriveCommand {
        (**self).control(state)
    }
}

/// Evenly spaced layout from -90° to 90° in 10° steps.
pub fn default_angles() -> AngleLayout {
    let mut angles = [0.0; TRACK_SENSOR_COUNT];
    for (i, angle) in angles.iter_mut().enumerate() {
        *angle = -90.0 + i as f64 * 10.0;
    }
    angles
}

/// Policy that never moves the car. Useful for connectivity checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleDriver;

impl Driver for IdleDriver {
    fn init_angles(&self) -> AngleLayout {
        default_angles()
    }

    fn control(&mut self, _state: &VehicleState) -> DriveCommand {
        DriveCommand::default()
    }
}

/// Replaces the angle layout of another driver while delegating control to it.
pub struct WithAngles<D, F> {
    driver: D,
    angles: F,
}

impl<D, F> WithAngles<D, F>
where
    D: Driver,
    F: Fn() -> AngleLayout,
{
    pub fn new(driver: D, angles: F) -> Self {
        Self { driver, angles }
    }

    pub fn into_inner(self) -> D {
        self.driver
    }
}

impl<D, F> Driver for WithAngles<D, F>
where
    D: Driver,
    F: Fn() -> AngleLayout,
{
    fn init_angles(&self) -> AngleLayout {
        (self.angles)()
    }

    fn control(&mut self, state: &VehicleState) -> DriveCommand {
        self.driver.control(state)
    }
}
