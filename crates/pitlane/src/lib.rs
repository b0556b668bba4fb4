pub mod control;
pub mod net;

pub use control::{Driver, DriverConfig, IdleDriver, Pid, SimpleDriver, WithAngles, default_angles};
pub use net::{
    AngleLayout, ClientConfig, DEFAULT_CLIENT_ID, DEFAULT_HOST, DEFAULT_PORT, DecodeSummary,
    DriveCommand, NetworkEndpoint, NetworkStats, Session, SessionError, SessionPhase,
    SessionStats, Termination, VehicleState,
};
