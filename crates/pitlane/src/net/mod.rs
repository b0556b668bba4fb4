mod command;
mod config;
mod protocol;
mod session;
mod state;
mod transport;

pub use command::DriveCommand;
pub use config::ClientConfig;
pub use protocol::{
    AngleLayout, DEFAULT_CLIENT_ID, DEFAULT_HOST, DEFAULT_PORT, FOCUS_SENSOR_COUNT,
    IDENTIFIED_MARKER, OPPONENT_SENSOR_COUNT, RESTART_MARKER, SHUTDOWN_MARKER, ServerMessage,
    TRACK_SENSOR_COUNT, WHEEL_COUNT, init_message, is_identified,
};
pub use session::{Session, SessionError, SessionPhase, SessionStats, Termination};
pub use state::{DecodeError, DecodeSummary, VehicleState};
pub use transport::{NetworkEndpoint, NetworkStats};
