use std::fmt::Write;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CLIENT_ID: &str = "SCR";

pub const IDENTIFIED_MARKER: &str = "***identified***";
pub const SHUTDOWN_MARKER: &str = "***shutdown***";
pub const RESTART_MARKER: &str = "***restart***";

pub const FOCUS_SENSOR_COUNT: usize = 5;
pub const TRACK_SENSOR_COUNT: usize = 19;
pub const OPPONENT_SENSOR_COUNT: usize = 36;
pub const WHEEL_COUNT: usize = 4;

/// Range-finder orientation requested at handshake, one angle in degrees per track sensor.
pub type AngleLayout = [f64; TRACK_SENSOR_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage<'a> {
    Shutdown,
    Restart,
    State(&'a str),
}

impl<'a> ServerMessage<'a> {
    /// Classifies a datagram received after the handshake. Shutdown wins over restart,
    /// anything else (including a late identification ack) is treated as state.
    pub fn classify(text: &'a str) -> Self {
        if text.starts_with(SHUTDOWN_MARKER) {
            ServerMessage::Shutdown
        } else if text.starts_with(RESTART_MARKER) {
            ServerMessage::Restart
        } else {
            ServerMessage::State(text)
        }
    }
}

pub fn is_identified(text: &str) -> bool {
    text.starts_with(IDENTIFIED_MARKER)
}

pub fn init_message(client_id: &str, angles: &AngleLayout) -> String {
    let mut message = String::with_capacity(client_id.len() + 8 + angles.len() * 4);
    message.push_str(client_id);
    message.push_str("(init");
    for angle in angles {
        let _ = write!(message, " {}", angle);
    }
    message.push(')');
    message
}
