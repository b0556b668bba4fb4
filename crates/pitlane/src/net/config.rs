use std::time::Duration;

use super::protocol::DEFAULT_CLIENT_ID;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identifier prefixed to the init message; the server routes clients by it.
    pub client_id: String,
    /// How long to wait for the identification ack before resending the init message.
    /// Values below one millisecond are raised to it.
    pub handshake_timeout: Duration,
    pub recv_buffer_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            handshake_timeout: Duration::from_secs(1),
            recv_buffer_size: 4096,
        }
    }
}
