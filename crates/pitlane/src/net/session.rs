use std::io;
use std::net::SocketAddr;

use crate::control::Driver;

use super::command::DriveCommand;
use super::config::ClientConfig;
use super::protocol::{ServerMessage, init_message, is_identified};
use super::state::{DecodeSummary, VehicleState};
use super::transport::{NetworkEndpoint, NetworkStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Handshaking,
    Running,
    Terminated,
}

/// Why the server ended a session that terminated cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Shutdown,
    Restart,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("session already terminated")]
    Terminated,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub handshake_attempts: u64,
    pub handshake_timeouts: u64,
    pub ignored_replies: u64,
    pub ticks: u64,
    pub substituted_values: u64,
    pub unterminated_messages: u64,
    pub network: NetworkStats,
}

impl SessionStats {
    fn record_decode(&mut self, summary: &DecodeSummary) {
        self.substituted_values += summary.substituted as u64;
        if summary.unterminated {
            self.unterminated_messages += 1;
        }
    }
}

/// One vehicle's connection to the simulation server.
///
/// The session identifies itself, then answers every state snapshot with exactly one
/// command until the server sends a shutdown or restart marker. Socket, snapshot, command
/// and driver all belong to this session alone; run one session per vehicle.
pub struct Session<D> {
    endpoint: Option<NetworkEndpoint>,
    driver: D,
    config: ClientConfig,
    phase: SessionPhase,
    state: VehicleState,
    command: DriveCommand,
    outbound: String,
    stats: SessionStats,
}

impl<D: Driver> Session<D> {
    pub fn connect(server: SocketAddr, driver: D, config: ClientConfig) -> Result<Self, SessionError> {
        let endpoint = NetworkEndpoint::connect(server, config.recv_buffer_size)?;
        log::info!("Bound {} for server {}", endpoint.local_addr(), server);

        Ok(Self {
            endpoint: Some(endpoint),
            driver,
            config,
            phase: SessionPhase::Handshaking,
            state: VehicleState::default(),
            command: DriveCommand::default(),
            outbound: String::with_capacity(128),
            stats: SessionStats::default(),
        })
    }

    /// Runs the handshake (if not done yet) and the control loop to completion.
    ///
    /// The socket is released however the session ends.
    pub fn run(&mut self) -> Result<Termination, SessionError> {
        if self.phase == SessionPhase::Handshaking {
            self.handshake()?;
        }

        let result = self.control_loop();
        self.release();
        result
    }

    /// Sends the init message until the server identifies the client.
    ///
    /// Every timeout or unexpected reply triggers a resend of the same message; only a
    /// transport error ends the attempt, and it also terminates the session.
    pub fn handshake(&mut self) -> Result<(), SessionError> {
        match self.identify() {
            Ok(()) => {
                self.phase = SessionPhase::Running;
                Ok(())
            }
            Err(e) => {
                self.release();
                Err(e)
            }
        }
    }

    fn identify(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Handshaking {
            return Err(SessionError::Terminated);
        }
        let endpoint = self.endpoint.as_mut().ok_or(SessionError::Terminated)?;
        let init = init_message(&self.config.client_id, &self.driver.init_angles());
        let timeout = self.config.handshake_timeout;

        log::info!(
            "Identifying to {} as {:?}",
            endpoint.remote_addr(),
            self.config.client_id
        );

        loop {
            endpoint.send(init.as_bytes())?;
            self.stats.handshake_attempts += 1;

            let Some(reply) = endpoint.receive(Some(timeout))? else {
                self.stats.handshake_timeouts += 1;
                log::warn!("No reply from server within {:?}, resending init", timeout);
                continue;
            };

            let reply = String::from_utf8_lossy(reply);
            if is_identified(&reply) {
                log::info!(
                    "Identified after {} attempt(s)",
                    self.stats.handshake_attempts
                );
                return Ok(());
            }

            self.stats.ignored_replies += 1;
            log::warn!("Ignoring unexpected handshake reply: {}", reply);
        }
    }

    fn control_loop(&mut self) -> Result<Termination, SessionError> {
        let endpoint = self.endpoint.as_mut().ok_or(SessionError::Terminated)?;

        loop {
            let Some(data) = endpoint.receive(None)? else {
                continue;
            };

            let text = String::from_utf8_lossy(data);
            match ServerMessage::classify(&text) {
                ServerMessage::Shutdown => {
                    log::info!("Server requested shutdown");
                    return Ok(Termination::Shutdown);
                }
                ServerMessage::Restart => {
                    log::info!("Server requested restart");
                    return Ok(Termination::Restart);
                }
                ServerMessage::State(message) => {
                    let summary = self.state.decode(message);
                    self.stats.record_decode(&summary);
                }
            }

            self.command = self.driver.control(&self.state);
            self.command.encode_into(&mut self.outbound);
            endpoint.send(self.outbound.as_bytes())?;
            self.stats.ticks += 1;

            log::debug!(
                "tick {}: speed {:.1} gear {} -> accel {:.3} brake {:.3} steer {:.3} gear {}",
                self.stats.ticks,
                self.state.speed_x,
                self.state.gear,
                self.command.accelerator,
                self.command.brake,
                self.command.steering,
                self.command.gear
            );
        }
    }

    fn release(&mut self) {
        if let Some(endpoint) = self.endpoint.take() {
            self.stats.network = endpoint.stats().clone();
            log::debug!("Released {}", endpoint.local_addr());
        }
        self.phase = SessionPhase::Terminated;
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.endpoint.as_ref().map(NetworkEndpoint::local_addr)
    }

    pub fn init_message(&self) -> String {
        init_message(&self.config.client_id, &self.driver.init_angles())
    }

    /// Snapshot decoded on the most recent tick.
    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Command produced on the most recent tick, before clamping.
    pub fn last_command(&self) -> &DriveCommand {
        &self.command
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = self.stats.clone();
        if let Some(endpoint) = &self.endpoint {
            stats.network = endpoint.stats().clone();
        }
        stats
    }
}
