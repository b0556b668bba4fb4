use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use pitlane::{ClientConfig, Driver, IdleDriver, Session, SimpleDriver, Termination};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DriverKind {
    /// Heuristic racing policy
    Simple,
    /// Stand still in neutral
    Idle,
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Remote driver for a racing simulation server")]
struct Args {
    #[arg(
        short,
        long,
        default_value_t = format!("{}:{}", pitlane::DEFAULT_HOST, pitlane::DEFAULT_PORT),
        help = "host:port of the server"
    )]
    addr: String,

    #[arg(long, default_value = pitlane::DEFAULT_CLIENT_ID, help = "Client identifier sent at handshake")]
    id: String,

    #[arg(short, long, value_enum, default_value_t = DriverKind::Simple)]
    driver: DriverKind,

    #[arg(
        short,
        long,
        default_value_t = 1,
        help = "Races to drive; a server restart starts the next one"
    )]
    episodes: u32,

    #[arg(
        long,
        default_value_t = 1000,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Handshake reply timeout in ms"
    )]
    handshake_timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let server = resolve(&args.addr)?;

    let config = ClientConfig {
        client_id: args.id.clone(),
        handshake_timeout: Duration::from_millis(args.handshake_timeout_ms),
        ..Default::default()
    };

    let episodes = args.episodes.max(1);
    for episode in 1..=episodes {
        log::info!("Episode {} of {} against {}", episode, episodes, server);

        // fresh policy and controller state for every race
        let driver: Box<dyn Driver> = match args.driver {
            DriverKind::Simple => Box::new(SimpleDriver::default()),
            DriverKind::Idle => Box::new(IdleDriver),
        };

        let mut session = Session::connect(server, driver, config.clone())
            .context("opening socket")?;
        let termination = session.run().context("session failed")?;

        let stats = session.stats();
        log::info!(
            "Session ended ({:?}) after {} ticks, {} handshake attempts, {} values substituted",
            termination,
            stats.ticks,
            stats.handshake_attempts,
            stats.substituted_values
        );

        if termination == Termination::Shutdown {
            break;
        }
    }

    Ok(())
}

fn resolve(addr: &str) -> anyhow::Result<SocketAddr> {
    addr.to_socket_addrs()
        .with_context(|| format!("resolving {}", addr))?
        .next()
        .with_context(|| format!("no address found for {}", addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_handshake_timeout_is_rejected() {
        assert!(Args::try_parse_from(["client", "--handshake-timeout-ms", "0"]).is_err());

        let args = Args::try_parse_from(["client", "--handshake-timeout-ms", "1"]).unwrap();
        assert_eq!(args.handshake_timeout_ms, 1);
    }
}
