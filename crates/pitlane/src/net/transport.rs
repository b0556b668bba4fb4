use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// Shortest read deadline the socket accepts; a zero timeout is raised to this.
pub const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub datagrams_sent: u64,
    pub datagrams_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub receive_timeouts: u64,
}

/// Datagram socket connected to a single simulation server.
#[derive(Debug)]
pub struct NetworkEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    remote_addr: SocketAddr,
    recv_buffer: Vec<u8>,
    read_timeout: Option<Duration>,
    stats: NetworkStats,
}

impl NetworkEndpoint {
    /// Binds an ephemeral local port of the same address family as `remote` and connects
    /// the socket to it, so datagrams from other peers are discarded by the OS.
    pub fn connect(remote: SocketAddr, recv_buffer_size: usize) -> io::Result<Self> {
        let bind_addr: SocketAddr = if remote.is_ipv4() {
            (std::net::Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(remote)?;
        socket.set_read_timeout(None)?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            remote_addr: remote,
            recv_buffer: vec![0u8; recv_buffer_size.max(1)],
            read_timeout: None,
            stats: NetworkStats::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let bytes = self.socket.send(data)?;

        self.stats.datagrams_sent += 1;
        self.stats.bytes_sent += bytes as u64;

        log::trace!("<< {}", String::from_utf8_lossy(&data[..bytes]));
        Ok(bytes)
    }

    /// Waits for the next datagram. `None` timeout blocks indefinitely.
    ///
    /// Returns `Ok(None)` only when the deadline passes without a datagram. A zero
    /// timeout waits [`MIN_READ_TIMEOUT`].
    pub fn receive(&mut self, timeout: Option<Duration>) -> io::Result<Option<&[u8]>> {
        let timeout = timeout.map(|t| t.max(MIN_READ_TIMEOUT));
        if timeout != self.read_timeout {
            self.socket.set_read_timeout(timeout)?;
            self.read_timeout = timeout;
        }

        match self.socket.recv(&mut self.recv_buffer) {
            Ok(size) => {
                self.stats.datagrams_received += 1;
                self.stats.bytes_received += size as u64;

                let data = &self.recv_buffer[..size];
                log::trace!(">> {}", String::from_utf8_lossy(data));
                Ok(Some(data))
            }
            Err(ref e)
                if timeout.is_some()
                    && matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                self.stats.receive_timeouts += 1;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
