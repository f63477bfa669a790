//! Request/reply transport towards the stove.
//!
//! [`UdpTransport`] owns one unconnected datagram socket bound to an ephemeral
//! local port. Every call sends exactly one request datagram and waits for at
//! most one reply, bounded by the receive timeout. There is no retry.
//!
//! The [`Transport`] trait is the seam between the accessor layer in
//! [`crate::client`] and the wire, which lets the accessors be driven by a mock.

use crate::{config::StoveConfig, protocol as proto};
use log::*;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Receive timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

const DRAIN_BUFFER_SIZE: usize = 1024;

/// Represents all possible failures of a single request/reply exchange.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `connect()` was never called.
    #[error("Not connected to the stove")]
    NotConnected,

    /// No reply arrived within the receive timeout.
    #[error("No reply from the stove within the timeout")]
    Timeout,

    /// The stove answered the `-1` sentinel.
    #[error("Stove reported no data")]
    DeviceUnavailable,

    /// The read reply is not a decimal integer.
    #[error("Malformed reply '{0}'")]
    MalformedReply(String),

    /// The write reply does not contain the success marker.
    #[error("Write rejected by the stove: '{0}'")]
    Rejected(String),

    /// The configured host did not resolve to any address.
    #[error("Cannot resolve stove address '{0}'")]
    UnresolvedAddress(String),

    /// OS level send/receive failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The result type for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One request/reply exchange per call.
pub trait Transport {
    /// Prepares the channel, calling it again once it is ready does nothing.
    fn connect(&mut self) -> Result<()>;

    /// Reads the raw integer stored in `register`.
    fn read(&mut self, register: &proto::Register) -> Result<i32>;

    /// Writes `value` into `register`, `Ok` only when the stove confirmed it.
    fn write(&mut self, register: &proto::Register, value: u16) -> Result<()>;
}

struct Channel {
    socket: UdpSocket,
    remote: SocketAddr,
}

/// UDP transport for the stove protocol.
pub struct UdpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    channel: Option<Channel>,
}

impl UdpTransport {
    /// Creates an unconnected transport, no socket is allocated until [`Transport::connect`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pellet_stove_lib::transport::{Transport, UdpTransport};
    /// use pellet_stove_lib::protocol::READ_POWER_REG;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut transport = UdpTransport::new("192.168.1.50", 2390);
    /// transport.connect()?;
    /// let power = transport.read(&READ_POWER_REG)?;
    /// println!("Power: {power}");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            channel: None,
        }
    }

    pub fn from_config(config: &StoveConfig) -> Self {
        Self::new(config.host.clone(), config.port).with_timeout(config.timeout)
    }

    /// Sets the receive timeout before connecting.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Changes the receive timeout, also on an already open socket.
    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.timeout = timeout;
        if let Some(channel) = &self.channel {
            channel.socket.set_read_timeout(Some(timeout))?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    /// Local address of the socket, `None` while unconnected.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.channel
            .as_ref()
            .and_then(|channel| channel.socket.local_addr().ok())
    }

    /// Resolved stove address, `None` while unconnected.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.channel.as_ref().map(|channel| channel.remote)
    }

    fn channel(&self) -> Result<&Channel> {
        self.channel.as_ref().ok_or(Error::NotConnected)
    }

    /// Discards datagrams that arrived after an earlier exchange gave up on them.
    fn drain(channel: &Channel) -> Result<usize> {
        channel.socket.set_nonblocking(true)?;
        let mut buffer = [0u8; DRAIN_BUFFER_SIZE];
        let mut drained = 0;
        loop {
            match channel.socket.recv_from(&mut buffer) {
                Ok((size, from)) => {
                    drained += 1;
                    trace!(
                        "Dropped stale datagram from {from}: {:?}",
                        String::from_utf8_lossy(&buffer[..size])
                    );
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => break,
                Err(err) => {
                    trace!("Drain stopped: {err}");
                    break;
                }
            }
        }
        channel.socket.set_nonblocking(false)?;
        Ok(drained)
    }

    /// Sends one request line and waits for one reply of at most `reply_size` bytes.
    fn exchange(channel: &Channel, request: &str, reply_size: usize) -> Result<Vec<u8>> {
        if let Err(err) = Self::drain(channel) {
            debug!("Cannot drain socket before sending: {err}");
        }

        debug!("-> {}: {:?}", channel.remote, request);
        channel.socket.send_to(request.as_bytes(), channel.remote)?;

        let mut buffer = vec![0u8; reply_size];
        match channel.socket.recv_from(&mut buffer) {
            Ok((size, from)) => {
                buffer.truncate(size);
                debug!("<- {from}: {:?}", String::from_utf8_lossy(&buffer));
                Ok(buffer)
            }
            Err(err)
                if err.kind() == io::ErrorKind::WouldBlock
                    || err.kind() == io::ErrorKind::TimedOut =>
            {
                Err(Error::Timeout)
            }
            Err(err) => Err(Error::Io(err)),
        }
    }
}

impl Transport for UdpTransport {
    fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }

        let remote = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::UnresolvedAddress(format!("{}:{}", self.host, self.port)))?;
        let local = if remote.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };
        let socket = UdpSocket::bind(local)?;
        socket.set_read_timeout(Some(self.timeout))?;
        socket.set_write_timeout(Some(self.timeout))?;
        info!(
            "Stove transport ready: {} -> {remote} (timeout {:?})",
            socket.local_addr()?,
            self.timeout
        );

        self.channel = Some(Channel { socket, remote });
        Ok(())
    }

    fn read(&mut self, register: &proto::Register) -> Result<i32> {
        let channel = self.channel()?;
        let reply = Self::exchange(
            channel,
            &register.encode_read_request(),
            proto::MAX_READ_REPLY_SIZE,
        )?;
        proto::decode_read_reply(&reply)
    }

    fn write(&mut self, register: &proto::Register, value: u16) -> Result<()> {
        let channel = self.channel()?;
        let reply = Self::exchange(
            channel,
            &register.encode_write_request(value),
            proto::MAX_WRITE_REPLY_SIZE,
        )?;
        proto::decode_write_reply(&reply)
    }
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{READ_POWER_REG, READ_SMOKE_ROTOR_SPEED_REG, WRITE_POWER_REG};
    use assert_matches::assert_matches;
    use std::thread::{self, JoinHandle};

    /// Answers each incoming request with the next scripted reply and returns the requests.
    fn responder(replies: Vec<&'static [u8]>) -> (u16, JoinHandle<Vec<String>>) {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let port = socket.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            let mut buffer = [0u8; 64];
            for reply in replies {
                let (size, from) = socket.recv_from(&mut buffer).unwrap();
                requests.push(String::from_utf8_lossy(&buffer[..size]).into_owned());
                socket.send_to(reply, from).unwrap();
            }
            requests
        });
        (port, handle)
    }

    fn connected(port: u16) -> UdpTransport {
        let mut transport =
            UdpTransport::new("127.0.0.1", port).with_timeout(Duration::from_millis(300));
        transport.connect().unwrap();
        transport
    }

    #[test]
    fn connect_is_idempotent() {
        let mut transport = UdpTransport::new("127.0.0.1", proto::DEFAULT_PORT);
        assert!(!transport.is_connected());
        assert_eq!(transport.local_addr(), None);

        transport.connect().unwrap();
        let first = transport.local_addr().unwrap();
        transport.connect().unwrap();
        assert_eq!(transport.local_addr(), Some(first));
        assert_eq!(
            transport.remote_addr(),
            Some("127.0.0.1:2390".parse().unwrap())
        );
    }

    #[test]
    fn not_connected() {
        let mut transport = UdpTransport::new("127.0.0.1", proto::DEFAULT_PORT);
        assert_matches!(transport.read(&READ_POWER_REG), Err(Error::NotConnected));
        assert_matches!(transport.write(&WRITE_POWER_REG, 3), Err(Error::NotConnected));
    }

    #[test]
    fn read_value() {
        let (port, server) = responder(vec![b"215"]);
        let mut transport = connected(port);
        assert_matches!(transport.read(&READ_SMOKE_ROTOR_SPEED_REG), Ok(215));
        assert_eq!(server.join().unwrap(), vec!["0;2F\n"]);
    }

    #[test]
    fn read_sentinel_is_unavailable() {
        let (port, server) = responder(vec![b"-1"]);
        let mut transport = connected(port);
        assert_matches!(
            transport.read(&READ_POWER_REG),
            Err(Error::DeviceUnavailable)
        );
        assert_eq!(server.join().unwrap(), vec!["21;60\n"]);
    }

    #[test]
    fn read_timeout() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();
        let mut transport = connected(port);
        assert_matches!(transport.read(&READ_POWER_REG), Err(Error::Timeout));
    }

    #[test]
    fn write_confirmation() {
        let (port, server) = responder(vec![b"Write successfully", b"Write error"]);
        let mut transport = connected(port);
        assert_matches!(transport.write(&WRITE_POWER_REG, 5), Ok(()));
        assert_matches!(
            transport.write(&WRITE_POWER_REG, 10),
            Err(Error::Rejected(reply)) if reply == "Write error"
        );
        assert_eq!(server.join().unwrap(), vec!["A1;60;5\n", "A1;60;a\n"]);
    }

    #[test]
    fn stale_reply_is_drained() {
        let (port, server) = responder(vec![b"7"]);
        let mut transport = connected(port);

        let late = UdpSocket::bind("127.0.0.1:0").unwrap();
        late.send_to(b"99", transport.local_addr().unwrap())
            .unwrap();
        thread::sleep(Duration::from_millis(50));

        assert_matches!(transport.read(&READ_POWER_REG), Ok(7));
        server.join().unwrap();
    }

    #[test]
    fn set_timeout_on_open_socket() {
        let mut transport = connected(proto::DEFAULT_PORT);
        transport.set_timeout(Duration::from_millis(50)).unwrap();
        assert_eq!(transport.timeout(), Duration::from_millis(50));
    }

    #[test]
    fn debug_output() {
        let transport = UdpTransport::new("stove.local", 2391);
        let debug_str = format!("{:?}", transport);
        assert!(debug_str.contains("UdpTransport"));
        assert!(debug_str.contains("stove.local"));
    }
}
