use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use duel_shared::*;
use thiserror::Error;
use tracing::info;

/// Large enough that an oversize datagram shows up with its wrong length instead of
/// being cut down to a valid one.
const RECV_BUFFER: usize = 2048;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind telemetry socket on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("receive failed: {0}")]
    Recv(#[source] io::Error),
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Datagram(Vec<u8>),
    TimedOut,
}

/// Datagram channel to and from the simulator.
pub trait Transport {
    /// Block until a datagram arrives or the receive timeout elapses.
    fn recv(&mut self) -> Result<Inbound, TransportError>;
    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError>;
}

/// Telemetry in on one socket, commands out on another.
pub struct UdpTransport {
    telemetry: UdpSocket,
    commands: UdpSocket,
    command_addr: SocketAddr,
    buf: Vec<u8>,
}

impl UdpTransport {
    pub fn bind(config: &ControllerConfig) -> Result<Self, TransportError> {
        let listen = format!("{BIND_HOST}:{}", config.telemetry_port()?);
        let target = format!("{SIMULATOR_HOST}:{}", config.command_port()?);

        let telemetry = UdpSocket::bind(&listen).map_err(|source| TransportError::Bind {
            addr: listen.clone(),
            source,
        })?;
        telemetry
            .set_read_timeout(Some(Duration::from_secs(config.episode.recv_timeout_secs)))
            .map_err(TransportError::Recv)?;

        let commands = UdpSocket::bind(format!("{BIND_HOST}:0")).map_err(|source| TransportError::Bind {
            addr: format!("{BIND_HOST}:0"),
            source,
        })?;
        let command_addr: SocketAddr = target.parse().map_err(|_| {
            TransportError::Send(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bad command address {target}"),
            ))
        })?;

        info!(telemetry = %listen, commands = %command_addr, "transport ready");
        Ok(Self {
            telemetry,
            commands,
            command_addr,
            buf: vec![0; RECV_BUFFER],
        })
    }
}

impl Transport for UdpTransport {
    fn recv(&mut self) -> Result<Inbound, TransportError> {
        match self.telemetry.recv_from(&mut self.buf) {
            Ok((n, _)) => Ok(Inbound::Datagram(self.buf[..n].to_vec())),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(Inbound::TimedOut)
            }
            Err(e) => Err(TransportError::Recv(e)),
        }
    }

    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        self.commands
            .send_to(datagram, self.command_addr)
            .map(|_| ())
            .map_err(TransportError::Send)
    }
}

/// Scripted in-process channel: replays queued datagrams and records what was sent.
/// An empty queue reads as a timeout.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Vec<u8>>,
    pub sent: Vec<Vec<u8>>,
    /// When set, every send fails.
    pub fail_sends: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, datagram: Vec<u8>) {
        self.inbound.push_back(datagram);
    }

    pub fn push_frame(&mut self, frame: &TelemetryFrame) {
        self.push(encode_telemetry(frame).to_vec());
    }

    pub fn remaining(&self) -> usize {
        self.inbound.len()
    }

    /// Decode everything sent so far.
    pub fn sent_commands(&self) -> Vec<CommandFrame> {
        self.sent
            .iter()
            .filter_map(|d| decode_command(d).ok())
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn recv(&mut self) -> Result<Inbound, TransportError> {
        Ok(match self.inbound.pop_front() {
            Some(d) => Inbound::Datagram(d),
            None => Inbound::TimedOut,
        })
    }

    fn send(&mut self, datagram: &[u8]) -> Result<(), TransportError> {
        if self.fail_sends {
            return Err(TransportError::Send(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "simulated send failure",
            )));
        }
        self.sent.push(datagram.to_vec());
        Ok(())
    }
}

/// Builds each outbound command and owns the one-shot command code.
#[derive(Debug, Clone)]
pub struct Outbox {
    controlling_id: i32,
    code: CommandCode,
}

impl Outbox {
    pub fn new(controlling_id: i32) -> Self {
        Self {
            controlling_id,
            code: CommandCode::Normal,
        }
    }

    pub fn code(&self) -> CommandCode {
        self.code
    }

    /// Arm a single shot for the next send. A pending reset takes precedence.
    pub fn fire(&mut self) {
        if self.code != CommandCode::Reset {
            self.code = CommandCode::Fire;
        }
    }

    pub fn reset(&mut self) {
        self.code = CommandCode::Reset;
    }

    /// Send one command. The code goes back to normal whether or not the send succeeded.
    pub fn send<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        timer: u64,
        command: &Command,
    ) -> Result<CommandFrame, TransportError> {
        let frame = CommandFrame::new(self.controlling_id, timer, command, self.code);
        self.code = CommandCode::Normal;
        transport.send(&encode_command(&frame))?;
        Ok(frame)
    }
}
