//! # Planner Server Module
//!
//! This module abstracts over the networking side of the planner executable. The simulator (or the
//! bridge relaying its websocket traffic) sends one event frame per tick on a REP socket, and every
//! frame received must be answered with exactly one reply frame.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    sim::{parse_frame, Control, SimEvent, SimMsgError, MANUAL_FRAME},
};
use log::warn;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An abstraction over the networking part of the planner executable.
pub struct PlanServer {
    /// REP socket which receives simulator frames and replies to them
    sim_socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`PlanServer`]
#[derive(thiserror::Error, Debug)]
pub enum PlanServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not encode the control frame: {0}")]
    EncodeError(SimMsgError),

    #[error("Could not send data to the simulator: {0}")]
    SendError(zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlanServer {
    /// Create a new instance of the planner server.
    ///
    /// This function will not wait for a connection from the simulator before returning.
    pub fn new(params: &NetParams) -> Result<Self, PlanServerError> {
        let ctx = zmq::Context::new();

        let sim_socket_options = SocketOptions {
            bind: true,
            recv_timeout: params.planner_recv_timeout_ms,
            send_timeout: params.planner_send_timeout_ms,
            ..Default::default()
        };

        let sim_socket = MonitoredSocket::new(
            &ctx,
            zmq::REP,
            sim_socket_options,
            &params.planner_endpoint,
        )?;

        Ok(Self { sim_socket })
    }

    /// Retrieve the next event from the simulator.
    ///
    /// `None` is returned if no frame arrived before the receive timeout. Otherwise the user MUST
    /// reply with [`PlanServer::send_control`] or [`PlanServer::send_manual`], including when the
    /// frame could not be decoded.
    pub fn get_event(&mut self) -> Option<Result<SimEvent, SimMsgError>> {
        match self.sim_socket.recv_msg(0) {
            Ok(m) => match m.as_str() {
                Some(frame) => Some(parse_frame(frame)),
                None => {
                    warn!("Received a frame that is not valid UTF-8");
                    Some(Err(SimMsgError::NotAnEvent))
                }
            },
            Err(_) => None,
        }
    }

    /// Reply with a trajectory.
    pub fn send_control(&mut self, control: &Control) -> Result<(), PlanServerError> {
        let frame = control.to_frame().map_err(PlanServerError::EncodeError)?;
        self.send(&frame)
    }

    /// Reply handing control back to the simulator.
    pub fn send_manual(&mut self) -> Result<(), PlanServerError> {
        self.send(MANUAL_FRAME)
    }

    /// True if a peer is connected to the socket.
    pub fn peer_connected(&self) -> bool {
        self.sim_socket.connected()
    }

    fn send(&mut self, frame: &str) -> Result<(), PlanServerError> {
        self.sim_socket
            .send(frame, 0)
            .map_err(PlanServerError::SendError)
    }
}

impl From<MonitoredSocketError> for PlanServerError {
    fn from(e: MonitoredSocketError) -> Self {
        PlanServerError::SocketError(e)
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
