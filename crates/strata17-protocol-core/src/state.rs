/// The state of a protocol 17 connection. Unlike later dialects there is no
/// configuration phase and no separate status/login split at the framing layer — a
/// server-list ping is just another packet legal in `Handshaking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Handshaking,
    LoggingIn,
    Play,
    Terminated,
}

impl ConnectionState {
    pub fn can_send(self, terminated: bool) -> bool {
        !terminated && self != ConnectionState::Terminated
    }
}

/// Which end of the connection a packet travels to. A handful of ids (login
/// request, handshake) carry different field meanings depending on direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Serverbound,
    Clientbound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminated_state_never_allows_sending() {
        assert!(!ConnectionState::Terminated.can_send(false));
        assert!(!ConnectionState::Play.can_send(true));
        assert!(ConnectionState::Play.can_send(false));
    }
}
