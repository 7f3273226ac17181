//! Management output parsing
//!
//! The tunnel binary reports lifecycle transitions as `>STATE:` lines and
//! traffic counters as `>BYTECOUNT:` lines. Anything else in the output is
//! ignored.

use veilnet_connection::{SessionStats, TunnelState};

/// Map a management state token onto the connection core's vocabulary.
/// Unrecognized tokens are carried through verbatim.
pub fn state_from_token(token: &str) -> TunnelState {
    match token {
        "CONNECTING" => TunnelState::Connecting,
        "WAIT" => TunnelState::Wait,
        "AUTH" => TunnelState::Authenticating,
        "GET_CONFIG" => TunnelState::GetConfig,
        "ASSIGN_IP" => TunnelState::AssignIp,
        "CONNECTED" => TunnelState::Connected,
        "RECONNECTING" => TunnelState::Reconnecting,
        "EXITING" => TunnelState::Exiting,
        other => TunnelState::Other(other.to_string()),
    }
}

/// Parse a `>STATE:<unix-time>,<token>,...` line.
pub fn parse_state_line(line: &str) -> Option<TunnelState> {
    let fields = line.strip_prefix(">STATE:")?;
    let token = fields.split(',').nth(1)?;
    if token.is_empty() {
        return None;
    }
    Some(state_from_token(token))
}

/// Parse a `>BYTECOUNT:<bytes-in>,<bytes-out>` line into session counters.
pub fn parse_byte_count(line: &str) -> Option<SessionStats> {
    let fields = line.strip_prefix(">BYTECOUNT:")?;
    let (bytes_in, bytes_out) = fields.split_once(',')?;
    Some(SessionStats {
        bytes_received: bytes_in.trim().parse().ok()?,
        bytes_sent: bytes_out.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_line_yields_mapped_token() {
        assert_eq!(
            parse_state_line(">STATE:1528369988,CONNECTED,SUCCESS,10.8.0.3,1.2.3.4"),
            Some(TunnelState::Connected)
        );
        assert_eq!(
            parse_state_line(">STATE:1528369988,AUTH,,,"),
            Some(TunnelState::Authenticating)
        );
    }

    #[test]
    fn test_unknown_state_token_is_carried_verbatim() {
        assert_eq!(
            parse_state_line(">STATE:1528369988,RESOLVE,,,"),
            Some(TunnelState::Other("RESOLVE".to_string()))
        );
    }

    #[test]
    fn test_non_state_lines_are_ignored() {
        assert_eq!(parse_state_line("TUN/TAP device tun0 opened"), None);
        assert_eq!(parse_state_line(">STATE:"), None);
        assert_eq!(parse_state_line(">STATE:1528369988,"), None);
    }

    #[test]
    fn test_byte_count_line_yields_counters() {
        assert_eq!(
            parse_byte_count(">BYTECOUNT:1024,2048"),
            Some(SessionStats {
                bytes_received: 1024,
                bytes_sent: 2048,
            })
        );
    }

    #[test]
    fn test_malformed_byte_count_is_ignored() {
        assert_eq!(parse_byte_count(">BYTECOUNT:abc,2048"), None);
        assert_eq!(parse_byte_count(">BYTECOUNT:1024"), None);
    }
}
