//! Token/role authorization for raffle connections and reads

use crate::error::{RaffleError, RaffleResult};
use crate::types::{RaffleRecord, Role};

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Decide which role a token grants on a raffle.
///
/// - `Host` requires the host token.
/// - `Viewer` accepts either token; the host can always observe.
///
/// A token matching neither secret is `Forbidden` regardless of the requested role.
pub fn authorize(raffle: &RaffleRecord, token: &str, requested: Role) -> RaffleResult<Role> {
    let is_host = constant_time_eq(token.as_bytes(), raffle.host_token.as_bytes());
    let is_viewer = constant_time_eq(token.as_bytes(), raffle.viewer_token.as_bytes());

    match requested {
        Role::Host if is_host => Ok(Role::Host),
        Role::Host if is_viewer => Err(RaffleError::RoleRejected("Host token rejected.")),
        Role::Viewer if is_host || is_viewer => Ok(Role::Viewer),
        _ => Err(RaffleError::Forbidden),
    }
}

/// Read access for the HTTP read endpoint. A missing token counts as a wrong one.
pub fn authorize_read(raffle: &RaffleRecord, token: Option<&str>) -> RaffleResult<()> {
    let token = token.ok_or(RaffleError::Forbidden)?;
    authorize(raffle, token, Role::Viewer).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raffle() -> RaffleRecord {
        RaffleRecord {
            id: "r1".to_string(),
            name: "Test".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
            settings: serde_json::json!({}),
            participants: serde_json::json!([]),
            tickets: vec![],
            ticket_fingerprint: String::new(),
            host_token: "host-secret".to_string(),
            viewer_token: "viewer-secret".to_string(),
            winner_name: None,
            rotation: 0.0,
        }
    }

    #[test]
    fn test_host_with_host_token() {
        assert_eq!(
            authorize(&raffle(), "host-secret", Role::Host).unwrap(),
            Role::Host
        );
    }

    #[test]
    fn test_host_with_viewer_token_is_rejected() {
        let err = authorize(&raffle(), "viewer-secret", Role::Host).unwrap_err();
        assert!(matches!(err, RaffleError::RoleRejected(_)));
    }

    #[test]
    fn test_viewer_with_either_token() {
        assert_eq!(
            authorize(&raffle(), "viewer-secret", Role::Viewer).unwrap(),
            Role::Viewer
        );
        // Host observing as a viewer stays a viewer
        assert_eq!(
            authorize(&raffle(), "host-secret", Role::Viewer).unwrap(),
            Role::Viewer
        );
    }

    #[test]
    fn test_unrelated_token_rejected_for_any_role() {
        for role in [Role::Host, Role::Viewer] {
            let err = authorize(&raffle(), "guess", role).unwrap_err();
            assert!(matches!(err, RaffleError::Forbidden));
        }
        assert!(matches!(
            authorize(&raffle(), "", Role::Viewer).unwrap_err(),
            RaffleError::Forbidden
        ));
    }

    #[test]
    fn test_authorize_read() {
        assert!(authorize_read(&raffle(), Some("viewer-secret")).is_ok());
        assert!(authorize_read(&raffle(), Some("host-secret")).is_ok());
        assert!(authorize_read(&raffle(), Some("nope")).is_err());
        assert!(authorize_read(&raffle(), None).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(constant_time_eq(b"", b""));
    }
}
