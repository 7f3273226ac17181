//! Per-session tunnel credentials

use veilnet_identity::{SignError, Signer};
use veilnet_session::SessionId;

/// Auth material the provider validates on tunnel login: the session id as
/// username, the consumer's signature over it as password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn for_session(session_id: &SessionId, signer: &dyn Signer) -> Result<Self, SignError> {
        let signature = signer.sign(session_id.as_str().as_bytes())?;
        Ok(Self {
            username: session_id.to_string(),
            password: signature.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veilnet_identity::Signature;

    struct StaticSigner;

    impl Signer for StaticSigner {
        fn sign(&self, message: &[u8]) -> Result<Signature, SignError> {
            assert_eq!(message, b"session-100");
            Ok(Signature::new(vec![0xab, 0xcd]))
        }
    }

    #[test]
    fn test_credentials_sign_the_session_id() {
        let credentials =
            Credentials::for_session(&SessionId::new("session-100"), &StaticSigner).unwrap();
        assert_eq!(credentials.username, "session-100");
        assert_eq!(credentials.password, "abcd");
    }
}
