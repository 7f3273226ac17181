//! Client configuration derived from the provider's session config

use crate::credentials::Credentials;
use serde::Deserialize;
use std::path::Path;
use veilnet_connection::TunnelError;
use veilnet_session::SessionConfig;

fn default_protocol() -> String {
    "udp".to_string()
}

/// Tunnel client configuration, parsed out of the opaque session config the
/// provider returned during session creation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    pub remote: String,
    pub port: u16,

    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Provider CA certificate, PEM.
    #[serde(default)]
    pub ca: Option<String>,

    /// Static TLS auth key, PEM.
    #[serde(default, rename = "tls_auth")]
    pub tls_auth_key: Option<String>,
}

impl ClientConfig {
    pub fn from_session_config(session_config: &SessionConfig) -> Result<Self, TunnelError> {
        serde_json::from_value(session_config.clone())
            .map_err(|err| TunnelError::Config(err.to_string()))
    }

    /// Write the per-session key material under `runtime_dir` and render the
    /// child process argument list referencing it.
    pub async fn write_material(
        &self,
        runtime_dir: &Path,
        credentials: &Credentials,
    ) -> Result<Vec<String>, TunnelError> {
        tokio::fs::create_dir_all(runtime_dir).await?;

        let auth_path = runtime_dir.join("auth.txt");
        tokio::fs::write(
            &auth_path,
            format!("{}\n{}\n", credentials.username, credentials.password),
        )
        .await?;

        let mut args = vec![
            "--client".to_string(),
            "--dev".to_string(),
            "tun".to_string(),
            "--remote".to_string(),
            self.remote.clone(),
            self.port.to_string(),
            "--proto".to_string(),
            self.protocol.clone(),
            "--nobind".to_string(),
            "--auth-user-pass".to_string(),
            path_arg(&auth_path),
        ];

        if let Some(ca) = &self.ca {
            let ca_path = runtime_dir.join("ca.crt");
            tokio::fs::write(&ca_path, ca).await?;
            args.push("--ca".to_string());
            args.push(path_arg(&ca_path));
        }

        if let Some(key) = &self.tls_auth_key {
            let key_path = runtime_dir.join("ta.key");
            tokio::fs::write(&key_path, key).await?;
            args.push("--tls-auth".to_string());
            args.push(path_arg(&key_path));
        }

        Ok(args)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_parses_from_session_config() {
        let config = ClientConfig::from_session_config(&json!({
            "remote": "1.2.3.4",
            "port": 1194,
            "protocol": "tcp",
            "ca": "-----BEGIN CERTIFICATE-----"
        }))
        .unwrap();

        assert_eq!(config.remote, "1.2.3.4");
        assert_eq!(config.port, 1194);
        assert_eq!(config.protocol, "tcp");
        assert!(config.ca.is_some());
        assert!(config.tls_auth_key.is_none());
    }

    #[test]
    fn test_protocol_defaults_to_udp() {
        let config =
            ClientConfig::from_session_config(&json!({"remote": "1.2.3.4", "port": 1194}))
                .unwrap();
        assert_eq!(config.protocol, "udp");
    }

    #[test]
    fn test_session_config_without_remote_is_rejected() {
        let err = ClientConfig::from_session_config(&json!({"port": 1194})).unwrap_err();
        assert!(matches!(err, TunnelError::Config(_)));
    }

    #[tokio::test]
    async fn test_write_material_renders_args_and_files() {
        let runtime_dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::from_session_config(&json!({
            "remote": "1.2.3.4",
            "port": 1194,
            "ca": "PEM DATA"
        }))
        .unwrap();
        let credentials = Credentials {
            username: "session-100".to_string(),
            password: "abcd".to_string(),
        };

        let args = config
            .write_material(runtime_dir.path(), &credentials)
            .await
            .unwrap();

        assert!(args.contains(&"--remote".to_string()));
        assert!(args.contains(&"--ca".to_string()));

        let auth = std::fs::read_to_string(runtime_dir.path().join("auth.txt")).unwrap();
        assert_eq!(auth, "session-100\nabcd\n");
        let ca = std::fs::read_to_string(runtime_dir.path().join("ca.crt")).unwrap();
        assert_eq!(ca, "PEM DATA");
    }
}
