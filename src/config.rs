//! Building a [`SnowflakeClient`] from the environment.

use std::env;

use jwt_simple::algorithms::RS256KeyPair;

use crate::errors::{SnowflakeError, SnowflakeResult};
use crate::SnowflakeClient;

/// Server-side statement timeout used unless one is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn required(name: &str) -> SnowflakeResult<String> {
    optional(name).ok_or_else(|| SnowflakeError::Config(format!("{name} is not set")))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl SnowflakeClient {
    /// Read the connection from `SNOWFLAKE_*` variables.
    ///
    /// `SNOWFLAKE_ACCOUNT`, `SNOWFLAKE_USER` and `SNOWFLAKE_PRIVATE_KEY_PATH`
    /// (a PKCS#8 PEM file) are required. `SNOWFLAKE_ROLE`,
    /// `SNOWFLAKE_WAREHOUSE`, `SNOWFLAKE_DATABASE` and `SNOWFLAKE_HOST` are
    /// picked up when present.
    pub fn from_env() -> SnowflakeResult<SnowflakeClient> {
        let account = required("SNOWFLAKE_ACCOUNT")?;
        let user = required("SNOWFLAKE_USER")?;
        let key_path = required("SNOWFLAKE_PRIVATE_KEY_PATH")?;
        let pem = std::fs::read_to_string(&key_path)?;
        let key_pair = RS256KeyPair::from_pem(&pem)?;
        log::debug!("loaded key pair from {key_path} for {user} in {account}");
        Ok(SnowflakeClient {
            key_pair,
            account,
            user,
            database: optional("SNOWFLAKE_DATABASE"),
            warehouse: optional("SNOWFLAKE_WAREHOUSE"),
            role: optional("SNOWFLAKE_ROLE"),
            host: optional("SNOWFLAKE_HOST"),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// `https://<account>.snowflakecomputing.com` unless a host is configured
    pub(crate) fn base_url(&self) -> String {
        match &self.host {
            Some(host) if host.contains("://") => host.trim_end_matches('/').to_owned(),
            Some(host) => format!("https://{}", host.trim_end_matches('/')),
            None => format!(
                "https://{}.snowflakecomputing.com",
                self.account.to_ascii_lowercase()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(host: Option<&str>) -> SnowflakeResult<SnowflakeClient> {
        Ok(SnowflakeClient {
            key_pair: RS256KeyPair::generate(2048)?,
            account: "XY12345.us-east-1".into(),
            user: "svc".into(),
            database: None,
            warehouse: None,
            role: None,
            host: host.map(str::to_owned),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    #[test]
    fn base_url_from_account_or_host() -> SnowflakeResult<()> {
        assert_eq!(
            client(None)?.base_url(),
            "https://xy12345.us-east-1.snowflakecomputing.com"
        );
        assert_eq!(
            client(Some("acme.privatelink.snowflakecomputing.com/"))?.base_url(),
            "https://acme.privatelink.snowflakecomputing.com"
        );
        assert_eq!(client(Some("http://127.0.0.1:8080"))?.base_url(), "http://127.0.0.1:8080");
        Ok(())
    }

    #[test]
    fn missing_variables_are_config_errors() {
        assert!(matches!(
            required("SNOWFLAKE_SURELY_UNSET_VARIABLE"),
            Err(SnowflakeError::Config(message)) if message.contains("SNOWFLAKE_SURELY_UNSET_VARIABLE")
        ));
    }
}
