//! Startup configuration
//!
//! Every setting is read from the process environment once, validated, and
//! carried in an explicit [`Config`] struct. Validation collects all
//! offending settings before reporting, so one failed startup names every
//! problem instead of one per run.

use crate::error::{ConfigError, Result};
use std::fmt;

/// Operating mode of the publish loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// Log each envelope to the debug stream without publishing
    Test,
    /// Publish each envelope to the broker
    Send,
}

impl ScriptMode {
    fn from_value(raw: &str) -> Option<Self> {
        match raw {
            "TEST" => Some(ScriptMode::Test),
            "SEND" => Some(ScriptMode::Send),
            _ => None,
        }
    }
}

/// A parsed broker address
///
/// Accepts `mqtt://host[:port]`, `mqtts://host[:port]`, `tcp://host[:port]`,
/// `ssl://host[:port]`, or a bare `host[:port]`. Scheme selects TLS and the
/// default port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: bool,
}

impl BrokerEndpoint {
    /// Parses a broker address string
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when the scheme is unsupported,
    /// the host is empty, or the port does not parse.
    pub fn parse(address: &str) -> std::result::Result<Self, String> {
        if let Some(rest) = address.strip_prefix("mqtt://") {
            Self::split_host_port(rest, 1883, false)
        } else if let Some(rest) = address.strip_prefix("mqtts://") {
            Self::split_host_port(rest, 8883, true)
        } else if let Some(rest) = address.strip_prefix("tcp://") {
            Self::split_host_port(rest, 1883, false)
        } else if let Some(rest) = address.strip_prefix("ssl://") {
            Self::split_host_port(rest, 8883, true)
        } else if address.contains("://") {
            Err(format!("unsupported broker scheme in `{address}`"))
        } else {
            Self::split_host_port(address, 1883, false)
        }
    }

    fn split_host_port(
        address: &str,
        default_port: u16,
        tls: bool,
    ) -> std::result::Result<Self, String> {
        let (host, port) = if let Some(colon_pos) = address.rfind(':') {
            let host = &address[..colon_pos];
            let port_str = &address[colon_pos + 1..];
            let port = port_str
                .parse::<u16>()
                .map_err(|_| format!("invalid broker port: `{port_str}`"))?;
            (host, port)
        } else {
            (address, default_port)
        };

        if host.is_empty() {
            return Err("broker host is empty".to_string());
        }

        Ok(Self {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.tls { "mqtts" } else { "mqtt" };
        write!(f, "{scheme}://{}:{}", self.host, self.port)
    }
}

/// A Cognito user pool identifier of the form `region_poolId`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPool {
    region: String,
    pool_id: String,
}

impl UserPool {
    /// Parses a `region_poolId` pool identifier
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when either half is missing.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        match raw.split_once('_') {
            Some((region, pool_id)) if !region.is_empty() && !pool_id.is_empty() => Ok(Self {
                region: region.to_string(),
                pool_id: pool_id.to_string(),
            }),
            _ => Err(format!("USERPOOLID must look like region_poolId, got `{raw}`")),
        }
    }

    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    #[must_use]
    pub fn pool_id(&self) -> &str {
        &self.pool_id
    }

    /// The regional identity-provider endpoint for this pool
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("https://cognito-idp.{}.amazonaws.com/", self.region)
    }
}

/// Validated startup configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Operating mode of the publish loop
    pub mode: ScriptMode,
    /// Identity-provider username
    pub username: String,
    /// Identity-provider password
    pub password: String,
    /// Broker address readings are published to
    pub broker: BrokerEndpoint,
    /// Cognito user pool the token is requested from
    pub user_pool: UserPool,
    /// Cognito app client id
    pub client_id: String,
}

impl Config {
    /// Reads and validates the configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming every missing or malformed setting.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads and validates the configuration through a key lookup function
    ///
    /// Values that are present but empty count as missing.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming every missing or malformed setting.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut problems = Vec::new();
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let mode = match get("SCRIPT_MODE") {
            None => {
                problems.push("SCRIPT_MODE is not set".to_string());
                None
            }
            Some(raw) => match ScriptMode::from_value(&raw) {
                Some(mode) => Some(mode),
                None => {
                    problems.push(format!("SCRIPT_MODE must be TEST or SEND, got `{raw}`"));
                    None
                }
            },
        };

        let username = get("SIF_USER");
        if username.is_none() {
            problems.push("SIF_USER is not set".to_string());
        }

        let password = get("SIF_PASSWD");
        if password.is_none() {
            problems.push("SIF_PASSWD is not set".to_string());
        }

        let broker = match get("BROKER") {
            None => {
                problems.push("BROKER is not set".to_string());
                None
            }
            Some(raw) => match BrokerEndpoint::parse(&raw) {
                Ok(endpoint) => Some(endpoint),
                Err(problem) => {
                    problems.push(format!("BROKER: {problem}"));
                    None
                }
            },
        };

        let user_pool = match get("USERPOOLID") {
            None => {
                problems.push("USERPOOLID is not set".to_string());
                None
            }
            Some(raw) => match UserPool::parse(&raw) {
                Ok(pool) => Some(pool),
                Err(problem) => {
                    problems.push(problem);
                    None
                }
            },
        };

        let client_id = get("CLIENTID");
        if client_id.is_none() {
            problems.push("CLIENTID is not set".to_string());
        }

        // Every None above pushed a matching problem.
        match (mode, username, password, broker, user_pool, client_id) {
            (
                Some(mode),
                Some(username),
                Some(password),
                Some(broker),
                Some(user_pool),
                Some(client_id),
            ) if problems.is_empty() => Ok(Self {
                mode,
                username,
                password,
                broker,
                user_pool,
                client_id,
            }),
            _ => Err(ConfigError::new(problems).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SensorError;
    use std::collections::HashMap;

    fn full_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("SCRIPT_MODE", "SEND"),
            ("SIF_USER", "sensor@example.com"),
            ("SIF_PASSWD", "hunter2"),
            ("BROKER", "mqtt://broker.example.com:1883"),
            ("USERPOOLID", "eu-west-1_AbCdEf123"),
            ("CLIENTID", "4example0client1id"),
        ])
    }

    fn load(vars: &HashMap<&str, &str>) -> Result<Config> {
        Config::from_lookup(|key| vars.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn test_full_configuration_loads() {
        let config = load(&full_vars()).unwrap();
        assert_eq!(config.mode, ScriptMode::Send);
        assert_eq!(config.username, "sensor@example.com");
        assert_eq!(config.broker.host, "broker.example.com");
        assert_eq!(config.broker.port, 1883);
        assert!(!config.broker.tls);
        assert_eq!(config.user_pool.region(), "eu-west-1");
        assert_eq!(config.user_pool.pool_id(), "AbCdEf123");
        assert_eq!(config.client_id, "4example0client1id");
    }

    #[test]
    fn test_empty_environment_names_every_key() {
        let err = Config::from_lookup(|_| None).unwrap_err();
        let SensorError::Config(config_err) = err else {
            panic!("Expected Config error");
        };
        assert_eq!(config_err.problems.len(), 6);
        let text = config_err.to_string();
        for key in [
            "SCRIPT_MODE",
            "SIF_USER",
            "SIF_PASSWD",
            "BROKER",
            "USERPOOLID",
            "CLIENTID",
        ] {
            assert!(text.contains(key), "missing `{key}` in: {text}");
        }
    }

    #[test]
    fn test_partial_environment_names_only_missing_keys() {
        let mut vars = full_vars();
        vars.remove("SIF_PASSWD");
        vars.remove("CLIENTID");

        let err = load(&vars).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("SIF_PASSWD"));
        assert!(text.contains("CLIENTID"));
        assert!(!text.contains("SIF_USER is not set"));
        assert!(!text.contains("BROKER is not set"));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = full_vars();
        vars.insert("SIF_USER", "");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("SIF_USER is not set"));
    }

    #[test]
    fn test_invalid_mode_is_reported_with_the_value() {
        let mut vars = full_vars();
        vars.insert("SCRIPT_MODE", "send");

        let err = load(&vars).unwrap_err();
        assert!(err.to_string().contains("SCRIPT_MODE must be TEST or SEND, got `send`"));
    }

    #[test]
    fn test_mode_values() {
        assert_eq!(ScriptMode::from_value("TEST"), Some(ScriptMode::Test));
        assert_eq!(ScriptMode::from_value("SEND"), Some(ScriptMode::Send));
        assert_eq!(ScriptMode::from_value("Send"), None);
        assert_eq!(ScriptMode::from_value(""), None);
    }

    #[test]
    fn test_broker_endpoint_schemes() {
        let endpoint = BrokerEndpoint::parse("mqtt://broker.example.com").unwrap();
        assert_eq!(endpoint.host, "broker.example.com");
        assert_eq!(endpoint.port, 1883);
        assert!(!endpoint.tls);

        let endpoint = BrokerEndpoint::parse("mqtts://broker.example.com").unwrap();
        assert_eq!(endpoint.port, 8883);
        assert!(endpoint.tls);

        let endpoint = BrokerEndpoint::parse("tcp://10.0.0.7:11883").unwrap();
        assert_eq!(endpoint.host, "10.0.0.7");
        assert_eq!(endpoint.port, 11883);
        assert!(!endpoint.tls);

        let endpoint = BrokerEndpoint::parse("ssl://broker.example.com:8884").unwrap();
        assert_eq!(endpoint.port, 8884);
        assert!(endpoint.tls);

        let endpoint = BrokerEndpoint::parse("broker.example.com").unwrap();
        assert_eq!(endpoint.host, "broker.example.com");
        assert_eq!(endpoint.port, 1883);
    }

    #[test]
    fn test_broker_endpoint_rejects_bad_input() {
        assert!(BrokerEndpoint::parse("ws://broker.example.com")
            .unwrap_err()
            .contains("unsupported broker scheme"));
        assert!(BrokerEndpoint::parse("mqtt://")
            .unwrap_err()
            .contains("host is empty"));
        assert!(BrokerEndpoint::parse("mqtt://broker:99999")
            .unwrap_err()
            .contains("invalid broker port"));
        assert!(BrokerEndpoint::parse("mqtt://broker:abc")
            .unwrap_err()
            .contains("invalid broker port"));
    }

    #[test]
    fn test_broker_endpoint_display() {
        let endpoint = BrokerEndpoint::parse("broker.example.com").unwrap();
        assert_eq!(endpoint.to_string(), "mqtt://broker.example.com:1883");

        let endpoint = BrokerEndpoint::parse("mqtts://broker.example.com").unwrap();
        assert_eq!(endpoint.to_string(), "mqtts://broker.example.com:8883");
    }

    #[test]
    fn test_user_pool_parsing() {
        let pool = UserPool::parse("eu-west-1_AbCdEf123").unwrap();
        assert_eq!(pool.region(), "eu-west-1");
        assert_eq!(pool.pool_id(), "AbCdEf123");
        assert_eq!(
            pool.endpoint(),
            "https://cognito-idp.eu-west-1.amazonaws.com/"
        );

        assert!(UserPool::parse("eu-west-1").is_err());
        assert!(UserPool::parse("_AbCdEf123").is_err());
        assert!(UserPool::parse("eu-west-1_").is_err());
        assert!(UserPool::parse("").is_err());
    }
}
