//! Credentials and the per-API connection registry

use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::models::Api;
use crate::params::Params;
use crate::signature::sign_params;

pub const API_HOST: &str = "app.episodic.com";
pub const API_VERSION: &str = "v2";

/// API credentials and the host they are valid for.
#[derive(Clone, PartialEq, Eq)]
pub struct Connection {
    api_key: String,
    secret_key: String,
    api_host: Option<String>,
}

impl Connection {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            api_host: None,
        }
    }

    /// Talk to `host` instead of the production Platform.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.api_host = Some(host.into());
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(API_HOST)
    }

    /// `http://<host>/api/v2/<api>/<method>`
    pub fn construct_url(&self, api: Api, method: &str) -> String {
        format!(
            "http://{}/api/{}/{}/{}",
            self.api_host(),
            API_VERSION,
            api.as_str(),
            method
        )
    }

    /// Encode `params` and add `expires`, `signature` and `key`.
    pub fn sign(&self, params: &Params) -> BTreeMap<String, String> {
        let mut encoded = params.encode();
        sign_params(&self.api_key, &self.secret_key, &mut encoded);
        encoded
    }
}

// Keep the secret out of debug output
impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("api_key", &self.api_key)
            .field("api_host", &self.api_host())
            .finish_non_exhaustive()
    }
}

/// A default connection plus optional overrides for individual APIs.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    default: Option<Connection>,
    overrides: HashMap<Api, Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `connection` as the default for every API.
    pub fn with_default(connection: Connection) -> Self {
        Self {
            default: Some(connection),
            overrides: HashMap::new(),
        }
    }

    /// Set the connection used by every API without an override.
    pub fn establish(&mut self, connection: Connection) {
        self.default = Some(connection);
    }

    /// Use `connection` for `api` only.
    pub fn establish_for(&mut self, api: Api, connection: Connection) {
        self.overrides.insert(api, connection);
    }

    /// The connection for `api`, falling back to the default.
    pub fn connection(&self, api: Api) -> Result<&Connection> {
        self.overrides
            .get(&api)
            .or(self.default.as_ref())
            .ok_or(Error::NoConnection(api))
    }

    pub fn is_connected(&self, api: Api) -> bool {
        self.connection(api).is_ok()
    }

    /// Drop the override for `api`, or the default when there is none.
    pub fn disconnect(&mut self, api: Api) -> Option<Connection> {
        self.overrides.remove(&api).or_else(|| self.default.take())
    }

    pub fn disconnect_all(&mut self) {
        self.default = None;
        self.overrides.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::generate_signature;

    #[test]
    fn test_construct_url() {
        let conn = Connection::new("key", "secret");
        assert_eq!(
            conn.construct_url(Api::Query, "episodes"),
            "http://app.episodic.com/api/v2/query/episodes"
        );

        let conn = conn.with_host("localhost:3000");
        assert_eq!(
            conn.construct_url(Api::Analytics, "get_report"),
            "http://localhost:3000/api/v2/analytics/get_report"
        );
    }

    #[test]
    fn test_sign_adds_auth_params() {
        let conn = Connection::new("my_key", "my_secret");
        let params = Params::new().with("show_id", "5").with("expires", 1262745192i64);
        let signed = conn.sign(&params);

        assert_eq!(signed["key"], "my_key");
        assert_eq!(signed["expires"], "1262745192");

        let mut unsigned = signed.clone();
        unsigned.remove("signature");
        unsigned.remove("key");
        assert_eq!(signed["signature"], generate_signature("my_secret", &unsigned));
    }

    #[test]
    fn test_debug_hides_secret() {
        let conn = Connection::new("my_key", "my_secret");
        let debug = format!("{:?}", conn);
        assert!(debug.contains("my_key"));
        assert!(!debug.contains("my_secret"));
    }

    #[test]
    fn test_override_and_fallback() {
        let mut connections = Connections::with_default(Connection::new("default", "s"));
        connections.establish_for(Api::Analytics, Connection::new("analytics", "s"));

        assert_eq!(connections.connection(Api::Query).unwrap().api_key(), "default");
        assert_eq!(connections.connection(Api::Analytics).unwrap().api_key(), "analytics");

        let removed = connections.disconnect(Api::Analytics).unwrap();
        assert_eq!(removed.api_key(), "analytics");
        assert_eq!(connections.connection(Api::Analytics).unwrap().api_key(), "default");

        connections.disconnect(Api::Write);
        assert!(!connections.is_connected(Api::Query));
    }

    #[test]
    fn test_no_connection() {
        let mut connections = Connections::with_default(Connection::new("k", "s"));
        connections.establish_for(Api::Write, Connection::new("w", "s"));
        connections.disconnect_all();

        for api in [Api::Query, Api::Write, Api::Analytics] {
            assert!(matches!(connections.connection(api), Err(Error::NoConnection(a)) if a == api));
        }
    }
}
