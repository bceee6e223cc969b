//! Episodic Platform client
//!
//! [`EpisodicClient`] owns the connections and the transport. The request
//! methods live in the `query`, `write` and `analytics` modules.

use std::collections::BTreeMap;

use crate::config::ClientConfig;
use crate::connection::{Connection, Connections};
use crate::error::Result;
use crate::models::Api;
use crate::params::Params;
use crate::transport::{FileField, HttpResponse, Transport, UreqTransport};

pub struct EpisodicClient<T: Transport = UreqTransport> {
    connections: Connections,
    transport: T,
}

impl EpisodicClient<UreqTransport> {
    pub fn new(connection: Connection) -> Self {
        Self::with_transport(connection, UreqTransport::new())
    }

    /// Build a client from saved settings: credentials, host, timeouts and
    /// user agent.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let connection = config.connection()?;
        Ok(Self::with_transport(connection, UreqTransport::from_config(config)))
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.transport = self.transport.with_user_agent(user_agent);
        self
    }
}

impl<T: Transport> EpisodicClient<T> {
    pub fn with_transport(connection: Connection, transport: T) -> Self {
        Self::from_parts(Connections::with_default(connection), transport)
    }

    pub fn from_parts(connections: Connections, transport: T) -> Self {
        Self {
            connections,
            transport,
        }
    }

    /// Use `connection` for requests to `api` only.
    pub fn with_connection(mut self, api: Api, connection: Connection) -> Self {
        self.connections.establish_for(api, connection);
        self
    }

    /// Replace the default connection.
    pub fn establish_connection(&mut self, connection: Connection) {
        self.connections.establish(connection);
    }

    pub fn connection(&self, api: Api) -> Result<&Connection> {
        self.connections.connection(api)
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut Connections {
        &mut self.connections
    }

    pub fn is_connected(&self, api: Api) -> bool {
        self.connections.is_connected(api)
    }

    /// Drop the connection `api` uses: its override if it has one,
    /// otherwise the default.
    pub fn disconnect(&mut self, api: Api) -> Option<Connection> {
        self.connections.disconnect(api)
    }

    pub fn disconnect_all(&mut self) {
        self.connections.disconnect_all();
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sign `params` with the connection for `api` and GET `method`.
    pub(crate) fn do_get(&self, api: Api, method: &str, params: &Params) -> Result<HttpResponse> {
        let connection = self.connections.connection(api)?;
        let url = connection.construct_url(api, method);
        let signed = connection.sign(params);
        log::debug!("GET {} [{}]", url, param_names(&signed));
        self.transport.get(&url, &signed)
    }

    /// Sign `params` with the connection for `api` and POST `method` as a
    /// multipart form with `files` attached.
    pub(crate) fn do_post(
        &self,
        api: Api,
        method: &str,
        params: &Params,
        files: &[FileField],
    ) -> Result<HttpResponse> {
        let connection = self.connections.connection(api)?;
        let url = connection.construct_url(api, method);
        let signed = connection.sign(params);
        log::debug!(
            "POST {} [{}] with {} file(s)",
            url,
            param_names(&signed),
            files.len()
        );
        self.transport.post_multipart(&url, &signed, files)
    }
}

/// Parameter names for logging. Values are left out so the signature never
/// reaches a log.
fn param_names(params: &BTreeMap<String, String>) -> String {
    params.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
