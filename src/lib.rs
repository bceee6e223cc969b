//! Episodic Platform API client
//!
//! A blocking client for the Episodic Platform REST API (v2). Requests are
//! signed with the account's secret key, sent over HTTP and their XML
//! responses decoded into typed items.
//!
//! ```no_run
//! use episodic_platform::{Connection, EpisodicClient, Item, Params};
//!
//! # fn main() -> episodic_platform::Result<()> {
//! let client = EpisodicClient::new(Connection::new("api key", "secret key"));
//! let response = client.episodes(Params::new().with("show_id", "5"))?;
//! for episode in response.episodes() {
//!     println!("{:?} {:?}", episode.id(), episode.air_date());
//! }
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod items;
pub mod models;
pub mod params;
pub mod query;
pub mod response;
pub mod signature;
pub mod transport;
pub mod write;
pub mod xml;

pub use client::EpisodicClient;
pub use config::ClientConfig;
pub use connection::{Connection, Connections};
pub use error::{Error, ErrorKind, Result};
pub use items::{CustomFieldValue, FieldValue, Item};
pub use models::{Api, DateGrouping, DateRange, ReportFormat};
pub use params::{ParamValue, Params};
pub use response::{
    CreateUpdateEpisodeResponse, EpisodesResponse, PendingUpload, PlaylistsResponse, ShowsResponse,
    TokenResponse, Upload, WriteResponse,
};
pub use transport::{HttpResponse, Transport, UreqTransport};
