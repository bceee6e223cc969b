//! Query API: shows, episodes, playlists and modification callbacks

use chrono::{DateTime, Utc};

use crate::client::EpisodicClient;
use crate::error::Result;
use crate::models::Api;
use crate::params::Params;
use crate::response::{check_error_envelope, EpisodesResponse, PlaylistsResponse, ShowsResponse};
use crate::transport::Transport;

impl<T: Transport> EpisodicClient<T> {
    /// Episodes matching `options`, e.g. `show_id`, `id`, `search_term`,
    /// `search_type`, `tag_mode`, `status`, `sort_by`, `sort_dir`, `page`
    /// and `per_page`.
    pub fn episodes(&self, options: Params) -> Result<EpisodesResponse> {
        let response = self.do_get(Api::Query, "episodes", &options)?;
        EpisodesResponse::parse(response)
    }

    /// Shows matching `options` (`id`, `sort_by`, `sort_dir`, `page`,
    /// `per_page`).
    pub fn shows(&self, options: Params) -> Result<ShowsResponse> {
        let response = self.do_get(Api::Query, "shows", &options)?;
        ShowsResponse::parse(response)
    }

    pub fn playlists(&self, options: Params) -> Result<PlaylistsResponse> {
        let response = self.do_get(Api::Query, "playlists", &options)?;
        PlaylistsResponse::parse(response)
    }

    /// Raw XML of the modification callbacks fired since `since`.
    pub fn modification_callbacks(&self, since: DateTime<Utc>, options: Params) -> Result<String> {
        let params = options.with("since", since);
        let response = self.do_get(Api::Query, "modification_callbacks", &params)?;
        check_error_envelope(&response)?;
        Ok(response.body)
    }
}
