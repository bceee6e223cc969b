//! Analytics API
//!
//! Reports are generated asynchronously: a `request_*` call returns a token,
//! and [`EpisodicClient::get_report`] fetches the report once it is ready.

use crate::client::EpisodicClient;
use crate::error::Result;
use crate::models::{Api, DateGrouping, DateRange, ReportFormat};
use crate::params::Params;
use crate::response::{check_error_envelope, TokenResponse};
use crate::transport::Transport;

impl<T: Transport> EpisodicClient<T> {
    /// Body of a generated report, CSV or XML depending on the format it was
    /// requested in.
    pub fn get_report(&self, token: &str) -> Result<String> {
        let params = Params::new().with("report_token", token);
        let response = self.do_get(Api::Analytics, "get_report", &params)?;
        check_error_envelope(&response)?;
        Ok(response.body)
    }

    pub fn episodes_summary_report(
        &self,
        show_id: &str,
        date_range: DateRange,
        date_grouping: DateGrouping,
        format: ReportFormat,
    ) -> Result<TokenResponse> {
        let params = Params::new()
            .with("show_id", show_id)
            .with("date_range", date_range)
            .with("date_grouping", date_grouping)
            .with("format", format);
        self.request_report("request_episodes_summary_report", &params)
    }

    pub fn episode_daily_report(
        &self,
        show_id: &str,
        episode_id: &str,
        date_range: DateRange,
        format: ReportFormat,
    ) -> Result<TokenResponse> {
        let params = Params::new()
            .with("show_id", show_id)
            .with("date_range", date_range)
            .with("id", episode_id)
            .with("format", format);
        self.request_report("request_episode_daily_report", &params)
    }

    pub fn campaigns_daily_report(
        &self,
        show_id: &str,
        date_range: DateRange,
        format: ReportFormat,
    ) -> Result<TokenResponse> {
        let params = Params::new()
            .with("show_id", show_id)
            .with("date_range", date_range)
            .with("format", format);
        self.request_report("request_campaigns_daily_report", &params)
    }

    fn request_report(&self, method: &str, params: &Params) -> Result<TokenResponse> {
        let response = self.do_get(Api::Analytics, method, params)?;
        TokenResponse::parse(response)
    }
}
