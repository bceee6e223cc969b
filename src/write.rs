//! Write API: assets, episodes, playlists and file uploads

use std::path::Path;

use crate::client::EpisodicClient;
use crate::error::{Error, Result};
use crate::models::Api;
use crate::params::Params;
use crate::response::{CreateUpdateEpisodeResponse, PendingUpload, WriteResponse};
use crate::transport::{FileField, Transport};

/// Form field the asset file is sent in.
const ASSET_FILE_FIELD: &str = "uploaded_data";
/// Form field the file is sent in when uploading to an upload URL.
const UPLOAD_FILE_FIELD: &str = "file";

impl<T: Transport> EpisodicClient<T> {
    /// Upload an asset (e.g. a pre-roll video or image) to a show. The
    /// response holds the new `asset_id`.
    pub fn create_asset(&self, show_id: &str, name: &str, file: impl AsRef<Path>) -> Result<WriteResponse> {
        let params = Params::new().with("show_id", show_id).with("name", name);
        let files = [FileField::new(ASSET_FILE_FIELD, file.as_ref())];
        let response = self.do_post(Api::Write, "create_asset", &params, &files)?;
        WriteResponse::parse(response)
    }

    /// Create an episode. `options` may carry `tags`, `description`,
    /// `video_filename`, `thumbnail_filename`, `air_date`, `off_air_date`,
    /// `publish`, `ping_url` and `custom_fields`.
    ///
    /// When filenames are given the response lists the uploads to perform
    /// with [`EpisodicClient::upload_file_for_episode`].
    pub fn create_episode(
        &self,
        show_id: &str,
        name: &str,
        options: Params,
    ) -> Result<CreateUpdateEpisodeResponse> {
        let params = options.with("show_id", show_id).with("name", name);
        let response = self.do_post(Api::Write, "create_episode", &params, &[])?;
        CreateUpdateEpisodeResponse::parse(response)
    }

    pub fn update_episode(&self, id: &str, options: Params) -> Result<CreateUpdateEpisodeResponse> {
        let params = options.with("id", id);
        let response = self.do_post(Api::Write, "update_episode", &params, &[])?;
        CreateUpdateEpisodeResponse::parse(response)
    }

    /// Create a playlist. `options` may carry `description`, `episode_ids`
    /// and `custom_fields`; the response holds `playlist_id`.
    pub fn create_playlist(&self, show_id: &str, name: &str, options: Params) -> Result<WriteResponse> {
        let params = options.with("show_id", show_id).with("name", name);
        let response = self.do_post(Api::Write, "create_playlist", &params, &[])?;
        WriteResponse::parse(response)
    }

    pub fn update_playlist(&self, id: &str, options: Params) -> Result<WriteResponse> {
        let params = options.with("id", id);
        let response = self.do_post(Api::Write, "update_playlist", &params, &[])?;
        WriteResponse::parse(response)
    }

    /// POST a local file to the upload URL returned by `create_episode` or
    /// `update_episode`. The upload carries its own credentials, so the
    /// request is not signed.
    pub fn upload_file_for_episode(&self, pending: &PendingUpload) -> Result<()> {
        let upload = &pending.upload;
        let files = [FileField::new(UPLOAD_FILE_FIELD, &pending.filepath)];
        log::debug!("Uploading {} to {}", pending.filepath.display(), upload.url);

        let response = self
            .transport()
            .post_multipart(&upload.url, &upload.params, &files)
            .map_err(|e| {
                log::warn!("Upload of {} failed: {}", upload.filename, e);
                Error::FileUploadFailed(e.to_string())
            })?;

        if response.status > 399 {
            log::warn!(
                "Upload of {} returned status {}",
                upload.filename,
                response.status
            );
            return Err(Error::FileUploadFailed(format!(
                "Status {} returned from file upload request",
                response.status
            )));
        }

        log::info!("Uploaded {} ({})", upload.filename, response.status);
        Ok(())
    }
}
