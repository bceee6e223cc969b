//! Parsed Platform responses
//!
//! Every XML response has a single root element. An `<error>` root becomes
//! an [`Error::Response`]; any other root is stripped and its children are
//! kept for the typed response wrappers below.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, InvalidParameter, ResponseError, Result};
use crate::items::{to_integer, CollectionItem, EpisodeItem, PlaylistItem, ShowItem};
use crate::transport::HttpResponse;
use crate::xml::{self, XmlMap, XmlValue};

const ERROR_ROOT: &str = "error";

/// A successful response with its root element removed.
#[derive(Debug, Clone)]
pub struct Response {
    http: HttpResponse,
    body: XmlMap,
}

impl Response {
    /// Decode `http.body`, turning an error envelope into an error.
    ///
    /// `force_array` lists elements that must decode as lists even when a
    /// single one is present.
    pub fn parse(http: HttpResponse, force_array: &[&str]) -> Result<Self> {
        let doc = match xml::parse(&http.body, force_array) {
            Ok(doc) => doc,
            Err(e) if http.status >= 400 => {
                log::warn!("HTTP {} with undecodable body: {}", http.status, e);
                return Err(Error::Status {
                    status: http.status,
                    body: http.body,
                });
            }
            Err(e) => return Err(e),
        };

        if let Some(error) = doc.get(ERROR_ROOT) {
            return Err(envelope_error(error, &http));
        }

        let body = doc
            .into_values()
            .next()
            .map(|root| root.to_map())
            .unwrap_or_default();
        Ok(Self { http, body })
    }

    /// The unparsed XML.
    pub fn xml(&self) -> &str {
        &self.http.body
    }

    pub fn status(&self) -> u16 {
        self.http.status
    }

    pub fn http(&self) -> &HttpResponse {
        &self.http
    }

    /// Children of the root element.
    pub fn body(&self) -> &XmlMap {
        &self.body
    }

    pub fn get(&self, name: &str) -> Option<&XmlValue> {
        self.body.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name)?.text()
    }
}

/// Fail if `http` carries an error envelope, for endpoints whose successful
/// body is returned as is (reports, modification callbacks).
pub fn check_error_envelope(http: &HttpResponse) -> Result<()> {
    let trimmed = http.body.trim_start();
    let looks_like_error = trimmed.starts_with("<?xml") || trimmed.starts_with("<error");
    if looks_like_error {
        if let Ok(doc) = xml::parse(&http.body, &[]) {
            if let Some(error) = doc.get(ERROR_ROOT) {
                return Err(envelope_error(error, http));
            }
        }
    }
    if http.status >= 400 {
        return Err(Error::Status {
            status: http.status,
            body: http.body.clone(),
        });
    }
    Ok(())
}

fn envelope_error(error: &XmlValue, http: &HttpResponse) -> Error {
    let code = error.get("code").and_then(XmlValue::text).map(to_integer).unwrap_or(0);
    let message = error
        .get("message")
        .and_then(XmlValue::text)
        .unwrap_or_default()
        .to_string();

    let invalid_parameters = error
        .get("invalid_parameters")
        .and_then(|p| p.get("invalid_parameter"))
        .map(|list| {
            list.as_slice()
                .iter()
                .map(|p| InvalidParameter {
                    name: p.get("name").and_then(XmlValue::text).unwrap_or_default().to_string(),
                    message: p.text().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    log::warn!("Platform returned error {}: {}", code, message);
    ResponseError::new(code, message, invalid_parameters, http.clone()).into()
}

/// A paged list of items with `page`, `pages`, `total` and `per_page`.
#[derive(Debug, Clone)]
pub struct CollectionResponse<I> {
    response: Response,
    items: Vec<I>,
}

pub type ShowsResponse = CollectionResponse<ShowItem>;
pub type EpisodesResponse = CollectionResponse<EpisodeItem>;
pub type PlaylistsResponse = CollectionResponse<PlaylistItem>;

impl<I: CollectionItem> CollectionResponse<I> {
    pub fn parse(http: HttpResponse) -> Result<Self> {
        let response = Response::parse(http, I::FORCE_ARRAY)?;
        let items = response
            .get(I::ELEMENT)
            .map(|v| v.as_slice().iter().map(|e| I::from_map(e.to_map())).collect())
            .unwrap_or_default();
        Ok(Self { response, items })
    }

    pub fn items(&self) -> &[I] {
        &self.items
    }

    pub fn into_items(self) -> Vec<I> {
        self.items
    }
}

impl<I> CollectionResponse<I> {
    fn pagination(&self, name: &str) -> i64 {
        self.response.text(name).map(to_integer).unwrap_or(0)
    }

    pub fn page(&self) -> i64 {
        self.pagination("page")
    }

    pub fn pages(&self) -> i64 {
        self.pagination("pages")
    }

    pub fn total(&self) -> i64 {
        self.pagination("total")
    }

    pub fn per_page(&self) -> i64 {
        self.pagination("per_page")
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn xml(&self) -> &str {
        self.response.xml()
    }
}

impl CollectionResponse<ShowItem> {
    pub fn shows(&self) -> &[ShowItem] {
        &self.items
    }
}

impl CollectionResponse<EpisodeItem> {
    pub fn episodes(&self) -> &[EpisodeItem] {
        &self.items
    }
}

impl CollectionResponse<PlaylistItem> {
    pub fn playlists(&self) -> &[PlaylistItem] {
        &self.items
    }
}

/// Response to a write call, holding the id of the created or updated object.
#[derive(Debug, Clone)]
pub struct WriteResponse {
    response: Response,
}

impl WriteResponse {
    pub fn parse(http: HttpResponse) -> Result<Self> {
        Self::parse_with(http, &[])
    }

    fn parse_with(http: HttpResponse, force_array: &[&str]) -> Result<Self> {
        Ok(Self {
            response: Response::parse(http, force_array)?,
        })
    }

    /// Any top level value, e.g. `get("playlist_id")`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.response.text(name)
    }

    pub fn episode_id(&self) -> Option<&str> {
        self.get("episode_id")
    }

    pub fn playlist_id(&self) -> Option<&str> {
        self.get("playlist_id")
    }

    pub fn asset_id(&self) -> Option<&str> {
        self.get("asset_id")
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn xml(&self) -> &str {
        self.response.xml()
    }
}

/// A server-issued upload target: POST the file with `params` to `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub url: String,
    pub params: BTreeMap<String, String>,
}

impl Upload {
    fn from_value(value: &XmlValue) -> Self {
        let text = |name: &str| {
            value
                .get(name)
                .and_then(XmlValue::text)
                .unwrap_or_default()
                .to_string()
        };

        let params = value
            .get("param")
            .map(|p| {
                p.as_slice()
                    .iter()
                    .filter_map(|param| {
                        let name = param.get("name")?.text()?;
                        Some((name.to_string(), param.text().unwrap_or_default().to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            filename: text("filename"),
            url: text("url"),
            params,
        }
    }
}

/// An [`Upload`] paired with the local file to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub filepath: PathBuf,
    pub upload: Upload,
}

/// Response to `create_episode` and `update_episode`, listing the uploads
/// the server expects next.
#[derive(Debug, Clone)]
pub struct CreateUpdateEpisodeResponse {
    write: WriteResponse,
    uploads: Vec<Upload>,
}

impl CreateUpdateEpisodeResponse {
    const FORCE_ARRAY: &'static [&'static str] = &["upload", "param"];

    pub fn parse(http: HttpResponse) -> Result<Self> {
        let write = WriteResponse::parse_with(http, Self::FORCE_ARRAY)?;
        let uploads = write
            .response
            .get("upload")
            .map(|u| u.as_slice().iter().map(Upload::from_value).collect())
            .unwrap_or_default();
        Ok(Self { write, uploads })
    }

    pub fn episode_id(&self) -> Option<&str> {
        self.write.episode_id()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.write.get(name)
    }

    pub fn uploads(&self) -> &[Upload] {
        &self.uploads
    }

    /// Find the upload whose filename matches the basename of `filepath`.
    pub fn upload_for_filepath(&self, filepath: impl AsRef<Path>) -> Option<PendingUpload> {
        let filepath = filepath.as_ref();
        let filename = filepath.file_name()?.to_str()?;
        self.uploads
            .iter()
            .find(|u| u.filename == filename)
            .map(|upload| PendingUpload {
                filepath: filepath.to_path_buf(),
                upload: upload.clone(),
            })
    }

    pub fn as_write(&self) -> &WriteResponse {
        &self.write
    }

    pub fn xml(&self) -> &str {
        self.write.xml()
    }
}

/// Response to a report request, carrying the token to fetch it with.
#[derive(Debug, Clone)]
pub struct TokenResponse {
    response: Response,
}

impl TokenResponse {
    pub fn parse(http: HttpResponse) -> Result<Self> {
        Ok(Self {
            response: Response::parse(http, &[])?,
        })
    }

    pub fn token(&self) -> Option<&str> {
        self.response.text("report_token").filter(|t| !t.is_empty())
    }

    pub fn xml(&self) -> &str {
        self.response.xml()
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
