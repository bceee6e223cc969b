//! HTTP transport for Platform requests
//!
//! [`Transport`] is the seam between request building and the network.
//! [`UreqTransport`] is the real implementation; tests plug in their own.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::Result;

/// Status code and raw body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A local file sent as one part of a multipart POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileField {
    /// Form field name, e.g. `file` or `uploaded_data`.
    pub name: String,
    pub path: PathBuf,
}

impl FileField {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

pub trait Transport {
    /// GET `url` with `params` as the query string.
    fn get(&self, url: &str, params: &BTreeMap<String, String>) -> Result<HttpResponse>;

    /// POST `fields` and `files` to `url` as `multipart/form-data`.
    fn post_multipart(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
        files: &[FileField],
    ) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, params: &BTreeMap<String, String>) -> Result<HttpResponse> {
        (**self).get(url, params)
    }

    fn post_multipart(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
        files: &[FileField],
    ) -> Result<HttpResponse> {
        (**self).post_multipart(url, fields, files)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &str, params: &BTreeMap<String, String>) -> Result<HttpResponse> {
        (**self).get(url, params)
    }

    fn post_multipart(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
        files: &[FileField],
    ) -> Result<HttpResponse> {
        (**self).post_multipart(url, fields, files)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &str, params: &BTreeMap<String, String>) -> Result<HttpResponse> {
        (**self).get(url, params)
    }

    fn post_multipart(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
        files: &[FileField],
    ) -> Result<HttpResponse> {
        (**self).post_multipart(url, fields, files)
    }
}

/// Build `?a=1&b=2` with every name and value percent-encoded.
/// Returns an empty string for no params.
pub fn build_query_string(params: &BTreeMap<String, String>) -> String {
    let mut query = String::new();
    for (index, (name, value)) in params.iter().enumerate() {
        query.push(if index == 0 { '?' } else { '&' });
        query.push_str(&urlencoding::encode(name));
        query.push('=');
        query.push_str(&urlencoding::encode(value));
    }
    query
}

/// Incrementally built `multipart/form-data` body.
///
/// File parts are read from disk only while the body is sent, so a form
/// costs the size of its text parts plus a buffer, whatever the file sizes.
pub struct MultipartForm {
    boundary: String,
    parts: Vec<Part>,
}

enum Part {
    Bytes(Vec<u8>),
    File { path: PathBuf, len: u64 },
}

impl Part {
    fn len(&self) -> u64 {
        match self {
            Part::Bytes(bytes) => bytes.len() as u64,
            Part::File { len, .. } => *len,
        }
    }
}

/// A finished form ready to send.
pub struct MultipartBody {
    pub content_type: String,
    pub content_length: u64,
    pub reader: Box<dyn Read + Send>,
}

impl MultipartBody {
    /// Read the whole body into memory.
    pub fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        let mut body = Vec::with_capacity(self.content_length as usize);
        self.reader.read_to_end(&mut body)?;
        Ok(body)
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("----episodic-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        match self.parts.last_mut() {
            Some(Part::Bytes(last)) => last.extend_from_slice(bytes),
            _ => self.parts.push(Part::Bytes(bytes.to_vec())),
        }
    }

    fn push_file_header(&mut self, name: &str, filename: &str) {
        let header = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            self.boundary,
            escape_quoted(name),
            escape_quoted(filename)
        );
        self.push_bytes(header.as_bytes());
    }

    pub fn add_text(&mut self, name: &str, value: &str) {
        let part = format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
            self.boundary,
            escape_quoted(name),
            value
        );
        self.push_bytes(part.as_bytes());
    }

    pub fn add_bytes(&mut self, name: &str, filename: &str, data: &[u8]) {
        self.push_file_header(name, filename);
        self.push_bytes(data);
        self.push_bytes(b"\r\n");
    }

    /// Add `path` as a file part named after its basename. The file must
    /// exist now and is read when the body is sent.
    pub fn add_file(&mut self, name: &str, path: &Path) -> std::io::Result<()> {
        let len = std::fs::metadata(path)?.len();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());
        self.push_file_header(name, &filename);
        self.parts.push(Part::File {
            path: path.to_path_buf(),
            len,
        });
        self.push_bytes(b"\r\n");
        Ok(())
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the form and open its files.
    pub fn finish(mut self) -> std::io::Result<MultipartBody> {
        let closing = format!("--{}--\r\n", self.boundary);
        self.push_bytes(closing.as_bytes());

        let content_type = self.content_type();
        let content_length = self.parts.iter().map(Part::len).sum();
        let mut reader: Box<dyn Read + Send> = Box::new(std::io::empty());
        for part in self.parts {
            reader = match part {
                Part::Bytes(bytes) => Box::new(reader.chain(Cursor::new(bytes))),
                Part::File { path, len } => Box::new(reader.chain(File::open(path)?.take(len))),
            };
        }

        Ok(MultipartBody {
            content_type,
            content_length,
            reader,
        })
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('"', "%22").replace('\r', "%0D").replace('\n', "%0A")
}

/// Blocking transport backed by a `ureq::Agent`.
///
/// GET requests give up when response headers take longer than the
/// configured response timeout. Uploads have no deadline beyond connecting.
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
    max_response_bytes: u64,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::from_config(&ClientConfig::default())
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_connect(Some(Duration::from_secs(config.connect_timeout_secs)))
            .timeout_recv_response(Some(Duration::from_secs(config.response_timeout_secs)))
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            agent,
            user_agent: config.user_agent.clone(),
            max_response_bytes: config.max_response_bytes,
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    fn read_response(&self, mut response: ureq::http::Response<ureq::Body>) -> Result<HttpResponse> {
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .with_config()
            .limit(self.max_response_bytes)
            .read_to_string()?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, params: &BTreeMap<String, String>) -> Result<HttpResponse> {
        let full_url = format!("{}{}", url, build_query_string(params));
        let response = self
            .agent
            .get(&full_url)
            .header("User-Agent", &self.user_agent)
            .call()?;
        self.read_response(response)
    }

    fn post_multipart(
        &self,
        url: &str,
        fields: &BTreeMap<String, String>,
        files: &[FileField],
    ) -> Result<HttpResponse> {
        let mut form = MultipartForm::new();
        for (name, value) in fields {
            form.add_text(name, value);
        }
        for file in files {
            form.add_file(&file.name, &file.path)?;
        }
        let body = form.finish()?;

        let response = self
            .agent
            .post(url)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", &body.content_type)
            .header("Content-Length", &body.content_length.to_string())
            .config()
            .timeout_recv_response(None)
            .build()
            .send(ureq::SendBody::from_owned_reader(body.reader))?;
        self.read_response(response)
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
