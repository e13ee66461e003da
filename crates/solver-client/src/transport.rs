//! Ways of obtaining a solver response body as a stream of byte chunks.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use tracing::{debug, info};
use tsp_core_types::SolverMode;
use url::Url;

use crate::config::SolverConfig;
use crate::error::{HttpSetupError, TransportError};
use crate::request::SolverRequest;

pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

pub const UPLOAD_FILE_NAME: &str = "distance_matrix.csv";

#[async_trait]
pub trait SolverTransport: Send + Sync {
    /// Sends `request` and hands back the response body. Fails when the
    /// request cannot be established or the solver rejects it.
    async fn open(&self, request: &SolverRequest) -> Result<ByteStream, TransportError>;
}

/// Talks to the solver's HTTP endpoints.
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    pub fn new(config: &SolverConfig) -> Result<Self, HttpSetupError> {
        let base = config.base_url()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn build(&self, request: &SolverRequest) -> Result<RequestBuilder, TransportError> {
        match request.mode {
            SolverMode::Genetic => {
                let csv = request.distances.to_csv_string()?;
                let file = Part::text(csv)
                    .file_name(UPLOAD_FILE_NAME)
                    .mime_str("text/csv")?;
                let form = request
                    .params
                    .form_fields()
                    .into_iter()
                    .fold(Form::new().part("file", file), |form, (name, value)| {
                        form.text(name, value)
                    });
                Ok(self.client.post(self.endpoint("run-ga")).multipart(form))
            }
            SolverMode::BestFirst | SolverMode::BruteForce => {
                let path = if request.mode == SolverMode::BestFirst {
                    "best-first-search"
                } else {
                    "brute"
                };
                let matrix = request.distances.to_json()?;
                Ok(self
                    .client
                    .get(self.endpoint(path))
                    .query(&[("distance_matrix", matrix)]))
            }
        }
    }
}

#[async_trait]
impl SolverTransport for HttpTransport {
    async fn open(&self, request: &SolverRequest) -> Result<ByteStream, TransportError> {
        let builder = self.build(request)?;
        debug!(mode = %request.mode, base = %self.base, "sending solver request");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        info!(mode = %request.mode, status = status.as_u16(), "solver accepted request");
        Ok(response.bytes_stream().map_err(TransportError::from).boxed())
    }
}

/// Replays a recorded response body from disk in fixed-size chunks.
pub struct FileTransport {
    path: PathBuf,
    chunk_size: usize,
}

impl FileTransport {
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_chunk_size(path, Self::DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(path: impl Into<PathBuf>, chunk_size: usize) -> Self {
        Self {
            path: path.into(),
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl SolverTransport for FileTransport {
    async fn open(&self, request: &SolverRequest) -> Result<ByteStream, TransportError> {
        let body = Bytes::from(tokio::fs::read(&self.path).await?);
        debug!(
            mode = %request.mode,
            path = %self.path.display(),
            bytes = body.len(),
            chunk_size = self.chunk_size,
            "replaying recorded response"
        );
        Ok(stream::iter(split_chunks(body, self.chunk_size).into_iter().map(Ok)).boxed())
    }
}

fn split_chunks(body: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(body.len() / chunk_size + 1);
    let mut offset = 0;
    while offset < body.len() {
        let end = (offset + chunk_size).min(body.len());
        chunks.push(body.slice(offset..end));
        offset = end;
    }
    chunks
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use tsp_core_types::dataset::bundled_distances;

    #[test]
    fn chunks_cover_the_body() {
        let body = Bytes::from_static(b"0123456789");
        let chunks = split_chunks(body, 4);
        assert_eq!(chunks, vec![&b"0123"[..], &b"4567"[..], &b"89"[..]]);
        assert!(split_chunks(Bytes::new(), 4).is_empty());
    }

    #[tokio::test]
    async fn file_transport_streams_the_recording() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"data: {\"total_time\":1}\n\n").unwrap();
        let transport = FileTransport::with_chunk_size(file.path(), 5);
        let request = SolverRequest::best_first(Arc::new(bundled_distances().unwrap()));

        let chunks: Vec<Bytes> = transport
            .open(&request)
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.concat(), b"data: {\"total_time\":1}\n\n".to_vec());
    }

    #[tokio::test]
    async fn missing_recording_is_an_io_error() {
        let transport = FileTransport::new("/definitely/not/here.sse");
        let request = SolverRequest::best_first(Arc::new(bundled_distances().unwrap()));
        assert!(matches!(
            transport.open(&request).await,
            Err(TransportError::Io(_))
        ));
    }

    #[test]
    fn endpoints_ignore_trailing_slashes() {
        let config = SolverConfig {
            base_url: "http://solver.local:5000/".into(),
            ..SolverConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.endpoint("brute"), "http://solver.local:5000/brute");
    }
}
