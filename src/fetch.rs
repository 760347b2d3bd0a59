use std::io::{Read, Write};
use std::time::Duration;

use camino::Utf8Path;
use reqwest::blocking::{Client, Response};

use crate::error::GrabError;

pub trait PhotoFetcher: Send + Sync {
    /// Downloads `url` into `destination`, returning the number of bytes written.
    ///
    /// Nothing is left at `destination` when this returns an error.
    fn fetch(&self, url: &str, destination: &Utf8Path) -> Result<u64, GrabError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    chunk_size: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, chunk_size: usize) -> Result<Self, GrabError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| GrabError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            chunk_size: chunk_size.max(1),
        })
    }

    fn handle_status(response: Response) -> Result<Response, GrabError> {
        if response.status().is_success() {
            return Ok(response);
        }
        Err(GrabError::HttpStatus {
            status: response.status().as_u16(),
            url: response.url().to_string(),
        })
    }

    fn write_body(
        &self,
        response: &mut Response,
        destination: &Utf8Path,
    ) -> Result<u64, GrabError> {
        let parent = match destination.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".grab-photos")
            .suffix(".part")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| GrabError::Filesystem(format!("create temp file in {parent}: {err}")))?;

        let mut buffer = vec![0u8; self.chunk_size];
        let mut written = 0u64;
        loop {
            let read = response
                .read(&mut buffer)
                .map_err(|err| GrabError::Transport(err.to_string()))?;
            if read == 0 {
                break;
            }
            temp.write_all(&buffer[..read])
                .map_err(|err| GrabError::Filesystem(err.to_string()))?;
            written += read as u64;
        }
        temp.flush()
            .map_err(|err| GrabError::Filesystem(err.to_string()))?;

        temp.persist(destination.as_std_path())
            .map_err(|err| GrabError::Filesystem(format!("persist {destination}: {}", err.error)))?;
        Ok(written)
    }
}

impl PhotoFetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Utf8Path) -> Result<u64, GrabError> {
        tracing::debug!(%url, %destination, "requesting photo");
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| GrabError::Transport(err.to_string()))?;
        let mut response = Self::handle_status(response)?;
        let written = self.write_body(&mut response, destination)?;
        tracing::debug!(
            %url,
            bytes = written,
            latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "photo stored"
        );
        Ok(written)
    }
}
