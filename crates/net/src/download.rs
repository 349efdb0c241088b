//! Artifact download with resume and progress reporting

use crate::client::Transport;
use crate::error_body::summarize_error_body;
use crate::service::PackageService;
use depot_errors::{Error, TransferError};
use depot_events::{AppEvent, DownloadEvent, EventEmitter, FailureContext};
use depot_progress::TransferMeter;
use depot_types::{Build, DownloadRequest};
use futures::StreamExt;
use reqwest::header::{HeaderValue, CONTENT_TYPE, RANGE};
use reqwest::{Method, Response, StatusCode};
use std::fmt;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// How a download is performed
#[derive(Default)]
pub struct DownloadOptions {
    /// Bytes of the artifact already present in the sink
    pub start_byte: u64,
    /// Suppress the size announcement and progress meter
    pub quiet: bool,
    /// Where progress goes; standard error when `None`
    pub progress_output: Option<Box<dyn Write + Send>>,
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("start_byte", &self.start_byte)
            .field("quiet", &self.quiet)
            .field("progress_output", &self.progress_output.is_some())
            .finish()
    }
}

/// Outcome of a completed download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadResult {
    /// Bytes written to the sink by this call
    pub bytes_written: u64,
    /// Size of the whole artifact, when the server reported a length
    pub total_size: Option<u64>,
    /// Whether the server continued from `start_byte`
    pub resumed: bool,
}

impl<T: Transport> PackageService<T> {
    /// Download the primary artifact of `build` into `sink`
    ///
    /// With `start_byte > 0` the server is asked to continue from that offset;
    /// the sink must already hold the first `start_byte` bytes. Progress goes
    /// to standard error unless `quiet` is set.
    ///
    /// # Errors
    ///
    /// See [`PackageService::download_artifact_with`].
    pub async fn download_artifact<W>(
        &self,
        product: &str,
        build: &Build,
        sink: &mut W,
        start_byte: u64,
        quiet: bool,
    ) -> Result<DownloadResult, Error>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let options = DownloadOptions {
            start_byte,
            quiet,
            progress_output: None,
        };
        self.download_artifact_with(product, build, sink, options)
            .await
    }

    /// Download the primary artifact of `build` into `sink` with explicit options
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Request` if the request cannot be built or
    /// sent, `TransferError::Status` for a status outside 2xx/3xx,
    /// `TransferError::ResumeRejected` when a resume was requested but the
    /// server did not answer `206 Partial Content`, `TransferError::Stream`
    /// if the body breaks off and `TransferError::Io` if the sink fails.
    pub async fn download_artifact_with<W>(
        &self,
        product: &str,
        build: &Build,
        sink: &mut W,
        options: DownloadOptions,
    ) -> Result<DownloadResult, Error>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url = self.endpoint(product, true)?;
        let url_text = url.to_string();

        let result = self.transfer(url, build, sink, options).await;
        match &result {
            Ok(done) => {
                tracing::info!(url = %url_text, bytes = done.bytes_written, "download completed");
                self.emit(AppEvent::Download(DownloadEvent::Completed {
                    url: url_text,
                    bytes: done.bytes_written,
                }));
            }
            Err(err) => {
                tracing::warn!(url = %url_text, error = %err, "download failed");
                self.emit(AppEvent::Download(DownloadEvent::Failed {
                    url: url_text,
                    failure: FailureContext::from_error(err),
                }));
            }
        }
        result
    }

    async fn transfer<W>(
        &self,
        url: url::Url,
        build: &Build,
        sink: &mut W,
        options: DownloadOptions,
    ) -> Result<DownloadResult, Error>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let url_text = url.to_string();
        let request_error = |message: String| TransferError::Request {
            url: url_text.clone(),
            message,
        };

        let body = serde_json::to_vec(&DownloadRequest::new(build))
            .map_err(|e| request_error(e.to_string()))?;
        let mut request = self.request(Method::GET, url)?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if options.start_byte > 0 {
            let range = HeaderValue::from_str(&format!("bytes={}-", options.start_byte))
                .map_err(|e| request_error(e.to_string()))?;
            request.headers_mut().insert(RANGE, range);
        }
        *request.body_mut() = Some(body.into());

        let response = self
            .send(request)
            .await
            .map_err(|e| request_error(e.to_string()))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            let body = response.text().await.unwrap_or_default();
            return Err(TransferError::Status {
                url: url_text,
                status: status.as_u16(),
                body: summarize_error_body(&body),
            }
            .into());
        }

        let resumed = status == StatusCode::PARTIAL_CONTENT;
        if options.start_byte > 0 && !resumed {
            return Err(TransferError::ResumeRejected {
                offset: options.start_byte,
                status: status.as_u16(),
            }
            .into());
        }

        // Content-Length counts the bytes left from the requested offset
        let total_size = response
            .content_length()
            .map(|remaining| options.start_byte + remaining);

        tracing::debug!(
            url = %url_text,
            status = status.as_u16(),
            total_size = ?total_size,
            resume_offset = options.start_byte,
            "download response received"
        );
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url_text.clone(),
            total_size,
            resume_offset: options.start_byte,
        }));

        let bytes_written = if options.quiet {
            copy_body(&url_text, response, sink).await?
        } else {
            let output = options
                .progress_output
                .unwrap_or_else(|| Box::new(std::io::stderr()));
            let mut meter = TransferMeter::new(&mut *sink, total_size, options.start_byte, output);
            meter.announce();
            let copied = copy_body(&url_text, response, &mut meter).await;
            meter.finish();
            copied?
        };

        Ok(DownloadResult {
            bytes_written,
            total_size,
            resumed,
        })
    }
}

/// Stream the response body into `sink`, returning the bytes written
async fn copy_body<W>(url: &str, response: Response, sink: &mut W) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| TransferError::Stream {
            url: url.to_string(),
            bytes: written,
            message: e.to_string(),
        })?;
        sink.write_all(&chunk).await.map_err(|e| TransferError::Io {
            message: e.to_string(),
        })?;
        written += chunk.len() as u64;
    }

    sink.flush().await.map_err(|e| TransferError::Io {
        message: e.to_string(),
    })?;
    Ok(written)
}
