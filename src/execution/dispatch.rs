//! Backend dispatch.
//!
//! Sends a JSON body through the configured [`HttpTransport`] and returns the
//! raw output tagged by the response content type. The response mode is
//! decided exactly once here and never re-inferred downstream.

use std::sync::Arc;

use futures_util::{StreamExt, TryStreamExt};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead};
use tokio_util::io::StreamReader;

use super::transport::{
    ByteStream, HttpTransport, HttpTransportRequest, HttpTransportResponse, build_headers,
};
use crate::error::LlmError;
use crate::standards::ollama::utils::is_ndjson_content_type;
use crate::types::{RawBackendOutput, ResponseMode};

/// Sends requests to the backend. Holds no per-call state.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// POST `body` to `url` and collect the backend output.
    ///
    /// A non-success status fails with [`LlmError::TransportError`] carrying
    /// the status and the full raw body. Nothing is retried.
    pub async fn dispatch(
        &self,
        url: &str,
        body: serde_json::Value,
    ) -> Result<RawBackendOutput, LlmError> {
        let request = HttpTransportRequest {
            url: url.to_string(),
            headers: build_headers(),
            body,
        };
        let response = self.transport.execute_json(request).await?;

        if !response.is_success() {
            let status = response.status;
            let body = read_error_body(response.body).await;
            tracing::debug!(status, url, "backend returned an error status");
            return Err(LlmError::transport(status, body));
        }

        let mode = response_mode(&response);
        tracing::debug!(url, mode = ?mode, "dispatching backend response");

        match mode {
            ResponseMode::Stream => read_lines(response.body)
                .await
                .map(RawBackendOutput::Stream),
            ResponseMode::Batch => {
                let bytes = read_bytes(response.body).await?;
                serde_json::from_slice(&bytes)
                    .map(RawBackendOutput::Batch)
                    .map_err(|e| LlmError::ParseError(format!("Invalid Ollama response: {e}")))
            }
        }
    }
}

fn response_mode(response: &HttpTransportResponse) -> ResponseMode {
    if is_ndjson_content_type(response.content_type()) {
        ResponseMode::Stream
    } else {
        ResponseMode::Batch
    }
}

async fn read_bytes(body: ByteStream) -> Result<Vec<u8>, LlmError> {
    body.try_fold(Vec::new(), |mut acc, chunk| async move {
        acc.extend_from_slice(&chunk);
        Ok(acc)
    })
    .await
}

/// Whatever part of an error body arrives before the stream fails.
async fn read_error_body(mut body: ByteStream) -> String {
    let mut bytes = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(chunk) => bytes.extend_from_slice(&chunk),
            Err(e) => {
                tracing::debug!(error = %e, "error body truncated");
                break;
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Split an NDJSON body into lines in arrival order. Blank lines are dropped;
/// line contents are not interpreted here. A body that fails partway fails as
/// a whole; lines read so far are discarded.
async fn read_lines(body: ByteStream) -> Result<Vec<String>, LlmError> {
    let reader = StreamReader::new(body.map(|chunk| chunk.map_err(std::io::Error::other)));
    let mut frames = FramedRead::new(reader, AnyDelimiterCodec::new(vec![b'\n'], vec![b'\n']));

    let mut lines = Vec::new();
    while let Some(frame) = frames.next().await {
        let frame = frame.map_err(stream_error)?;
        let line = String::from_utf8_lossy(&frame);
        let line = line.trim_end_matches('\r');
        if !line.trim().is_empty() {
            lines.push(line.to_string());
        }
    }
    Ok(lines)
}

/// Recover the transport's own error from the framing layer.
fn stream_error(err: AnyDelimiterCodecError) -> LlmError {
    match err {
        AnyDelimiterCodecError::Io(io) => io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<LlmError>())
            .cloned()
            .unwrap_or_else(|| LlmError::HttpError(format!("Stream error: {io}"))),
        other => LlmError::HttpError(format!("Stream error: {other}")),
    }
}
