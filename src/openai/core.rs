//! Client for OpenAI compatible chat completion APIs in streaming
//! mode. The response is a lazy, finite sequence of text fragments
//! which are forwarded to the receiver channel as they arrive.

use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::chat::Message;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Request(#[source] anyhow::Error),
    #[error("completion stream interrupted: {source}")]
    Interrupted {
        // Fragments received before the failure, concatenated
        partial: String,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Delta {
    Content { content: String },

    Stop {},
}

#[derive(Debug, Deserialize)]
struct CompletionChunkChoice {
    #[allow(dead_code)]
    index: usize,
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[allow(dead_code)]
    id: String,
    choices: Vec<CompletionChunkChoice>,
}

/// Request the next completion for `messages` in streaming mode,
/// sending each content fragment through `tx` as soon as it is
/// parsed. Returns the concatenated reply once the stream finishes.
/// A mid-stream failure returns whatever fragments were received so
/// the caller can decide what to do with the partial reply.
pub async fn completion_stream(
    tx: mpsc::UnboundedSender<String>,
    messages: &[Message],
    api_hostname: &str,
    api_key: &str,
    model: &str,
) -> Result<String, CompletionError> {
    let payload = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(Duration::from_secs(60 * 5))
        .json(&payload)
        .send()
        .await
        .map_err(|e| CompletionError::Request(e.into()))?;

    if !response.status().is_success() {
        return Err(CompletionError::Request(anyhow::anyhow!(
            "completion endpoint returned {}",
            response.status()
        )));
    }

    let mut stream = response.bytes_stream();

    let mut content_buf = String::from("");
    let mut buffer = String::new();

    let interrupted = |partial: &String, source: anyhow::Error| CompletionError::Interrupted {
        partial: partial.clone(),
        source,
    };

    'outer: while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| interrupted(&content_buf, e.into()))?;
        let chunk_str = std::str::from_utf8(&chunk)
            .map_err(|e| interrupted(&content_buf, e.into()))?;

        // Append new data to buffer. This is necessary to handle SSE
        // fragmentation over HTTP/2 frames.
        buffer.push_str(chunk_str);

        // Process all complete SSE events from the buffer
        while let Some(event_end) = buffer.find("\n\n") {
            let event_data = buffer[..event_end].to_string();
            buffer = buffer[event_end + 2..].to_string();

            // Skip empty events
            let event_data = event_data.trim();
            if event_data.is_empty() {
                continue;
            }

            // Parse SSE events
            if !event_data.starts_with("data: ") {
                continue;
            }

            // Extract the JSON payload (after "data: ")
            let data = event_data[6..].trim();

            // Data can sometimes be empty. Not sure why.
            if data.is_empty() {
                continue;
            }

            // Handle the end of the stream
            if data == "[DONE]" {
                break 'outer;
            }

            // Process the delta
            let chunk = serde_json::from_str::<CompletionChunk>(data)
                .inspect_err(|e| {
                    tracing::error!("Parsing completion chunk failed for {}\nError:{}", data, e)
                })
                .map_err(|e| interrupted(&content_buf, e.into()))?;
            let Some(choice) = chunk.choices.first() else {
                continue;
            };

            match &choice.delta {
                Delta::Content { content } => {
                    content_buf += content;

                    // Forward the fragment to the receiver channel.
                    // The result is ignored here because processing
                    // the response continues even if the display side
                    // went away.
                    let _ = tx.send(content.clone());

                    if choice.finish_reason.is_some() {
                        break 'outer;
                    }
                }
                Delta::Stop {} => {
                    break 'outer;
                }
            }
        }
    }

    Ok(content_buf)
}
