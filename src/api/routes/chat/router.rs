//! Router for the chat API

use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response, sse::Event, sse::KeepAlive, sse::Sse},
    routing::get,
};
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;

type SharedState = Arc<RwLock<AppState>>;

/// Submit the next turn for the authenticated session and stream the
/// reply back as server-sent events.
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<Response, ApiError> {
    let (conversation, api_hostname, api_key, model) = {
        let s = state.read().expect("Unable to read shared state");
        let Some(conversation) = s.session.conversation() else {
            return Ok(
                (StatusCode::UNAUTHORIZED, "Sign in before chatting".to_string())
                    .into_response(),
            );
        };
        (
            conversation,
            s.config.openai_api_hostname.clone(),
            s.config.openai_api_key.clone(),
            s.config.openai_model.clone(),
        )
    };

    if payload.message.trim().is_empty() {
        return Ok((StatusCode::BAD_REQUEST, "Message cannot be empty".to_string())
            .into_response());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let (tx_event, rx_event) = mpsc::unbounded_channel::<Event>();

    // Reply fragments become plain data events; a failed turn is
    // surfaced as a named `error` event so the display surface can
    // tell it apart from model output
    let forward = tx_event.clone();
    let forwarder = tokio::spawn(async move {
        while let Some(fragment) = rx.recv().await {
            let _ = forward.send(Event::default().data(fragment));
        }
    });

    // Run the turn in the background while fragments stream out. The
    // mutex holds the single-active-turn guarantee for the session.
    tokio::spawn(async move {
        let result = conversation
            .lock()
            .await
            .submit_turn(&payload.message, tx, &api_hostname, &api_key, &model)
            .await;
        // The fragment sender is gone once the turn returns; draining
        // the forwarder keeps the error event after every fragment
        let _ = forwarder.await;
        if let Err(e) = result {
            tracing::error!("Chat turn failed: {}. Root cause: {}", e, e.root_cause());
            let _ = tx_event.send(
                Event::default()
                    .event("error")
                    .data(format!("Something went wrong: {}", e)),
            );
        }
    });

    let sse_stream =
        UnboundedReceiverStream::new(rx_event).map(Ok::<Event, Infallible>);

    let resp = Sse::new(sse_stream)
        .keep_alive(
            KeepAlive::default()
                .text("keep-alive")
                .interval(Duration::from_millis(100)),
        )
        .into_response();

    Ok(resp)
}

/// The transcript for the authenticated session, oldest first.
async fn transcript(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let conversation = {
        let s = state.read().expect("Unable to read shared state");
        s.session.conversation()
    };
    let Some(conversation) = conversation else {
        return Ok(
            (StatusCode::UNAUTHORIZED, "Sign in before chatting".to_string()).into_response(),
        );
    };

    let transcript = conversation.lock().await.transcript();
    Ok(axum::Json(public::ChatTranscriptResponse { transcript }).into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new().route("/", get(transcript).post(chat_handler))
}
