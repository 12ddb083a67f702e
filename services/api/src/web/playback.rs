//! services/api/src/web/playback.rs
//!
//! The WebSocket endpoint for reading an audio script aloud. Each connection
//! owns its own speech engine and playback controller; audio is streamed as
//! Binary frames and state changes as JSON text frames.

use crate::{
    adapters::StreamingSpeechEngine,
    web::{
        protocol::{ClientMessage, ServerMessage},
        state::{AppState, SessionHandle},
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use doc_analysis_core::{
    playback::{PlaybackController, PlaybackState, ToggleOutcome},
    ports::TextToSpeechService,
};
use futures::{stream::StreamExt, Sink, SinkExt};
use std::sync::Arc;
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};
use uuid::Uuid;

type SharedSink<S> = Arc<Mutex<S>>;

/// Upgrades to a playback connection for one session. Unknown sessions are
/// rejected before the upgrade.
pub async fn playback_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, crate::error::ApiError> {
    let handle = app_state.sessions.get(session_id).await?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, app_state, handle, session_id)))
}

async fn handle_socket(
    socket: WebSocket,
    app_state: Arc<AppState>,
    handle: SessionHandle,
    session_id: Uuid,
) {
    info!("Playback connection opened for session {}", session_id);

    let (sender, mut receiver) = socket.split();
    let cancellation_token = handle.cancellation_token.clone();
    let connection = PlaybackConnection::open(app_state.tts_adapter.clone(), handle, sender);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Session {} closed; ending playback connection.", session_id);
                break;
            }
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => connection.handle_text(&text).await,
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            },
        }
    }

    connection.close().await;
    info!("Playback connection closed for session {}", session_id);
}

/// The server side of one playback connection, writing to any message sink.
struct PlaybackConnection<S> {
    handle: SessionHandle,
    engine: Arc<StreamingSpeechEngine>,
    controller: PlaybackController,
    sender: SharedSink<S>,
    forwarder: JoinHandle<()>,
}

impl<S> PlaybackConnection<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
{
    fn open(tts: Arc<dyn TextToSpeechService>, handle: SessionHandle, sink: S) -> Self {
        let sender = Arc::new(Mutex::new(sink));
        let (audio_tx, audio_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(StreamingSpeechEngine::new(tts, audio_tx));
        let controller = PlaybackController::new(engine.clone());
        let forwarder = tokio::spawn(forward_to_client(
            sender.clone(),
            audio_rx,
            controller.subscribe(),
        ));
        Self {
            handle,
            engine,
            controller,
            sender,
            forwarder,
        }
    }

    /// Dispatches one text frame from the client.
    async fn handle_text(&self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Play { analysis_id }) => self.play(analysis_id).await,
            Ok(ClientMessage::Stop) => self.controller.stop().await,
            Ok(ClientMessage::AudioFinished) => self.engine.client_finished(),
            Err(e) => {
                warn!("Failed to deserialize client message: {}", e);
                send_message(
                    &self.sender,
                    ServerMessage::Error {
                        message: format!("Invalid message: {}", e),
                    },
                )
                .await;
            }
        }
    }

    /// Toggles read-aloud of the analysis's audio script.
    async fn play(&self, analysis_id: Uuid) {
        let script = {
            let session = self.handle.state.lock().await;
            match session.analysis(analysis_id) {
                Ok(_) => session.audio_script(analysis_id).map(str::to_string),
                Err(e) => {
                    send_message(&self.sender, ServerMessage::Error { message: e.to_string() })
                        .await;
                    return;
                }
            }
        };
        let Some(script) = script else {
            send_message(
                &self.sender,
                ServerMessage::Error {
                    message: "No audio script has been generated for this analysis.".to_string(),
                },
            )
            .await;
            return;
        };

        match self.controller.toggle(&script).await {
            Ok(ToggleOutcome::PlayRequested) => info!("Playing audio script of {}", analysis_id),
            Ok(ToggleOutcome::Stopped) => info!("Stopped audio script of {}", analysis_id),
            Err(e) => {
                send_message(&self.sender, ServerMessage::Error { message: e.to_string() }).await;
            }
        }
    }

    async fn close(self) {
        self.controller.stop().await;
        self.forwarder.abort();
    }
}

/// Pushes synthesized audio and playback state changes to the client until
/// either source closes.
async fn forward_to_client<S>(
    sender: SharedSink<S>,
    mut audio_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut state_rx: watch::Receiver<PlaybackState>,
) where
    S: Sink<Message> + Unpin,
{
    loop {
        tokio::select! {
            audio = audio_rx.recv() => {
                let Some(audio) = audio else { break };
                if sender.lock().await.send(Message::Binary(audio.into())).await.is_err() {
                    error!("Failed to send audio to client.");
                    break;
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let msg = match *state_rx.borrow_and_update() {
                    PlaybackState::Playing => ServerMessage::PlaybackStarted,
                    PlaybackState::Idle => ServerMessage::PlaybackEnded,
                };
                send_message(&sender, msg).await;
            }
        }
    }
}

async fn send_message<S>(sender: &SharedSink<S>, msg: ServerMessage)
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(&msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return;
        }
    };
    if sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_err()
    {
        error!("Failed to send {:?} to client.", msg);
    }
}
