//! services/api/src/adapters/speech.rs
//!
//! A `SpeechEngine` that synthesizes each utterance with a `TextToSpeechService`
//! and streams the audio to a connected client, which plays it and reports back
//! when it is done.

use async_trait::async_trait;
use doc_analysis_core::ports::{
    PortResult, SpeechEngine, SpeechEvent, SpeechEventStream, TextToSpeechService, Utterance,
};
use futures::channel::mpsc as event_channel;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub struct StreamingSpeechEngine {
    tts: Arc<dyn TextToSpeechService>,
    audio_tx: mpsc::UnboundedSender<Vec<u8>>,
    client_finished: Arc<Notify>,
    current: Mutex<CancellationToken>,
}

impl StreamingSpeechEngine {
    /// Audio for each utterance is pushed into `audio_tx` as one buffer.
    pub fn new(
        tts: Arc<dyn TextToSpeechService>,
        audio_tx: mpsc::UnboundedSender<Vec<u8>>,
    ) -> Self {
        Self {
            tts,
            audio_tx,
            client_finished: Arc::new(Notify::new()),
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// The client reports that the audio it was sent has finished playing.
    pub fn client_finished(&self) {
        self.client_finished.notify_waiters();
    }

    fn next_token(&self) -> CancellationToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = CancellationToken::new();
        current.clone()
    }
}

#[async_trait]
impl SpeechEngine for StreamingSpeechEngine {
    async fn speak(&self, utterance: Utterance) -> PortResult<SpeechEventStream> {
        let token = self.next_token();
        let (events_tx, events_rx) = event_channel::unbounded();
        let tts = self.tts.clone();
        let audio_tx = self.audio_tx.clone();
        let client_finished = self.client_finished.clone();

        tokio::spawn(async move {
            let audio = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                audio = tts.generate_audio(&utterance.text) => audio,
            };
            let audio = match audio {
                Ok(audio) => audio,
                Err(e) => {
                    warn!("Speech synthesis failed: {}", e);
                    let _ = events_tx.unbounded_send(SpeechEvent::Error(e.to_string()));
                    return;
                }
            };

            let finished = client_finished.notified();
            tokio::pin!(finished);
            finished.as_mut().enable();

            let has_audio = !audio.is_empty();
            if has_audio && audio_tx.send(audio).is_err() {
                let _ = events_tx
                    .unbounded_send(SpeechEvent::Error("client disconnected".to_string()));
                return;
            }
            let _ = events_tx.unbounded_send(SpeechEvent::Started);

            if has_audio {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Utterance cancelled during playback");
                        return;
                    }
                    _ = &mut finished => {}
                }
            }
            let _ = events_tx.unbounded_send(SpeechEvent::Ended);
        });

        Ok(Box::pin(events_rx))
    }

    fn cancel(&self) {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}
