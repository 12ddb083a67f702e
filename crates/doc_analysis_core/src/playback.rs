//! crates/doc_analysis_core/src/playback.rs
//!
//! Drives a `SpeechEngine` for read-aloud playback.
//!
//! Only one utterance is ever active. Each play invocation gets a generation
//! number; engine events are applied only while their generation is still the
//! active one, so a superseded or stopped utterance can never flip the state.

use crate::error::{CoreError, CoreResult};
use crate::ports::{SpeechEngine, SpeechEvent, SpeechEventStream, Utterance};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
}

/// What a call to `toggle` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// A new utterance was handed to the engine.
    PlayRequested,
    /// The active utterance was cancelled.
    Stopped,
}

struct ActiveUtterance {
    generation: u64,
    listener: JoinHandle<()>,
}

#[derive(Default)]
struct PlaybackInner {
    generation: u64,
    active: Option<ActiveUtterance>,
}

impl PlaybackInner {
    fn is_current(&self, generation: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.generation == generation)
    }
}

pub struct PlaybackController {
    engine: Arc<dyn SpeechEngine>,
    inner: Arc<Mutex<PlaybackInner>>,
    state_tx: Arc<watch::Sender<PlaybackState>>,
}

impl PlaybackController {
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        let (state_tx, _) = watch::channel(PlaybackState::Idle);
        Self {
            engine,
            inner: Arc::new(Mutex::new(PlaybackInner::default())),
            state_tx: Arc::new(state_tx),
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.state_tx.borrow()
    }

    /// Observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state_tx.subscribe()
    }

    /// Stops the active utterance if there is one, otherwise speaks `text`.
    pub async fn toggle(&self, text: &str) -> CoreResult<ToggleOutcome> {
        let mut inner = self.inner.lock().await;
        if inner.active.is_some() {
            self.stop_locked(&mut inner);
            return Ok(ToggleOutcome::Stopped);
        }
        self.play_locked(&mut inner, text).await?;
        Ok(ToggleOutcome::PlayRequested)
    }

    /// Speaks `text`, cancelling anything already playing.
    pub async fn play(&self, text: &str) -> CoreResult<()> {
        let mut inner = self.inner.lock().await;
        self.play_locked(&mut inner, text).await
    }

    /// Cancels the active utterance. Does nothing when idle.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        self.stop_locked(&mut inner);
    }

    fn stop_locked(&self, inner: &mut PlaybackInner) {
        if let Some(active) = inner.active.take() {
            self.engine.cancel();
            active.listener.abort();
            self.state_tx.send_replace(PlaybackState::Idle);
            info!("Playback stopped (utterance {})", active.generation);
        }
    }

    async fn play_locked(&self, inner: &mut PlaybackInner, text: &str) -> CoreResult<()> {
        if text.trim().is_empty() {
            return Err(CoreError::EmptyInput("Audio script"));
        }
        self.stop_locked(inner);

        inner.generation += 1;
        let generation = inner.generation;

        let events = match self.engine.speak(Utterance::new(text)).await {
            Ok(events) => events,
            Err(e) => {
                // Engine errors end playback like a normal completion.
                warn!("Speech engine refused utterance {}: {}", generation, e);
                return Ok(());
            }
        };

        let listener = tokio::spawn(listen(
            events,
            generation,
            self.inner.clone(),
            self.state_tx.clone(),
        ));
        inner.active = Some(ActiveUtterance {
            generation,
            listener,
        });
        debug!("Utterance {} handed to speech engine", generation);
        Ok(())
    }
}

/// Applies one utterance's engine events until it ends, fails or closes.
async fn listen(
    mut events: SpeechEventStream,
    generation: u64,
    inner: Arc<Mutex<PlaybackInner>>,
    state_tx: Arc<watch::Sender<PlaybackState>>,
) {
    while let Some(event) = events.next().await {
        match event {
            SpeechEvent::Started => {
                if inner.lock().await.is_current(generation) {
                    state_tx.send_replace(PlaybackState::Playing);
                    info!("Playback started (utterance {})", generation);
                }
            }
            SpeechEvent::Ended => break,
            SpeechEvent::Error(reason) => {
                debug!("Utterance {} failed: {}", generation, reason);
                break;
            }
        }
    }

    let mut inner = inner.lock().await;
    if inner.is_current(generation) {
        inner.active = None;
        state_tx.send_replace(PlaybackState::Idle);
        info!("Playback finished (utterance {})", generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, PortResult};
    use async_trait::async_trait;
    use futures::channel::mpsc::{unbounded, UnboundedSender};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    /// A speech engine whose events are pushed by the test.
    #[derive(Default)]
    struct ScriptedEngine {
        spoken: StdMutex<Vec<Utterance>>,
        channels: StdMutex<Vec<UnboundedSender<SpeechEvent>>>,
        cancels: AtomicUsize,
        refuse: bool,
    }

    impl ScriptedEngine {
        fn emit(&self, utterance: usize, event: SpeechEvent) {
            let channels = self.channels.lock().unwrap();
            let _ = channels[utterance].unbounded_send(event);
        }

        fn cancels(&self) -> usize {
            self.cancels.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SpeechEngine for ScriptedEngine {
        async fn speak(&self, utterance: Utterance) -> PortResult<SpeechEventStream> {
            if self.refuse {
                return Err(PortError::Unexpected("no voices installed".to_string()));
            }
            let (tx, rx) = unbounded();
            self.spoken.lock().unwrap().push(utterance);
            self.channels.lock().unwrap().push(tx);
            Ok(Box::pin(rx))
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn wait_for(rx: &mut watch::Receiver<PlaybackState>, state: PlaybackState) {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| *s == state))
            .await
            .expect("timed out waiting for playback state")
            .expect("playback controller dropped");
    }

    #[tokio::test]
    async fn test_toggle_plays_then_stops() {
        let engine = Arc::new(ScriptedEngine::default());
        let controller = PlaybackController::new(engine.clone());
        let mut rx = controller.subscribe();

        let outcome = controller.toggle("Hello there.").await.unwrap();
        assert_eq!(outcome, ToggleOutcome::PlayRequested);
        assert_eq!(controller.state(), PlaybackState::Idle);

        engine.emit(0, SpeechEvent::Started);
        wait_for(&mut rx, PlaybackState::Playing).await;

        let outcome = controller.toggle("Hello there.").await.unwrap();
        assert_eq!(outcome, ToggleOutcome::Stopped);
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(engine.cancels(), 1);
        assert_eq!(engine.spoken.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_utterance_parameters() {
        let engine = Arc::new(ScriptedEngine::default());
        let controller = PlaybackController::new(engine.clone());
        controller.play("Read me.").await.unwrap();

        let spoken = engine.spoken.lock().unwrap();
        assert_eq!(spoken[0].text, "Read me.");
        assert_eq!(spoken[0].rate, 0.9);
        assert_eq!(spoken[0].pitch, 1.0);
        assert_eq!(spoken[0].volume, 1.0);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_a_no_op() {
        let engine = Arc::new(ScriptedEngine::default());
        let controller = PlaybackController::new(engine.clone());
        controller.stop().await;
        controller.stop().await;
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert_eq!(engine.cancels(), 0);
    }

    #[tokio::test]
    async fn test_end_settles_exactly_once() {
        let engine = Arc::new(ScriptedEngine::default());
        let controller = PlaybackController::new(engine.clone());
        let mut rx = controller.subscribe();

        controller.play("One.").await.unwrap();
        engine.emit(0, SpeechEvent::Started);
        wait_for(&mut rx, PlaybackState::Playing).await;
        engine.emit(0, SpeechEvent::Ended);
        wait_for(&mut rx, PlaybackState::Idle).await;

        // Late events for a finished utterance go nowhere.
        engine.emit(0, SpeechEvent::Started);
        tokio::task::yield_now().await;
        assert_eq!(controller.state(), PlaybackState::Idle);

        // With nothing active, toggling plays again instead of stopping.
        let outcome = controller.toggle("Two.").await.unwrap();
        assert_eq!(outcome, ToggleOutcome::PlayRequested);
    }

    #[tokio::test]
    async fn test_engine_error_is_treated_as_completion() {
        let engine = Arc::new(ScriptedEngine::default());
        let controller = PlaybackController::new(engine.clone());
        let mut rx = controller.subscribe();

        controller.play("One.").await.unwrap();
        engine.emit(0, SpeechEvent::Started);
        wait_for(&mut rx, PlaybackState::Playing).await;
        engine.emit(0, SpeechEvent::Error("audio device lost".to_string()));
        wait_for(&mut rx, PlaybackState::Idle).await;
    }

    #[tokio::test]
    async fn test_new_play_cancels_previous_utterance() {
        let engine = Arc::new(ScriptedEngine::default());
        let controller = PlaybackController::new(engine.clone());
        let mut rx = controller.subscribe();

        controller.play("First.").await.unwrap();
        engine.emit(0, SpeechEvent::Started);
        wait_for(&mut rx, PlaybackState::Playing).await;

        controller.play("Second.").await.unwrap();
        assert_eq!(engine.cancels(), 1);
        assert_eq!(controller.state(), PlaybackState::Idle);

        // The superseded utterance cannot end the new one.
        engine.emit(0, SpeechEvent::Ended);
        engine.emit(1, SpeechEvent::Started);
        wait_for(&mut rx, PlaybackState::Playing).await;
        tokio::task::yield_now().await;
        assert_eq!(controller.state(), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_refused_utterance_stays_idle() {
        let engine = Arc::new(ScriptedEngine {
            refuse: true,
            ..Default::default()
        });
        let controller = PlaybackController::new(engine.clone());
        let outcome = controller.toggle("Anything.").await.unwrap();
        assert_eq!(outcome, ToggleOutcome::PlayRequested);
        assert_eq!(controller.state(), PlaybackState::Idle);

        // Nothing became active, so the next toggle plays again.
        assert_eq!(
            controller.toggle("Anything.").await.unwrap(),
            ToggleOutcome::PlayRequested
        );
    }

    #[tokio::test]
    async fn test_empty_script_is_rejected() {
        let controller = PlaybackController::new(Arc::new(ScriptedEngine::default()));
        assert!(matches!(
            controller.toggle("  ").await,
            Err(CoreError::EmptyInput(_))
        ));
    }
}
