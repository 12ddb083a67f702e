//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol for read-aloud playback between the
//! browser client and the API server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Play the audio script of an analysis, or stop if something is playing.
    Play { analysis_id: Uuid },

    /// Stop playback. Ignored when nothing is playing.
    Stop,

    /// The client finished playing the last audio it was sent.
    AudioFinished,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================
// NOTE: Synthesized speech is sent as raw Binary frames, not as part of this enum.
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The speech engine started speaking. The UI shows a "Pause" control.
    PlaybackStarted,

    /// Playback ended, failed, or was stopped. The UI returns to "Play Audio".
    PlaybackEnded,

    /// Reports a problem with the last request.
    Error { message: String },
}
