//! Voice input: an optional speech-to-text capability feeding the chat input box

use std::path::Path;

use log::{error, info, warn};

use crate::chat::{lock_session, ChatSession, SharedSession};
use crate::error::SpeechError;
use crate::prompts::{
    VOICE_BUSY_MESSAGE, VOICE_NO_MATCH_MESSAGE, VOICE_PERMISSION_MESSAGE,
    VOICE_UNSUPPORTED_MESSAGE,
};

const WHISPER_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";
const WHISPER_MODEL: &str = "whisper-1";

/// Recorded audio handed to a recognizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub async fn from_path(path: &Path) -> Result<Self, SpeechError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| SpeechError::Transport(format!("Failed to read audio: {}", e)))?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.webm".to_string());
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

#[allow(async_fn_in_trait)]
pub trait SpeechToText {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, SpeechError>;
}

/// A platform capability that may or may not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceCapability<S> {
    Available(S),
    Unavailable,
}

impl<S> From<Option<S>> for VoiceCapability<S> {
    fn from(value: Option<S>) -> Self {
        match value {
            Some(s) => VoiceCapability::Available(s),
            None => VoiceCapability::Unavailable,
        }
    }
}

impl<S> VoiceCapability<S> {
    pub fn is_available(&self) -> bool {
        matches!(self, VoiceCapability::Available(_))
    }
}

/// OpenAI Whisper transcription.
pub struct WhisperTranscriber {
    api_key: String,
    client: reqwest::Client,
}

impl WhisperTranscriber {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Available only when a transcription key is configured.
    pub fn capability(api_key: Option<String>) -> VoiceCapability<Self> {
        api_key
            .filter(|k| !k.trim().is_empty())
            .map(Self::new)
            .into()
    }
}

impl SpeechToText for WhisperTranscriber {
    async fn transcribe(&self, clip: AudioClip) -> Result<String, SpeechError> {
        info!(
            "[transcribe] Audio size: {} bytes, using OpenAI Whisper",
            clip.bytes.len()
        );

        let part = reqwest::multipart::Part::bytes(clip.bytes)
            .file_name(clip.file_name)
            .mime_str(&clip.content_type)
            .map_err(|e| SpeechError::Transport(format!("Failed to create multipart: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", WHISPER_MODEL);

        let response = self
            .client
            .post(WHISPER_ENDPOINT)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::Transport(format!("Transcription request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpeechError::Transport(format!("Failed to read response: {}", e)))?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            error!("[transcribe] Rejected credentials: {}", status);
            return Err(SpeechError::PermissionDenied);
        }
        if !status.is_success() {
            error!("[transcribe] API error: {} - {}", status, body);
            return Err(SpeechError::Transport(body));
        }

        transcript_text(&body)
    }
}

/// Whisper answers `{ "text": "..." }`. Blank text means nothing was recognized.
fn transcript_text(body: &str) -> Result<String, SpeechError> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| SpeechError::Transport(format!("Failed to parse response: {}", e)))?;
    let text = json
        .get("text")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    if text.is_empty() {
        return Err(SpeechError::NoMatch);
    }
    info!("[transcribe] Transcription complete: {} chars", text.len());
    Ok(text)
}

/// Result of one listen attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    /// The transcript was placed in the input box.
    Transcribed(String),
    Failed(SpeechError),
    /// Already listening; the request was ignored.
    Ignored,
}

/// Recording state for the chat panel's microphone button.
/// Result of a request to listen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listen {
    Started,
    /// A recording was already running; nothing changed.
    AlreadyRecording,
}

pub struct VoiceInput<S> {
    capability: VoiceCapability<S>,
    recording: bool,
    unsupported_reported: bool,
}

impl<S: SpeechToText> VoiceInput<S> {
    pub fn new(capability: VoiceCapability<S>) -> Self {
        Self {
            capability,
            recording: false,
            unsupported_reported: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_available(&self) -> bool {
        self.capability.is_available()
    }

    /// Turns recording on. Without the capability this reports it once and refuses.
    pub fn begin(&mut self, session: &mut ChatSession) -> Result<Listen, SpeechError> {
        if !self.capability.is_available() {
            self.report_unsupported(session);
            return Err(SpeechError::Unavailable);
        }
        if self.recording {
            return Ok(Listen::AlreadyRecording);
        }
        self.recording = true;
        Ok(Listen::Started)
    }

    /// Ends recording with the recognizer's result.
    pub fn finish(
        &mut self,
        session: &mut ChatSession,
        result: Result<String, SpeechError>,
    ) -> VoiceOutcome {
        self.recording = false;
        match result {
            Ok(text) => {
                session.set_input(text.clone());
                VoiceOutcome::Transcribed(text)
            }
            Err(e) => {
                warn!("[voice] Recognition error: {}", e);
                match &e {
                    SpeechError::PermissionDenied => session.push_notice(VOICE_PERMISSION_MESSAGE),
                    SpeechError::NoMatch => session.push_notice(VOICE_NO_MATCH_MESSAGE),
                    SpeechError::Aborted => {}
                    SpeechError::Unavailable => {
                        self.capability = VoiceCapability::Unavailable;
                        self.report_unsupported(session);
                    }
                    SpeechError::Transport(_) => session.push_notice(VOICE_BUSY_MESSAGE),
                }
                VoiceOutcome::Failed(e)
            }
        }
    }

    /// Records one utterance and drops its transcript into the shared chat input.
    pub async fn capture(&mut self, session: &SharedSession, clip: AudioClip) -> VoiceOutcome {
        match self.begin(&mut lock_session(session)) {
            Ok(Listen::Started) => {}
            Ok(Listen::AlreadyRecording) => return VoiceOutcome::Ignored,
            Err(e) => return VoiceOutcome::Failed(e),
        }
        let result = match &self.capability {
            VoiceCapability::Available(recognizer) => recognizer.transcribe(clip).await,
            VoiceCapability::Unavailable => Err(SpeechError::Unavailable),
        };
        self.finish(&mut lock_session(session), result)
    }

    fn report_unsupported(&mut self, session: &mut ChatSession) {
        if !self.unsupported_reported {
            session.push_notice(VOICE_UNSUPPORTED_MESSAGE);
            self.unsupported_reported = true;
        }
    }
}
