//! Audio capture and speech recognition capabilities for voice intake.
//!
//! The input stream is held by a [`RecordingSession`] guard, so it is released on every exit
//! path: explicit stop, end of stream, read error, or the caller dropping the recording.

use crate::backend::{AudioClip, Backend};
use crate::error::ApiError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::io::Read;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// File name the transcription endpoint expects for uploaded recordings.
pub const RECORDING_FILE_NAME: &str = "recording.webm";
pub const RECORDING_MIME: &str = "audio/webm";

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("could not open audio input: {0}")]
    Open(#[source] std::io::Error),

    #[error("audio input failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("audio input is not open")]
    NotOpen,

    #[error("no audio captured")]
    Empty,

    #[error("speech recognition failed: {0}")]
    Recognition(#[from] ApiError),
}

/// A source of recorded audio, typically a microphone.
pub trait AudioCapture: Send {
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Next chunk of audio, or `None` at end of stream.
    fn read_chunk(&mut self) -> Result<Option<Bytes>, CaptureError>;

    /// Release the input. Must be idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn mime(&self) -> &str {
        RECORDING_MIME
    }
}

/// Scoped hold on an open capture. Closing happens in `Drop`.
pub struct RecordingSession<'a, C: AudioCapture + ?Sized> {
    capture: &'a mut C,
}

impl<'a, C: AudioCapture + ?Sized> RecordingSession<'a, C> {
    pub fn start(capture: &'a mut C) -> Result<Self, CaptureError> {
        capture.open()?;
        tracing::debug!("audio capture opened");
        Ok(Self { capture })
    }

    pub fn read_chunk(&mut self) -> Result<Option<Bytes>, CaptureError> {
        self.capture.read_chunk()
    }

    pub fn mime(&self) -> String {
        self.capture.mime().to_string()
    }
}

impl<C: AudioCapture + ?Sized> Drop for RecordingSession<'_, C> {
    fn drop(&mut self) {
        if self.capture.is_open() {
            self.capture.close();
            tracing::debug!("audio capture released");
        }
    }
}

/// Record until `stop` is raised or the input ends.
pub fn record<C: AudioCapture + ?Sized>(
    capture: &mut C,
    stop: &AtomicBool,
) -> Result<AudioClip, CaptureError> {
    let mut session = RecordingSession::start(capture)?;
    let mut buf = BytesMut::new();
    while !stop.load(Ordering::Relaxed) {
        match session.read_chunk()? {
            Some(chunk) => buf.extend_from_slice(&chunk),
            None => break,
        }
    }
    let mime = session.mime();
    drop(session);

    if buf.is_empty() {
        return Err(CaptureError::Empty);
    }
    Ok(AudioClip {
        data: buf.freeze(),
        file_name: RECORDING_FILE_NAME.to_string(),
        mime,
    })
}

/// Plays back a pre-recorded file as if it were a live input.
pub struct FileAudioCapture {
    path: PathBuf,
    mime: String,
    file: Option<std::fs::File>,
}

impl FileAudioCapture {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("ogg") => "audio/ogg",
            Some("m4a") => "audio/mp4",
            _ => RECORDING_MIME,
        };
        Self {
            path,
            mime: mime.to_string(),
            file: None,
        }
    }
}

impl AudioCapture for FileAudioCapture {
    fn open(&mut self) -> Result<(), CaptureError> {
        self.file = Some(std::fs::File::open(&self.path).map_err(CaptureError::Open)?);
        Ok(())
    }

    fn read_chunk(&mut self) -> Result<Option<Bytes>, CaptureError> {
        let file = self.file.as_mut().ok_or(CaptureError::NotOpen)?;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut buf).map_err(CaptureError::Read)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        Ok(Some(Bytes::from(buf)))
    }

    fn close(&mut self) {
        self.file = None;
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn mime(&self) -> &str {
        &self.mime
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Interim hypothesis; replaced by the next partial or final segment.
    Partial(String),
    Final(String),
}

/// Accumulates recognizer events into the transcript shown to the user.
#[derive(Debug, Default, Clone)]
pub struct Transcript {
    finals: Vec<String>,
    partial: Option<String>,
}

impl Transcript {
    pub fn apply(&mut self, ev: &TranscriptEvent) {
        match ev {
            TranscriptEvent::Partial(t) => self.partial = Some(t.clone()),
            TranscriptEvent::Final(t) => {
                self.partial = None;
                let t = t.trim();
                if !t.is_empty() {
                    self.finals.push(t.to_string());
                }
            }
        }
    }

    /// Final segments joined with single spaces.
    pub fn text(&self) -> String {
        self.finals.join(" ")
    }

    /// Final text followed by the pending partial, for live display.
    pub fn display(&self) -> String {
        match self.partial.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) if self.finals.is_empty() => p.to_string(),
            Some(p) => format!("{} {p}", self.text()),
            None => self.text(),
        }
    }
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Recognize `clip`, publishing events as they arrive, and return the final transcript.
    async fn recognize(
        &self,
        clip: &AudioClip,
        events: Option<&UnboundedSender<TranscriptEvent>>,
    ) -> Result<String, CaptureError>;
}

/// Server-side transcription through the backend.
pub struct RemoteRecognizer {
    backend: Arc<dyn Backend>,
}

impl RemoteRecognizer {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SpeechRecognizer for RemoteRecognizer {
    async fn recognize(
        &self,
        clip: &AudioClip,
        events: Option<&UnboundedSender<TranscriptEvent>>,
    ) -> Result<String, CaptureError> {
        tracing::debug!(bytes = clip.data.len(), "uploading recording for transcription");
        let text = self.backend.transcribe(clip).await?;
        let ev = TranscriptEvent::Final(text);
        let mut transcript = Transcript::default();
        transcript.apply(&ev);
        if let Some(tx) = events {
            let _ = tx.send(ev);
        }
        Ok(transcript.text())
    }
}
