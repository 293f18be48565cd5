use super::pcm::{decode_base64_pcm, PcmBuffer};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type Callback = Box<dyn FnOnce() + Send>;

/// Completion signal for one playback.
///
/// Backends call [`Completion::fire`] when a source reaches its natural end.
/// The wrapped callback runs at most once, and never after the playback was
/// stopped explicitly.
pub struct Completion {
    armed: AtomicBool,
    callback: Mutex<Option<Callback>>,
}

impl Completion {
    fn new(callback: Callback) -> Arc<Self> {
        Arc::new(Self {
            armed: AtomicBool::new(true),
            callback: Mutex::new(Some(callback)),
        })
    }

    pub fn fire(&self) {
        if !self.armed.swap(false, Ordering::SeqCst) {
            return;
        }
        let callback = match self.callback.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        if let Some(callback) = callback {
            callback();
        }
    }

    fn disarm(&self) {
        self.armed.store(false, Ordering::SeqCst);
        if let Ok(mut guard) = self.callback.lock() {
            guard.take();
        }
    }

    /// True until the playback finished or was stopped.
    pub fn is_pending(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }
}

/// A source that is currently (or was) playing.
pub trait PlaybackHandle {
    /// Halt output and release the source. Must tolerate already-finished sources.
    fn stop(&mut self);
}

/// Shared output context that can start sources.
pub trait PlaybackBackend {
    type Handle: PlaybackHandle;

    fn start(&mut self, buffer: PcmBuffer, completion: Arc<Completion>) -> Result<Self::Handle>;
}

struct ActivePlayback<H> {
    handle: H,
    completion: Arc<Completion>,
}

/// Owns one playback context and at most one active source.
pub struct PlaybackManager<B: PlaybackBackend> {
    backend: B,
    active: Option<ActivePlayback<B::Handle>>,
}

impl<B: PlaybackBackend> PlaybackManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    /// Decode `audio_base64` and play it, stopping whatever was playing.
    ///
    /// `on_ended` runs once when playback reaches its natural end; it is
    /// dropped without running if the playback is stopped or replaced.
    /// A payload that fails to decode leaves the current playback untouched.
    pub fn play<F>(&mut self, audio_base64: &str, on_ended: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let buffer = decode_base64_pcm(audio_base64)?;
        self.stop();

        tracing::debug!(
            "Starting playback of {} samples ({:.2}s)",
            buffer.samples.len(),
            buffer.duration_secs()
        );

        let completion = Completion::new(Box::new(on_ended));
        let handle = self.backend.start(buffer, completion.clone())?;
        self.active = Some(ActivePlayback { handle, completion });
        Ok(())
    }

    /// Stop the active source, if any. Calling it again is a no-op.
    pub fn stop(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.completion.disarm();
            active.handle.stop();
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.completion.is_pending())
    }
}

impl<B: PlaybackBackend> Drop for PlaybackManager<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
