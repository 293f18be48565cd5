use super::pcm::PcmBuffer;
use super::playback::{Completion, PlaybackBackend, PlaybackHandle};
use crate::{Error, Result};
use rodio::buffer::SamplesBuffer;
use rodio::source::EmptyCallback;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::sync::Arc;

/// Default output device, opened once and shared by every playback.
pub struct SpeakerBackend {
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl SpeakerBackend {
    pub fn open_default() -> Result<Self> {
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| Error::Audio(format!("Failed to open audio output: {}", e)))?;
        Ok(Self {
            _stream: stream,
            handle,
        })
    }
}

pub struct SpeakerHandle {
    sink: Sink,
}

impl PlaybackHandle for SpeakerHandle {
    fn stop(&mut self) {
        self.sink.stop();
    }
}

impl PlaybackBackend for SpeakerBackend {
    type Handle = SpeakerHandle;

    fn start(&mut self, buffer: PcmBuffer, completion: Arc<Completion>) -> Result<SpeakerHandle> {
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| Error::Audio(format!("Failed to create audio sink: {}", e)))?;

        sink.append(SamplesBuffer::new(
            buffer.channels,
            buffer.sample_rate,
            buffer.samples,
        ));
        // Reached only when the samples before it have been played out.
        sink.append(EmptyCallback::<f32>::new(Box::new(move || completion.fire())));
        sink.play();

        Ok(SpeakerHandle { sink })
    }
}
