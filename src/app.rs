//! Application orchestration: configuration, pipeline, export, and playback.

use crate::ai::{GeminiImageClient, GeminiSpeechClient, GeminiStructureClient};
use crate::audio::{PlaybackBackend, PlaybackManager};
use crate::export;
use crate::models::{Config, GenerationRequest, Storyboard};
use crate::pipeline::{PipelineServices, StoryboardPipeline};
use crate::{Error, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

/// Runs the storyboard pipeline and saves the result.
pub struct App {
    pipeline: StoryboardPipeline,
    output_dir: PathBuf,
}

impl App {
    /// Build an app from concrete service dependencies.
    ///
    /// This is primarily useful for integration tests and local harnesses that
    /// need to inject mocks.
    pub fn with_services(services: PipelineServices, output_dir: PathBuf) -> Self {
        Self {
            pipeline: StoryboardPipeline::new(services),
            output_dir,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;

        let date = Local::now().format("%Y-%m-%d").to_string();
        let session_id = Uuid::new_v4();
        let output_dir = Path::new(&config.output_dir).join(format!("{}_{}", date, session_id));

        // Reuse one HTTP connection pool across the three clients.
        let http_client = reqwest::Client::new();

        info!("Structure model: {}", config.structure_model);
        info!("Image model: {}", config.image_model);
        info!(
            "Speech model: {} (voice: {})",
            config.speech_model, config.speech_voice
        );

        let services = PipelineServices {
            structure: Box::new(GeminiStructureClient::new_with_client(
                config.gemini_api_key.clone(),
                config.structure_model.clone(),
                http_client.clone(),
            )),
            image_gen: Box::new(GeminiImageClient::new_with_client(
                config.gemini_api_key.clone(),
                config.image_model.clone(),
                http_client.clone(),
            )),
            speech: Box::new(GeminiSpeechClient::new_with_client(
                config.gemini_api_key,
                config.speech_model,
                config.speech_voice,
                http_client,
            )),
        };

        Ok(Self::with_services(services, output_dir))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Generate a storyboard for `request` and write it to the output directory.
    ///
    /// Returns the path of the saved `storyboard.json`.
    pub async fn run(&self, request: &GenerationRequest) -> Result<PathBuf> {
        let storyboard = self
            .pipeline
            .generate(request, |message| info!("{}", message))
            .await
            .map_err(|e| {
                error!("Storyboard generation failed: {}", e);
                e
            })?;

        fs::create_dir_all(&self.output_dir)?;
        info!("Created output directory: {}", self.output_dir.display());

        export::write_storyboard(&storyboard, &self.output_dir)
    }
}

/// Play every clip's narration in order, waiting for each to finish.
pub fn play_storyboard<B: PlaybackBackend>(
    manager: &mut PlaybackManager<B>,
    storyboard: &Storyboard,
) -> Result<()> {
    let total = storyboard.clip_count();
    let mut played = 0;

    for scene in &storyboard.scenes {
        for clip in &scene.clips {
            played += 1;
            info!(
                "Playing clip {} of {} (scene {}, clip {}): {}",
                played, total, scene.scene, clip.id, clip.narration
            );

            let (done_tx, done_rx) = mpsc::channel();
            manager.play(&clip.audio, move || {
                let _ = done_tx.send(());
            })?;
            // The sender is dropped unsent if playback is stopped instead of finishing.
            done_rx.recv().map_err(|_| {
                Error::Audio(format!(
                    "Playback of scene {}, clip {} was interrupted",
                    scene.scene, clip.id
                ))
            })?;
        }
    }

    manager.stop();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockImageClient, MockSpeechClient, MockStructureClient};
    use crate::audio::{Completion, PcmBuffer, PlaybackHandle};
    use crate::export::read_storyboard;
    use crate::models::{AspectRatio, Style};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    fn request() -> GenerationRequest {
        GenerationRequest {
            title: "Moon Garden".to_string(),
            description: "A child plants seeds that grow into moons.".to_string(),
            style: Style::Claymation,
            aspect_ratio: AspectRatio::Portrait,
            character_one: None,
            character_two: None,
        }
    }

    fn build_test_app(output_dir: &Path, image_gen: MockImageClient) -> App {
        App::with_services(
            PipelineServices {
                structure: Box::new(MockStructureClient::new()),
                image_gen: Box::new(image_gen),
                speech: Box::new(MockSpeechClient::new()),
            },
            output_dir.to_path_buf(),
        )
    }

    /// Backend whose sources finish as soon as they start.
    #[derive(Clone, Default)]
    struct InstantBackend {
        started: Arc<Mutex<Vec<usize>>>,
    }

    struct InstantHandle;

    impl PlaybackHandle for InstantHandle {
        fn stop(&mut self) {}
    }

    impl PlaybackBackend for InstantBackend {
        type Handle = InstantHandle;

        fn start(&mut self, buffer: PcmBuffer, completion: Arc<Completion>) -> Result<InstantHandle> {
            self.started.lock().unwrap().push(buffer.samples.len());
            completion.fire();
            Ok(InstantHandle)
        }
    }

    /// Backend whose sources never finish on their own.
    struct StalledBackend;

    impl PlaybackBackend for StalledBackend {
        type Handle = InstantHandle;

        fn start(&mut self, _buffer: PcmBuffer, _completion: Arc<Completion>) -> Result<InstantHandle> {
            Ok(InstantHandle)
        }
    }

    #[tokio::test]
    async fn test_run_writes_storyboard_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("output").join("run");
        let app = build_test_app(&output_dir, MockImageClient::new());

        let json_path = app.run(&request()).await.unwrap();

        assert_eq!(json_path, output_dir.join("storyboard.json"));
        let storyboard = read_storyboard(&json_path).unwrap();
        assert_eq!(storyboard.title, "Moon Garden");
        assert_eq!(storyboard.clip_count(), 12);
        assert!(output_dir.join("scene4_clip3.png").exists());
        assert!(output_dir.join("scene4_clip3.wav").exists());
    }

    #[tokio::test]
    async fn test_failed_run_writes_nothing() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("run");
        let app = build_test_app(
            &output_dir,
            MockImageClient::new().with_missing_payload_on_call(6),
        );

        let err = app.run(&request()).await.unwrap_err();

        assert!(matches!(err, Error::ClipMedia { scene: 2, clip: 3, .. }));
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_play_storyboard_plays_every_clip_in_order() {
        let dir = tempdir().unwrap();
        let app = build_test_app(dir.path(), MockImageClient::new());
        let storyboard = read_storyboard(&app.run(&request()).await.unwrap()).unwrap();

        let backend = InstantBackend::default();
        let mut manager = PlaybackManager::new(backend.clone());
        play_storyboard(&mut manager, &storyboard).unwrap();

        assert_eq!(*backend.started.lock().unwrap(), vec![4; 12]);
    }

    #[test]
    fn test_play_storyboard_reports_bad_audio() {
        let storyboard: Storyboard = serde_json::from_value(serde_json::json!({
            "title": "Broken",
            "scenes": [{
                "scene": 1,
                "clips": [{
                    "id": 1,
                    "narration": "n",
                    "prompt": "p",
                    "image": "data:image/png;base64,AAAA",
                    "audio": "AAA"
                }]
            }]
        }))
        .unwrap();

        let mut manager = PlaybackManager::new(StalledBackend);
        assert!(play_storyboard(&mut manager, &storyboard).is_err());
    }
}
