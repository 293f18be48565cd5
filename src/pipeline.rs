//! Storyboard generation pipeline.
//!
//! One structure request, then one image + speech pair per clip. Clips are
//! processed strictly in structure order (scene-major, clip-minor); the two
//! media requests of a clip run concurrently and are joined before the next
//! clip starts. Any failure aborts the run and no partial storyboard is
//! returned.

use crate::ai::{ImageGenerationService, SpeechService, StructureService};
use crate::image::to_png_data_url;
use crate::models::{
    AspectRatio, CharacterImage, ClipOutline, GenerationRequest, MediaKind, Scene, Storyboard,
};
use crate::{Error, Result};
use tracing::{debug, info};

/// Services the pipeline talks to.
pub struct PipelineServices {
    pub structure: Box<dyn StructureService>,
    pub image_gen: Box<dyn ImageGenerationService>,
    pub speech: Box<dyn SpeechService>,
}

pub struct StoryboardPipeline {
    structure: Box<dyn StructureService>,
    image_gen: Box<dyn ImageGenerationService>,
    speech: Box<dyn SpeechService>,
}

impl StoryboardPipeline {
    pub fn new(services: PipelineServices) -> Self {
        Self {
            structure: services.structure,
            image_gen: services.image_gen,
            speech: services.speech,
        }
    }

    /// Generate a complete storyboard for `request`.
    ///
    /// `on_progress` receives status text before structure generation, before
    /// the media loop, once per clip with an "N of total" count, and on
    /// completion. It has no influence on the outcome.
    pub async fn generate<F>(
        &self,
        request: &GenerationRequest,
        on_progress: F,
    ) -> Result<Storyboard>
    where
        F: Fn(&str) + Send + Sync,
    {
        on_progress("Generating story structure...");
        info!("Generating structure for \"{}\"", request.title);

        let structure = self
            .structure
            .generate_structure(request)
            .await
            .and_then(|structure| structure.validate().map(|_| structure))
            .map_err(|e| match e {
                Error::StructureDecode(_) => e,
                other => Error::StructureDecode(other.to_string()),
            })?;

        let total = structure.clip_count();
        info!(
            "Structure ready: {} scenes, {} clips",
            structure.scenes.len(),
            total
        );
        on_progress(&format!(
            "Story structure ready. Generating images and audio for {} clips...",
            total
        ));

        let characters = request.characters();
        let mut completed = 0;
        let mut scenes = Vec::with_capacity(structure.scenes.len());

        for scene in structure.scenes {
            let mut clips = Vec::with_capacity(scene.clips.len());
            for clip in scene.clips {
                completed += 1;
                on_progress(&format!(
                    "Generating clip {} of {} (scene {}, clip {})...",
                    completed, total, scene.scene, clip.id
                ));

                let (image, audio) = self
                    .generate_clip_media(scene.scene, &clip, &characters, request.aspect_ratio)
                    .await?;
                clips.push(clip.with_media(image, audio));
            }
            scenes.push(Scene {
                scene: scene.scene,
                clips,
            });
        }

        on_progress("Storyboard complete!");
        info!("Storyboard \"{}\" complete ({} clips)", request.title, total);

        Ok(Storyboard {
            title: request.title.clone(),
            scenes,
        })
    }

    /// Image data URL and base64 PCM for one clip.
    async fn generate_clip_media(
        &self,
        scene: u32,
        clip: &ClipOutline,
        characters: &[&CharacterImage],
        aspect_ratio: AspectRatio,
    ) -> Result<(String, String)> {
        debug!("Requesting media for scene {}, clip {}", scene, clip.id);

        let (image, audio) = tokio::join!(
            self.image_gen
                .generate_image(&clip.prompt, characters, aspect_ratio),
            self.speech.synthesize(&clip.narration)
        );

        let missing = |media: MediaKind| Error::ClipMedia {
            scene,
            clip: clip.id,
            media,
        };
        let image = image?.ok_or_else(|| missing(MediaKind::Image))?;
        let audio = audio?.ok_or_else(|| missing(MediaKind::Audio))?;

        let image_url = to_png_data_url(&image).await?;
        Ok((image_url, audio.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::mock::{sample_structure, TINY_PCM};
    use crate::ai::{MockImageClient, MockSpeechClient, MockStructureClient};
    use crate::models::{MediaPayload, Style};
    use async_trait::async_trait;
    use base64::Engine as _;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn request() -> GenerationRequest {
        GenerationRequest {
            title: "The Lighthouse Keeper".to_string(),
            description: "An old keeper befriends a lost seal.".to_string(),
            style: Style::Cinematic,
            aspect_ratio: AspectRatio::Landscape,
            character_one: None,
            character_two: None,
        }
    }

    fn pipeline(
        structure: MockStructureClient,
        image_gen: MockImageClient,
        speech: MockSpeechClient,
    ) -> StoryboardPipeline {
        StoryboardPipeline::new(PipelineServices {
            structure: Box::new(structure),
            image_gen: Box::new(image_gen),
            speech: Box::new(speech),
        })
    }

    #[tokio::test]
    async fn test_generate_preserves_structure_shape_and_order() {
        let image_gen = MockImageClient::new();
        let speech = MockSpeechClient::new();
        let pipeline = pipeline(
            MockStructureClient::new(),
            image_gen.clone(),
            speech.clone(),
        );

        let storyboard = pipeline.generate(&request(), |_| {}).await.unwrap();
        let expected = sample_structure(4, 3);

        assert_eq!(storyboard.title, "The Lighthouse Keeper");
        assert_eq!(storyboard.clip_count(), expected.clip_count());
        for (scene, outline) in storyboard.scenes.iter().zip(&expected.scenes) {
            assert_eq!(scene.scene, outline.scene);
            let ids: Vec<u32> = scene.clips.iter().map(|c| c.id).collect();
            let expected_ids: Vec<u32> = outline.clips.iter().map(|c| c.id).collect();
            assert_eq!(ids, expected_ids);
            for (clip, clip_outline) in scene.clips.iter().zip(&outline.clips) {
                assert_eq!(clip.narration, clip_outline.narration);
                assert_eq!(clip.prompt, clip_outline.prompt);
                assert!(clip.image.starts_with("data:image/png;base64,"));
                assert_eq!(
                    clip.audio,
                    base64::engine::general_purpose::STANDARD.encode(TINY_PCM)
                );
            }
        }

        let prompts: Vec<String> = image_gen.calls().into_iter().map(|c| c.prompt).collect();
        let expected_prompts: Vec<String> = expected
            .scenes
            .iter()
            .flat_map(|s| s.clips.iter().map(|c| c.prompt.clone()))
            .collect();
        assert_eq!(prompts, expected_prompts);
        assert_eq!(speech.get_call_count(), 12);
    }

    #[tokio::test]
    async fn test_missing_image_aborts_with_clip_identity() {
        let image_gen = MockImageClient::new().with_missing_payload_on_call(6);
        let speech = MockSpeechClient::new();
        let pipeline = pipeline(
            MockStructureClient::new(),
            image_gen.clone(),
            speech.clone(),
        );

        let err = pipeline.generate(&request(), |_| {}).await.unwrap_err();

        assert!(matches!(
            err,
            Error::ClipMedia {
                scene: 2,
                clip: 3,
                media: MediaKind::Image
            }
        ));
        // Clip 7 onwards is never attempted.
        assert_eq!(image_gen.get_call_count(), 6);
        assert_eq!(speech.get_call_count(), 6);
    }

    #[tokio::test]
    async fn test_missing_audio_aborts_with_clip_identity() {
        let image_gen = MockImageClient::new();
        let speech = MockSpeechClient::new().with_missing_payload_on_call(1);
        let pipeline = pipeline(MockStructureClient::new(), image_gen.clone(), speech);

        let err = pipeline.generate(&request(), |_| {}).await.unwrap_err();

        assert!(matches!(
            err,
            Error::ClipMedia {
                scene: 1,
                clip: 1,
                media: MediaKind::Audio
            }
        ));
        assert_eq!(image_gen.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_non_conforming_structure_is_decode_error() {
        let image_gen = MockImageClient::new();
        let pipeline = pipeline(
            MockStructureClient::new().with_structure(sample_structure(4, 2)),
            image_gen.clone(),
            MockSpeechClient::new(),
        );

        let err = pipeline.generate(&request(), |_| {}).await.unwrap_err();

        assert!(matches!(err, Error::StructureDecode(_)));
        assert_eq!(image_gen.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_decode_failure_stops_before_any_media_call() {
        let structure = MockStructureClient::new()
            .with_decode_failure("expected value at line 1 column 1".to_string());
        let image_gen = MockImageClient::new();
        let speech = MockSpeechClient::new();
        let pipeline = pipeline(structure.clone(), image_gen.clone(), speech.clone());

        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        let err = pipeline
            .generate(&request(), move |message| {
                sink.lock().unwrap().push(message.to_string())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StructureDecode(msg) if msg.contains("line 1 column 1")));
        assert_eq!(structure.get_call_count(), 1);
        assert_eq!(image_gen.get_call_count(), 0);
        assert_eq!(speech.get_call_count(), 0);
        assert_eq!(
            *messages.lock().unwrap(),
            vec!["Generating story structure...".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_clip_ids_are_decode_error() {
        let mut structure = sample_structure(4, 3);
        for clip in &mut structure.scenes[2].clips {
            clip.id = 1;
        }
        let image_gen = MockImageClient::new();
        let pipeline = pipeline(
            MockStructureClient::new().with_structure(structure),
            image_gen.clone(),
            MockSpeechClient::new(),
        );

        let err = pipeline.generate(&request(), |_| {}).await.unwrap_err();

        assert!(matches!(err, Error::StructureDecode(msg) if msg.contains("scene 3")));
        assert_eq!(image_gen.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_structure_failure_surfaces_as_decode_error() {
        struct Unreachable;

        #[async_trait]
        impl StructureService for Unreachable {
            async fn generate_structure(
                &self,
                _request: &GenerationRequest,
            ) -> Result<crate::models::StoryboardStructure> {
                Err(Error::AiProvider("Gemini API error (status 500)".to_string()))
            }
        }

        let pipeline = StoryboardPipeline::new(PipelineServices {
            structure: Box::new(Unreachable),
            image_gen: Box::new(MockImageClient::new()),
            speech: Box::new(MockSpeechClient::new()),
        });

        let err = pipeline.generate(&request(), |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::StructureDecode(msg) if msg.contains("status 500")));
    }

    #[tokio::test]
    async fn test_progress_messages_are_ordered() {
        let structure = MockStructureClient::new();
        let structure_calls = structure.clone();
        let pipeline = pipeline(structure, MockImageClient::new(), MockSpeechClient::new());

        let log: Arc<Mutex<Vec<(String, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        pipeline
            .generate(&request(), move |message| {
                sink.lock()
                    .unwrap()
                    .push((message.to_string(), structure_calls.get_call_count()));
            })
            .await
            .unwrap();

        let log = log.lock().unwrap();
        // Structure message is sent before the structure call is made.
        assert_eq!(log[0].1, 0);
        assert!(log[1].0.contains("12 clips"));
        assert_eq!(log[1].1, 1);

        let counters: Vec<usize> = log
            .iter()
            .filter_map(|(message, _)| message.strip_prefix("Generating clip "))
            .map(|rest| rest.split(' ').next().unwrap().parse().unwrap())
            .collect();
        assert_eq!(counters, (1..=12).collect::<Vec<_>>());
        assert!(log[2].0.contains("of 12 (scene 1, clip 1)"));
        assert_eq!(log.last().unwrap().0, "Storyboard complete!");
        assert_eq!(log.len(), 15);
    }

    #[tokio::test]
    async fn test_character_references_and_aspect_ratio_reach_image_service() {
        let image_gen = MockImageClient::new();
        let pipeline = pipeline(
            MockStructureClient::new(),
            image_gen.clone(),
            MockSpeechClient::new(),
        );

        let mut request = request();
        request.aspect_ratio = AspectRatio::Portrait;
        request.character_one = Some(CharacterImage::from_bytes(vec![0x89, 0x50, 0x4E, 0x47]));
        request.character_two = Some(CharacterImage::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0]));

        pipeline.generate(&request, |_| {}).await.unwrap();

        for call in image_gen.calls() {
            assert_eq!(call.character_count, 2);
            assert_eq!(call.aspect_ratio, AspectRatio::Portrait);
        }
    }

    /// Media service that only completes once its image/audio partner is in flight.
    #[derive(Clone)]
    struct PairedMedia {
        barrier: Arc<Barrier>,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl PairedMedia {
        fn new() -> Self {
            Self {
                barrier: Arc::new(Barrier::new(2)),
                in_flight: Arc::new(AtomicUsize::new(0)),
                max_in_flight: Arc::new(AtomicUsize::new(0)),
            }
        }

        async fn rendezvous(&self, mime_type: &str) -> Result<Option<MediaPayload>> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.barrier.wait().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(MediaPayload {
                mime_type: mime_type.to_string(),
                data: "AAAA".to_string(),
            }))
        }
    }

    #[async_trait]
    impl ImageGenerationService for PairedMedia {
        async fn generate_image(
            &self,
            _prompt: &str,
            _characters: &[&CharacterImage],
            _aspect_ratio: AspectRatio,
        ) -> Result<Option<MediaPayload>> {
            self.rendezvous("image/png").await
        }
    }

    #[async_trait]
    impl SpeechService for PairedMedia {
        async fn synthesize(&self, _narration: &str) -> Result<Option<MediaPayload>> {
            self.rendezvous("audio/L16").await
        }
    }

    #[tokio::test]
    async fn test_clip_media_runs_concurrently_and_clips_sequentially() {
        let media = PairedMedia::new();
        let pipeline = StoryboardPipeline::new(PipelineServices {
            structure: Box::new(MockStructureClient::new()),
            image_gen: Box::new(media.clone()),
            speech: Box::new(media.clone()),
        });

        let storyboard = tokio::time::timeout(
            Duration::from_secs(5),
            pipeline.generate(&request(), |_| {}),
        )
        .await
        .expect("image and audio requests of a clip must overlap")
        .unwrap();

        assert_eq!(storyboard.clip_count(), 12);
        assert_eq!(media.max_in_flight.load(Ordering::SeqCst), 2);
    }
}
