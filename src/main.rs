use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use storyboard_generator::app::App;
use storyboard_generator::models::{AspectRatio, CharacterImage, GenerationRequest, Style};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "storyboard-generator")]
#[command(about = "Generate narrated, illustrated storyboards from a short story")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a storyboard and save it to the output directory
    Generate {
        /// Story title
        #[arg(long)]
        title: String,

        /// What happens in the story
        #[arg(long)]
        description: String,

        /// Visual style of every image
        #[arg(long, value_enum, default_value_t = Style::Cinematic)]
        style: Style,

        /// Frame shape of every image
        #[arg(long, value_enum, default_value_t = AspectRatio::Landscape)]
        aspect_ratio: AspectRatio,

        /// Reference image for the first main character
        #[arg(long, value_name = "IMAGE")]
        character_one: Option<PathBuf>,

        /// Reference image for the second main character
        #[arg(long, value_name = "IMAGE")]
        character_two: Option<PathBuf>,
    },

    /// Play the narration of a saved storyboard.json
    Play {
        #[arg(value_name = "STORYBOARD")]
        path: PathBuf,
    },
}

fn load_character(path: Option<&Path>) -> Result<Option<CharacterImage>> {
    Ok(path.map(CharacterImage::from_path).transpose()?)
}

async fn generate(request: GenerationRequest) -> Result<()> {
    let app = App::new()?;
    info!("Writing storyboard to {}", app.output_dir().display());

    let json_path = app.run(&request).await?;
    info!("Storyboard saved to {}", json_path.display());
    Ok(())
}

#[cfg(feature = "speaker")]
fn play(path: &Path) -> Result<()> {
    use storyboard_generator::app::play_storyboard;
    use storyboard_generator::audio::{PlaybackManager, SpeakerBackend};
    use storyboard_generator::export::read_storyboard;

    let storyboard = read_storyboard(path)?;
    let mut manager = PlaybackManager::new(SpeakerBackend::open_default()?);
    play_storyboard(&mut manager, &storyboard)?;
    Ok(())
}

#[cfg(not(feature = "speaker"))]
fn play(_path: &Path) -> Result<()> {
    anyhow::bail!("Playback is not available: rebuild with `--features speaker`")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storyboard_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    match run(args.command).await {
        Ok(()) => {
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("Failed: {:#}", e);
            std::process::exit(1);
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Generate {
            title,
            description,
            style,
            aspect_ratio,
            character_one,
            character_two,
        } => {
            info!("Starting storyboard-generator");
            let request = GenerationRequest {
                title,
                description,
                style,
                aspect_ratio,
                character_one: load_character(character_one.as_deref())?,
                character_two: load_character(character_two.as_deref())?,
            };
            generate(request).await
        }
        Command::Play { path } => play(&path),
    }
}
