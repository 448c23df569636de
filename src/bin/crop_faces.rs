//! Crop the faces out of an image with their roll removed.
//!
//! Usage:
//!   crop_faces <image>                          # faces written to ./faces
//!   crop_faces <image> --config config.json     # custom models and topology
//!   crop_faces <image> -o out/                  # choose the output directory

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use facecropping::face_detection::model_blazeface::BlazefaceModel;
use facecropping::face_landmarks::model_mediapipe::MediapipeFaceLandmarksModel;
use facecropping::{CropperConfig, NormalisedFaceCropper};

#[derive(Parser, Debug)]
#[command(name = "crop_faces")]
#[command(author, version, about = "Crop roll-normalised faces out of an image", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Configuration file (JSON), defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the face images are written to
    #[arg(short, long, default_value = "faces")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => CropperConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => CropperConfig::default(),
    };

    let face_detector =
        BlazefaceModel::new(&config.detection).context("failed to load face detection model")?;
    let landmark_detector = MediapipeFaceLandmarksModel::new(&config.landmarks)
        .context("failed to load face landmark model")?;
    let mut cropper = NormalisedFaceCropper::with_config(face_detector, landmark_detector, &config)?;

    // both models expect RGB input
    let image = image::open(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?
        .to_rgb8();

    let faces = match cropper.detect_normalised_faces(&image)? {
        Some(faces) => faces,
        None => {
            info!("no faces found in {}", args.image.display());
            return Ok(());
        }
    };

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("failed to create {}", args.output_dir.display()))?;

    let mut written = 0;
    for (index, face) in faces.iter().enumerate() {
        if face.is_empty() {
            warn!("face {} collapsed to an empty crop, skipping", index + 1);
            continue;
        }

        let path = args.output_dir.join(format!("face_{}.png", index + 1));
        face.image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            roll_angle = face.roll_angle(),
            width = face.image.width(),
            height = face.image.height(),
            "wrote {}",
            path.display()
        );
        written += 1;
    }

    info!("{} of {} faces written to {}", written, faces.len(), args.output_dir.display());
    Ok(())
}
