use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use snafu::ResultExt;
use tracing::{error, info};

use sightline_core::{
    DetectOptionsBuilder, Detector, DetectorConfig, OutputMode, annotate, codec,
    consts::CONFIG_PATH_ENV_NAME,
    error::{IoReadSnafu, IoWriteSnafu},
    logging::{LogFormat, init_tracing},
};

#[derive(Parser)]
#[command(name = "detect")]
#[command(about = "Run the object detector on one image and print JSON detections")]
struct Args {
    #[arg(help = "Input image path", required_unless_present = "base64")]
    input: Option<PathBuf>,

    #[arg(long, help = "Base64 image or data URL instead of a file")]
    base64: Option<String>,

    #[arg(short, long, help = "JSON detector config (falls back to $SIGHTLINE_CONFIG)")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "ONNX model path, overrides the config")]
    model: Option<PathBuf>,

    #[arg(long, help = "Minimum fused confidence")]
    confidence: Option<f32>,

    #[arg(long, help = "NMS IoU threshold")]
    iou: Option<f32>,

    #[arg(long, help = "Maximum number of detections", conflicts_with = "best_only")]
    top_n: Option<usize>,

    #[arg(long, help = "Only return the best detection")]
    best_only: bool,

    #[arg(short, long, help = "Write the JSON result here instead of stdout")]
    output: Option<PathBuf>,

    #[arg(long, help = "Save a copy of the image with drawn boxes")]
    annotate: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

fn load_config(args: &Args) -> Result<DetectorConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => DetectorConfig::from_json_file(path)?,
        None if std::env::var_os(CONFIG_PATH_ENV_NAME).is_some() => DetectorConfig::from_env()?,
        None => DetectorConfig::default().with_env_overrides(),
    };
    if let Some(model) = &args.model {
        config.model_path = model.clone();
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let config = load_config(&args)?;

    let defaults = config.detect_options()?;
    let mode = match (args.best_only, args.top_n) {
        (true, _) => OutputMode::BestOnly,
        (false, Some(n)) => OutputMode::TopN(n),
        (false, None) => defaults.mode,
    };
    let options = DetectOptionsBuilder::default()
        .confidence_threshold(args.confidence.unwrap_or(defaults.confidence_threshold))
        .iou_threshold(args.iou.unwrap_or(defaults.iou_threshold))
        .mode(mode)
        .build()?;

    let bytes = if let Some(payload) = &args.base64 {
        codec::decode_base64(payload)?
    } else if let Some(path) = &args.input {
        info!("Loading image from: {}", path.display());
        std::fs::read(path).context(IoReadSnafu {
            path: path.to_string_lossy(),
        })?
    } else {
        return Err("an input path or --base64 payload is required".into());
    };
    let image = codec::decode_image(&bytes)?;

    let detector = Detector::from_config(&config)?;
    let detections = match detector.detect_image(&image, &options) {
        Ok(detections) => detections,
        Err(e) => {
            error!("Detection failed: {}", e);
            return Err(e.into());
        }
    };

    if let Some(path) = &args.annotate {
        annotate::save_annotated(&image, &detections, path)?;
        info!("Annotated image saved to {}", path.display());
    }

    let json = serde_json::to_string_pretty(&detections)?;
    match &args.output {
        Some(path) => std::fs::write(path, json).context(IoWriteSnafu {
            path: path.to_string_lossy(),
        })?,
        None => println!("{json}"),
    }

    Ok(())
}
