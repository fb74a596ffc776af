use log::info;
use std::env;
use tokio::sync::mpsc;

use recipe_extract::images_to_text::ImageSource;
use recipe_extract::{ExtractionProgress, RecipeExtractor};

const USAGE: &str =
    "Usage: recipe-extract <url> [--location L] [--notes N] [--fast] [--image PATH...]";

#[derive(Debug, Default)]
struct Args {
    url: Option<String>,
    location: String,
    notes: String,
    fast: bool,
    images: Vec<String>,
}

fn parse_args(raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    let mut raw = raw.peekable();

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--location" => args.location = raw.next().ok_or("--location needs a value")?,
            "--notes" => args.notes = raw.next().ok_or("--notes needs a value")?,
            "--fast" => args.fast = true,
            "--image" => {
                while let Some(path) = raw.next_if(|next| !next.starts_with("--")) {
                    args.images.push(path);
                }
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown option {}", flag)),
            _ if args.url.is_none() => args.url = Some(arg),
            _ => return Err(format!("Unexpected argument {}", arg)),
        }
    }

    if args.url.is_none() && args.images.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = parse_args(env::args().skip(1))?;
    let extractor = RecipeExtractor::builder().build()?;

    let result = if args.images.is_empty() {
        let url = args.url.ok_or(USAGE)?;
        let (tx, mut rx) = mpsc::channel::<ExtractionProgress>(16);
        let reporter = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                info!("[{:>3}%] {}: {}", event.progress, event.step, event.message);
            }
        });

        let result = extractor
            .extract(&url, &args.location, &args.notes, Some(&tx), args.fast)
            .await;
        drop(tx);
        reporter.await?;
        result
    } else {
        let mut images = Vec::with_capacity(args.images.len());
        for path in args.images {
            images.push(ImageSource::Path(path).load().await?);
        }
        extractor.extract_from_images(&images, &args.location).await
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
