//! Thin CLI wrapper around [`rastermark::Extractor`]. Not part of the
//! library's stable surface (§6) — a demonstration of how a caller wires
//! image I/O around the core, mirroring `embed_cli`.

use std::path::PathBuf;

use clap::Parser;
use rastermark::config::ExtractConfig;
use rastermark::extract::{ExtractOutcome, Extractor};
use rastermark::image::Image;

#[derive(Parser)]
#[command(name = "extract_cli", about = "Extract a watermark from a PNG/JPEG image")]
struct Args {
    /// Image to inspect (PNG or JPEG).
    input: PathBuf,

    /// 32-byte decryption key, hex-encoded.
    #[arg(long)]
    key: String,

    #[arg(long, value_enum, default_value = "balanced")]
    preset: Preset,
}

#[derive(Clone, clap::ValueEnum)]
enum Preset {
    Balanced,
    HighQuality,
    Robust,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let key = decode_hex_key(&args.key)?;

    let dynamic = image::open(&args.input)?;
    let rgb = dynamic.to_rgb8();
    let (width, height) = rgb.dimensions();
    let candidate = Image::new(height as usize, width as usize, rgb.into_raw())?;

    let cfg = match args.preset {
        Preset::Balanced => ExtractConfig::balanced(),
        Preset::HighQuality => ExtractConfig::high_quality(),
        Preset::Robust => ExtractConfig::robust(),
    };

    match Extractor::extract(&candidate, &key, &cfg)? {
        ExtractOutcome::Detected { fields, confidence } => {
            tracing::info!(confidence, "watermark detected");
            println!("watermark detected (confidence {confidence:.3})");
            for (key, value) in fields.iter() {
                println!("  {key}: {value}");
            }
        }
        ExtractOutcome::NotDetected => {
            println!("no watermark detected for the supplied key");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn decode_hex_key(hex: &str) -> anyhow::Result<[u8; 32]> {
    if hex.len() != 64 {
        anyhow::bail!("key must be 64 hex characters (32 bytes), got {} characters", hex.len());
    }
    let mut key = [0u8; 32];
    for (i, byte) in key.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)?;
    }
    Ok(key)
}
