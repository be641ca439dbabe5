//! Thin CLI wrapper around [`rastermark::Embedder`]. Not part of the
//! library's stable surface (§6) — a demonstration of how a caller wires
//! image I/O, which this crate deliberately does not own, around the core.

use std::path::PathBuf;

use clap::Parser;
use rastermark::config::EmbedConfig;
use rastermark::embed::Embedder;
use rastermark::image::Image;
use rastermark::payload::PayloadBuilder;

#[derive(Parser)]
#[command(name = "embed_cli", about = "Embed a watermark into a PNG/JPEG image")]
struct Args {
    /// Input image path (PNG or JPEG).
    input: PathBuf,

    /// Output image path (written as PNG).
    output: PathBuf,

    /// 32-byte encryption key, hex-encoded.
    #[arg(long)]
    key: String,

    #[arg(long)]
    copyright: Option<String>,

    #[arg(long)]
    author: Option<String>,

    #[arg(long)]
    ai_tool: Option<String>,

    #[arg(long)]
    ai_generated: Option<bool>,

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
    let cover = Image::new(height as usize, width as usize, rgb.into_raw())?;

    let mut builder = PayloadBuilder::new();
    if let Some(c) = args.copyright {
        builder = builder.copyright(c);
    }
    if let Some(a) = args.author {
        builder = builder.author(a);
    }
    if let Some(t) = args.ai_tool {
        builder = builder.ai_tool(t);
    }
    if let Some(g) = args.ai_generated {
        builder = builder.ai_generated(g);
    }
    let fields = builder.with_current_timestamp(chrono::Utc::now()).build();

    let cfg = match args.preset {
        Preset::Balanced => EmbedConfig::balanced(),
        Preset::HighQuality => EmbedConfig::high_quality(),
        Preset::Robust => EmbedConfig::robust(),
    };

    let (watermarked, info) = Embedder::embed(&cover, &fields, &key, &cfg)?;
    tracing::info!(psnr_db = info.psnr_db, bits = info.bits_embedded, "embedded watermark");

    let out_rgb =
        image::RgbImage::from_raw(watermarked.width() as u32, watermarked.height() as u32, watermarked.as_rgb_bytes().to_vec())
            .expect("watermarked image has consistent dimensions");
    out_rgb.save(&args.output)?;

    println!("wrote {} (PSNR {:.2} dB, {} bits embedded)", args.output.display(), info.psnr_db, info.bits_embedded);
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
