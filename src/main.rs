use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use kws_rs::audio::AudioCapture;
use kws_rs::{DetectionWorker, KeywordDetector, PipelineConfig};

#[derive(Parser)]
#[command(name = "kws-rs")]
#[command(about = "Streaming keyword spotting with an openWakeWord-style cascade")]
struct Args {
    /// Path to models directory
    #[arg(short, long, default_value = "models")]
    model_dir: PathBuf,

    /// Detection threshold on the smoothed confidence (0.0 - 1.0)
    #[arg(short, long, default_value = "0.35")]
    threshold: f32,

    /// Input gain applied before the raw window update
    #[arg(short, long, default_value = "3.0")]
    gain: f32,

    /// Frames of cooldown after each detection
    #[arg(long, default_value = "20")]
    patience: u32,

    /// Number of raw scores averaged into the displayed confidence
    #[arg(long, default_value = "7")]
    smoothing: usize,

    /// Keyword channel index in the classifier output
    #[arg(long, default_value = "0")]
    positive_index: usize,

    /// Enable the verifier model as a second check on detections
    #[arg(long)]
    verifier: bool,

    /// Verifier threshold (only with --verifier)
    #[arg(long, default_value = "0.35")]
    verifier_threshold: f32,

    /// Show scores continuously
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kws_rs=info".into()),
        )
        .init();

    let args = Args::parse();

    let cfg = PipelineConfig {
        gain: args.gain,
        threshold: args.threshold,
        max_patience: args.patience,
        smoothing: args.smoothing,
        positive_index: args.positive_index,
        verifier_threshold: args.verifier_threshold,
    };

    print!("Loading models...");
    let start = Instant::now();
    let detector = KeywordDetector::new(&args.model_dir, cfg, args.verifier)
        .context("failed to initialize detector")?;
    println!(" done ({:.2}s)", start.elapsed().as_secs_f32());

    print!("Initializing audio...");
    let audio = AudioCapture::new().context("failed to open audio input")?;
    println!(" done");

    println!();
    println!("Listening... (Ctrl+C to quit)");
    println!();

    let worker = DetectionWorker::spawn(detector, audio.frames());

    loop {
        while let Ok(event) = worker.events().try_recv() {
            if args.verbose {
                println!();
            }
            println!(
                ">>> DETECTED #{} (confidence: {:.3}) <<<",
                event.count, event.confidence
            );
        }

        if args.verbose {
            print!("\rScore: {:.3}", worker.latest_score());
            std::io::Write::flush(&mut std::io::stdout())?;
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
