use anyhow::{Context, Result};
use clap::Parser;
use coughscan::{
    CaptureOutcome, Config, PredictionClient, PredictionResult, RecordingSession, SessionConfig,
    SessionEvent,
};
use std::io::Write;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tracing::{info, warn};

/// Record a cough sample and screen it against the remote classifier.
#[derive(Debug, Parser)]
#[command(name = "coughscan", version)]
struct Cli {
    /// Path to the configuration file (extension inferred)
    #[arg(short, long, default_value = "config/coughscan")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let cfg = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Could not load config {:?} ({}); using defaults", cli.config, e);
            Config::default()
        }
    };

    info!("{} starting", cfg.service.name);

    let session = RecordingSession::new(SessionConfig {
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        max_duration: Duration::from_secs(cfg.audio.max_duration_secs),
        cough_threshold: cfg.audio.cough_threshold,
        noise_suppression: cfg.audio.noise_suppression,
        ..SessionConfig::default()
    });

    println!(
        "Recording. Cough close to the microphone; press Enter to stop (auto-stops after {}s).",
        cfg.audio.max_duration_secs
    );

    let mut events = session
        .start()
        .await
        .context("Failed to start recording")?;

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut stop_requested = false;

    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(SessionEvent::Amplitude(peak)) => render_meter(peak),
                Some(SessionEvent::Finished(outcome)) => break outcome,
                None => anyhow::bail!("session ended without a finalization event"),
            },
            _ = lines.next_line(), if !stop_requested => {
                stop_requested = true;
                session.stop().await;
            }
        }
    };
    println!();

    match outcome {
        CaptureOutcome::NoCoughDetected => {
            println!("No cough detected; nothing to analyze. Try again closer to the microphone.");
        }
        CaptureOutcome::CoughCaptured(pcm) => {
            println!("Sound captured; analyzing...");
            let client = PredictionClient::with_endpoint(cfg.inference.endpoint.clone());
            // A failed or unusable response renders as all-zero scores.
            let result = client
                .predict(&pcm)
                .await
                .unwrap_or_else(|_| PredictionResult::zero());
            render_result(&result);
        }
    }

    let stats = session.stats();
    info!(
        "Session finished after {:.1}s ({} samples, cough detected: {})",
        stats.duration_secs, stats.samples_captured, stats.cough_detected
    );

    Ok(())
}

/// Live input level bar, redrawn in place on each amplitude update.
fn render_meter(peak: f32) {
    const WIDTH: usize = 30;
    let filled = ((peak * WIDTH as f32).round() as usize).min(WIDTH);
    print!(
        "\r[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(WIDTH - filled),
        peak * 100.0
    );
    std::io::stdout().flush().ok();
}

/// Percentage bar per class, like the result screen of the mobile app.
fn render_result(result: &PredictionResult) {
    const WIDTH: usize = 20;
    println!("Analysis result:");
    for (label, value) in [
        ("Normal", result.normal),
        ("Bronchitis", result.bronchitis),
        ("Pneumonia", result.pneumonia),
    ] {
        let filled = ((value.clamp(0.0, 1.0) * WIDTH as f32).round() as usize).min(WIDTH);
        println!(
            "  {:<12} {:<20} {:>3.0}%",
            label,
            "#".repeat(filled),
            value * 100.0
        );
    }
    println!("This result is only an aid. See a health professional.");
}
