//! Headless synced lyrics player
//!
//! Plays a lyrics file against a simulated clock and logs what the engine
//! would draw: focus changes, scroll mode and seeks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::Parser;
use cosmic_text::FontSystem;
use parking_lot::Mutex;

use synced_lyrics::features::lyrics::engine::{
    LyricsEngine, MonospaceMeasure, TextMeasure, TextShaper,
};
use synced_lyrics::features::lyrics::parser::{parse_lyrics, stringify_lyrics};
use synced_lyrics::features::settings::Settings;

/// Frame interval of the simulated host (~60 Hz)
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "synced-lyrics", version, about = "Headless synced lyrics player")]
struct Cli {
    /// Lyrics file (LRC, optionally with word tags)
    file: PathBuf,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<f32>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<f32>,

    /// Start position in milliseconds
    #[arg(long, default_value_t = 0)]
    start_ms: i64,

    /// Playback speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Measure with system fonts instead of fixed advances
    #[arg(long, default_value_t = false)]
    system_fonts: bool,

    /// Simulate a tap on this line halfway through the song
    #[arg(long)]
    tap_line: Option<usize>,

    /// Print the parsed lyrics as normalized LRC and exit
    #[arg(long, default_value_t = false)]
    normalize: bool,
}

/// Simulated playback position
struct SimulatedClock {
    base_ms: i64,
    anchor: Instant,
    speed: f64,
}

impl SimulatedClock {
    fn position(&self, now: Instant) -> i64 {
        let elapsed = now.saturating_duration_since(self.anchor).as_secs_f64() * 1000.0;
        self.base_ms.saturating_add((elapsed * self.speed) as i64)
    }

    fn seek(&mut self, position_ms: i64, now: Instant) {
        self.base_ms = position_ms;
        self.anchor = now;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let settings = Settings::load();

    let text = tokio::fs::read_to_string(&cli.file)
        .await
        .with_context(|| format!("Failed to read lyrics file {}", cli.file.display()))?;

    if cli.normalize {
        print!("{}", stringify_lyrics(&parse_lyrics(&text)));
        return Ok(());
    }

    let measure: Box<dyn TextMeasure> = if cli.system_fonts {
        let font_system = Arc::new(Mutex::new(FontSystem::new()));
        Box::new(TextShaper::with_font(font_system, settings.display.font))
    } else {
        Box::new(MonospaceMeasure::default())
    };

    let mut engine = LyricsEngine::new(settings.engine.clone(), measure);
    let (seek_tx, mut seek_rx) = tokio::sync::mpsc::unbounded_channel::<i64>();
    engine.set_seek_listener(move |position_ms| {
        let _ = seek_tx.send(position_ms);
    });

    engine.set_lyrics(Some(&text));
    engine.resize(
        cli.width.unwrap_or(settings.display.viewport_width),
        cli.height.unwrap_or(settings.display.viewport_height),
    );
    if engine.lines().is_empty() {
        bail!("No lyrics found in {}", cli.file.display());
    }

    let end_ms = engine
        .lines()
        .iter()
        .map(|line| line.end_time)
        .max()
        .unwrap_or(0);
    tracing::info!(
        "Playing {} lines ({} rows), ends at {} ms",
        engine.lines().len(),
        engine.layout().rows.len(),
        end_ms
    );

    let mut clock = SimulatedClock {
        base_ms: cli.start_ms,
        anchor: Instant::now(),
        speed: cli.speed,
    };
    engine.set_playing(true);

    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    let mut last_focus = None;
    let mut last_mode = engine.scroll_mode();
    let mut tapped = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }

        let now = Instant::now();
        let position = clock.position(now);
        engine.update_time_at(position, now);
        let frame = engine.frame(now);

        if frame.focused_line != last_focus {
            last_focus = frame.focused_line;
            if let Some(line) = frame.focused_line.and_then(|i| engine.lines().get(i)) {
                tracing::info!(
                    "[{:>7} ms] {} (scroll {:.0}, {} rows drawn)",
                    position,
                    line.text().trim(),
                    frame.scroll_y,
                    frame.rows.len()
                );
            }
        }
        if frame.scroll_mode != last_mode {
            tracing::debug!("Scroll mode {:?} -> {:?}", last_mode, frame.scroll_mode);
            last_mode = frame.scroll_mode;
        }

        if !tapped && position >= end_ms / 2 {
            if let Some(index) = cli.tap_line {
                tapped = true;
                let row_y = engine.layout().rows_for_line(index).first().map(|row| row.y);
                match row_y {
                    Some(y) => {
                        engine.tap(y - engine.scroll_y(), now);
                    }
                    None => tracing::warn!("Line {} has no rows to tap", index),
                }
            }
        }

        while let Ok(position_ms) = seek_rx.try_recv() {
            tracing::info!("Seeking to {} ms", position_ms);
            clock.seek(position_ms, now);
            engine.update_time_at(position_ms, now);
        }

        if position > end_ms {
            break;
        }
    }

    Ok(())
}
