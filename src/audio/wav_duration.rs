use crate::error::Result;
use crate::report::CsvReport;
use anyhow::{anyhow, Context};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

pub const REPORT_FILE_NAME: &str = "wav_files_info.csv";

/// Playback length in seconds (frames / sample rate), rounded to two decimals.
pub fn wav_duration(path: &Path) -> anyhow::Result<f64> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| anyhow!("not a valid WAV file: {e}"))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| anyhow!("no audio track"))?;

    let params = &track.codec_params;
    let frames = params.n_frames.ok_or_else(|| anyhow!("frame count not available"))?;
    let sample_rate = params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| anyhow!("sample rate not available"))?;

    debug!(
        "{}: {} frames at {} Hz",
        path.display(),
        frames,
        sample_rate
    );

    Ok(round2(frames as f64 / sample_rate as f64))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Always shows a fractional part, so `3.0` stays `3.0` in the report.
fn format_seconds(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavDurationRow {
    pub filename: String,
    pub duration_sec: f64,
}

#[derive(Debug, Default, Serialize)]
pub struct WavReport {
    pub rows: Vec<WavDurationRow>,
    pub skipped: Vec<(PathBuf, String)>,
}

impl WavReport {
    /// Measures one file, returning its duration or the reason it was skipped.
    pub fn add(&mut self, path: &Path) -> std::result::Result<f64, String> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match wav_duration(path) {
            Ok(duration_sec) => {
                self.rows.push(WavDurationRow {
                    filename,
                    duration_sec,
                });
                Ok(duration_sec)
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!("{} is not a valid WAV file: {}", filename, reason);
                self.skipped.push((path.to_path_buf(), reason.clone()));
                Err(reason)
            }
        }
    }

    pub fn total_seconds(&self) -> f64 {
        round2(self.rows.iter().map(|r| r.duration_sec).sum())
    }

    pub fn write_csv(&self, report_dir: &Path) -> Result<PathBuf> {
        CsvReport::new(report_dir.join(REPORT_FILE_NAME)).write(
            &["filename", "duration_sec"],
            self.rows
                .iter()
                .map(|row| vec![row.filename.clone(), format_seconds(row.duration_sec)]),
        )
    }
}
