pub mod wav_duration;

pub use wav_duration::{wav_duration, WavDurationRow, WavReport};
