//! Frame-level acoustic features
//!
//! All features share one framing: frames of [`FRAME_LENGTH`] samples every
//! [`HOP_LENGTH`] samples, centred on the frame index (the signal is
//! zero-padded by half a frame on both sides).

use rustfft::{num_complex::Complex, FftPlanner};

/// Analysis frame length in samples (~93ms at 22.05kHz)
pub const FRAME_LENGTH: usize = 2048;

/// Hop between consecutive frames in samples (~23ms at 22.05kHz)
pub const HOP_LENGTH: usize = 512;

/// Floor for log-magnitude computation
const MAGNITUDE_FLOOR: f32 = 1e-10;

/// Magnitude spectrogram: `frames[t][k]` for frame `t`, bin `k`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub n_fft: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Compute the magnitude STFT of `samples` with a Hann window
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop: usize) -> Self {
        let padded = center_pad(samples, n_fft);
        let num_frames = frame_count(padded.len(), n_fft, hop);

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let window = hann_window(n_fft);
        let bins = n_fft / 2 + 1;

        let mut frames = Vec::with_capacity(num_frames);
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

        for frame_idx in 0..num_frames {
            let start = frame_idx * hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = Complex::new(padded[start + i] * window[i], 0.0);
            }
            fft.process(&mut buffer);
            frames.push(buffer[..bins].iter().map(|c| c.norm()).collect());
        }

        Self {
            frames,
            n_fft,
            sample_rate,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Centre frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.n_fft as f32
    }
}

/// Number of full frames that fit into `len` samples
pub fn frame_count(len: usize, frame_length: usize, hop: usize) -> usize {
    if len < frame_length || hop == 0 {
        0
    } else {
        (len - frame_length) / hop + 1
    }
}

/// Zero-crossing rate per frame: sign changes divided by frame length
///
/// Zero counts as positive, so silence has a rate of 0.
pub fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop: usize) -> Vec<f32> {
    let padded = center_pad(samples, frame_length);
    let num_frames = frame_count(padded.len(), frame_length, hop);

    (0..num_frames)
        .map(|frame_idx| {
            let frame = &padded[frame_idx * hop..frame_idx * hop + frame_length];
            let crossings = frame
                .windows(2)
                .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
                .count();
            crossings as f32 / frame_length as f32
        })
        .collect()
}

/// Spectral centroid per frame in Hz; silent frames report 0
pub fn spectral_centroid(spectrogram: &Spectrogram) -> Vec<f32> {
    spectrogram
        .frames
        .iter()
        .map(|frame| {
            let total: f32 = frame.iter().sum();
            if total <= MAGNITUDE_FLOOR {
                return 0.0;
            }
            let weighted: f32 = frame
                .iter()
                .enumerate()
                .map(|(k, &mag)| spectrogram.bin_frequency(k) * mag)
                .sum();
            weighted / total
        })
        .collect()
}

/// Arithmetic mean; 0 for an empty slice
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

fn center_pad(samples: &[f32], frame_length: usize) -> Vec<f32> {
    let pad = frame_length / 2;
    let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
    padded.resize(pad, 0.0);
    padded.extend_from_slice(samples);
    padded.resize(samples.len() + 2 * pad, 0.0);
    padded
}

fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}
