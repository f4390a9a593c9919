//! Spectrum analysis for beat-reactive visuals
//!
//! Byte-scaled magnitude spectrum of the most recent output window, in the
//! style of a browser `AnalyserNode`: Blackman window, FFT, magnitudes in dB
//! mapped linearly from [MIN_DB, MAX_DB] onto [0, 255].

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Decibel level mapped to byte 0
pub const MIN_DB: f32 = -100.0;
/// Decibel level mapped to byte 255
pub const MAX_DB: f32 = -30.0;

/// Stateless FFT analyser for a fixed window size
pub struct SpectrumAnalyser {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
}

impl std::fmt::Debug for SpectrumAnalyser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyser")
            .field("size", &self.size)
            .finish()
    }
}

impl SpectrumAnalyser {
    /// `size` is rounded up to a power of two (minimum 2)
    pub fn new(size: usize) -> Self {
        let size = size.max(2).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size).map(|i| blackman_window(i, size)).collect();
        Self { size, fft, window }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of frequency bins produced (half the window)
    #[inline]
    pub fn bin_count(&self) -> usize {
        self.size / 2
    }

    /// Byte-scaled magnitude per frequency bin. Uses the last `size` samples,
    /// zero-padding at the front if fewer are supplied.
    pub fn byte_frequency_data(&self, samples: &[f32]) -> Vec<u8> {
        let tail = &samples[samples.len().saturating_sub(self.size)..];
        let pad = self.size - tail.len();

        let mut buffer: Vec<Complex<f32>> = (0..self.size)
            .map(|i| {
                let s = if i < pad { 0.0 } else { tail[i - pad] };
                Complex::new(s * self.window[i], 0.0)
            })
            .collect();
        self.fft.process(&mut buffer);

        let scale = 255.0 / (MAX_DB - MIN_DB);
        buffer[..self.bin_count()]
            .iter()
            .map(|c| {
                let magnitude = c.norm() / self.size as f32;
                if magnitude <= 0.0 {
                    return 0;
                }
                let db = 20.0 * magnitude.log10();
                (scale * (db - MIN_DB)).clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    /// Mean of the byte spectrum, in [0, 255]
    pub fn loudness(&self, samples: &[f32]) -> f32 {
        let bins = self.byte_frequency_data(samples);
        if bins.is_empty() {
            return 0.0;
        }
        bins.iter().map(|&b| b as f32).sum::<f32>() / bins.len() as f32
    }
}

/// Blackman window function
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let x = 2.0 * PI * index as f32 / size as f32;
    0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_zero() {
        let analyser = SpectrumAnalyser::new(64);
        assert_eq!(analyser.bin_count(), 32);
        assert_eq!(analyser.loudness(&[0.0; 64]), 0.0);
        assert_eq!(analyser.loudness(&[]), 0.0);
    }

    #[test]
    fn test_sine_is_loud_and_bounded() {
        let analyser = SpectrumAnalyser::new(64);
        // Bin 4 of a 64-point window
        let samples: Vec<f32> = (0..64)
            .map(|i| 0.4 * (2.0 * PI * 4.0 * i as f32 / 64.0).sin())
            .collect();
        let bins = analyser.byte_frequency_data(&samples);
        assert_eq!(bins[4], 255);
        let loudness = analyser.loudness(&samples);
        assert!(loudness > 5.0 && loudness <= 255.0, "loudness {loudness}");
    }

    #[test]
    fn test_louder_input_reads_higher() {
        let analyser = SpectrumAnalyser::new(64);
        let tone = |amp: f32| -> Vec<f32> {
            (0..64)
                .map(|i| amp * (2.0 * PI * 6.0 * i as f32 / 64.0).sin())
                .collect()
        };
        assert!(analyser.loudness(&tone(0.2)) > analyser.loudness(&tone(0.0005)));
    }

    #[test]
    fn test_size_rounds_to_power_of_two() {
        assert_eq!(SpectrumAnalyser::new(48).size(), 64);
        assert_eq!(SpectrumAnalyser::new(0).size(), 2);
    }

    #[test]
    fn test_blackman_edges() {
        assert!(blackman_window(0, 64).abs() < 1e-6);
        assert!((blackman_window(32, 64) - 1.0).abs() < 1e-6);
    }
}
