use rustfft::{num_complex::Complex, FftPlanner};

use super::prepare::{SampleBuffer, FFT_SIZE, SAMPLE_RATE};

/// Magnitude spectrum of a SampleBuffer: FFT_SIZE / 2 non-negative values, bin i
/// corresponding to frequency `i * SAMPLE_RATE / FFT_SIZE`.
#[derive(Clone, Debug)]
pub struct Spectrum {
    magnitudes: Vec<f32>,
}

impl Spectrum {
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    /// Frequency resolution per bin (≈ 21.53 Hz at 44100 / 2048).
    pub fn resolution(&self) -> f32 {
        SAMPLE_RATE / FFT_SIZE as f32
    }

    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.resolution()
    }

    #[cfg(test)]
    pub fn from_magnitudes(magnitudes: Vec<f32>) -> Self {
        Self { magnitudes }
    }
}

/// Forward FFT of the prepared samples, reduced to the first-half magnitude
/// spectrum. Purely functional: identical inputs produce bit-identical outputs.
pub fn magnitude_spectrum(buffer: &SampleBuffer) -> Spectrum {
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(FFT_SIZE);

    let mut bins: Vec<Complex<f32>> = buffer
        .samples()
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .collect();
    fft.process(&mut bins);

    let magnitudes: Vec<f32> = bins[..FFT_SIZE / 2].iter().map(|c| c.norm()).collect();
    Spectrum { magnitudes }
}
