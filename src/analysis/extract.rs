use serde::Serialize;

use super::prepare::DEFAULT_FUNDAMENTAL_HZ;
use super::spectrum::Spectrum;

/// Plausible musical fundamental band, in Hz.
const SEARCH_LOW_HZ: f32 = 80.0;
const SEARCH_HIGH_HZ: f32 = 1000.0;

/// A harmonic must carry at least this fraction of the global peak magnitude.
const HARMONIC_THRESHOLD: f32 = 0.10;

/// Integer multiples 2..=MAX_MULTIPLE of the fundamental are evaluated, so up to
/// 7 harmonics reach scoring; the public result is truncated later.
const MAX_MULTIPLE: usize = 8;

/// A detected overtone: frequency in Hz, amplitude normalized to [0, 1] relative
/// to the spectrum's global peak.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HarmonicComponent {
    pub frequency: f32,
    pub amplitude: f32,
}

/// Locate the dominant frequency within [80, 1000] Hz. Ties break toward the
/// lowest bin; an empty or all-zero band falls back to 440 Hz.
pub fn fundamental_frequency(spectrum: &Spectrum) -> f32 {
    let resolution = spectrum.resolution();
    let lo = (SEARCH_LOW_HZ / resolution).ceil() as usize;
    let hi = ((SEARCH_HIGH_HZ / resolution).floor() as usize).min(spectrum.magnitudes().len() - 1);

    let mut best_bin = 0usize;
    let mut best_mag = 0.0f32;
    for bin in lo..=hi {
        let mag = spectrum.magnitudes()[bin];
        if mag > best_mag {
            best_mag = mag;
            best_bin = bin;
        }
    }

    if best_mag > 0.0 {
        spectrum.bin_frequency(best_bin)
    } else {
        DEFAULT_FUNDAMENTAL_HZ
    }
}

/// Search integer multiples of the fundamental for overtone energy. Returned in
/// ascending multiple order, at most MAX_MULTIPLE - 1 entries.
pub fn detect_harmonics(spectrum: &Spectrum, fundamental: f32) -> Vec<HarmonicComponent> {
    let peak = spectrum.magnitudes().iter().fold(0.0f32, |a, &m| a.max(m));
    if peak <= 0.0 {
        return Vec::new();
    }

    let resolution = spectrum.resolution();
    let mut harmonics = Vec::new();
    for multiple in 2..=MAX_MULTIPLE {
        let frequency = fundamental * multiple as f32;
        let bin = (frequency / resolution).round() as usize;
        if bin >= spectrum.magnitudes().len() {
            break;
        }
        let magnitude = spectrum.magnitudes()[bin];
        if magnitude > HARMONIC_THRESHOLD * peak {
            harmonics.push(HarmonicComponent {
                frequency,
                amplitude: (magnitude / peak).min(1.0),
            });
        }
    }
    harmonics
}

/// Deterministic overtone ladder for baked (seed) inputs: multiples 2..4 at fixed
/// amplitudes, capped below Nyquist. Matches the fast path's pre-baked descriptors.
pub fn baked_harmonics(fundamental: f32) -> Vec<HarmonicComponent> {
    const LADDER: [(f32, f32); 3] = [(2.0, 0.6), (3.0, 0.4), (4.0, 0.3)];
    let nyquist = super::prepare::SAMPLE_RATE / 2.0;
    LADDER
        .iter()
        .map(|&(multiple, amplitude)| HarmonicComponent {
            frequency: fundamental * multiple,
            amplitude,
        })
        .filter(|h| h.frequency < nyquist)
        .collect()
}
