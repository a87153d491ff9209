//! Spectral analysis pipeline: raw input → prepared samples → magnitude spectrum
//! → fundamental/harmonics → descriptors. Pure and total: every input produces a
//! valid AnalysisResult, and identical inputs produce identical results.

pub mod descriptor;
pub mod extract;
pub mod prepare;
pub mod spectrum;

pub use descriptor::{AnalysisResult, PatternClassification};
pub use extract::HarmonicComponent;
pub use prepare::AudioInput;

use descriptor::synthesize;
use extract::{baked_harmonics, detect_harmonics, fundamental_frequency};
use prepare::{prepare, Prepared};
use spectrum::magnitude_spectrum;

/// Run the full pipeline over one input. Seed-like inputs take the baked fast
/// path; real sample data goes through the spectral transform.
pub fn analyze(input: AudioInput) -> AnalysisResult {
    match prepare(input) {
        Prepared::Buffer(buffer) => {
            let spectrum = magnitude_spectrum(&buffer);
            let fundamental = fundamental_frequency(&spectrum);
            let harmonics = detect_harmonics(&spectrum, fundamental);
            synthesize(fundamental, &harmonics, Some(&spectrum))
        }
        Prepared::Baked { fundamental } => {
            let harmonics = baked_harmonics(fundamental);
            synthesize(fundamental, &harmonics, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::prepare::{FFT_SIZE, SAMPLE_RATE};
    use super::*;

    fn sine(freq: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE).sin())
            .collect()
    }

    #[test]
    fn test_marker_scenario() {
        let result = analyze(AudioInput::Seed("test".into()));
        assert_eq!(result.fundamental_frequency, 440.0);
        assert_eq!(result.musical_note, "A4");
        assert!((30..=100).contains(&result.score));
        assert_eq!(
            result.pattern_classification,
            PatternClassification::ComplexSpiral
        );
    }

    #[test]
    fn pipeline_is_deterministic() {
        let samples = sine(440.0);
        let a = analyze(AudioInput::Samples(samples.clone()));
        let b = analyze(AudioInput::Samples(samples));
        assert_eq!(a, b);
    }

    #[test]
    fn identical_seeds_identical_results() {
        let a = analyze(AudioInput::Seed("demo-track".into()));
        let b = analyze(AudioInput::Seed("demo-track".into()));
        assert_eq!(a, b);
    }

    #[test]
    fn never_fails_on_degenerate_input() {
        for input in [
            AudioInput::Absent,
            AudioInput::Samples(Vec::new()),
            AudioInput::Samples(vec![0.0; FFT_SIZE]),
            AudioInput::Pcm16(Vec::new()),
            AudioInput::Seed(String::new()),
        ] {
            let result = analyze(input);
            assert!(result.fundamental_frequency > 0.0);
            assert!((30..=100).contains(&result.score));
        }
    }

    #[test]
    fn silence_yields_default_profile() {
        let result = analyze(AudioInput::Samples(vec![0.0; FFT_SIZE]));
        assert_eq!(result.fundamental_frequency, 440.0);
        assert_eq!(result.spectral_centroid, 0.0);
        assert!(result.harmonics.is_empty());
    }

    #[test]
    fn sine_wave_lands_near_its_frequency() {
        let result = analyze(AudioInput::Samples(sine(440.0)));
        let resolution = SAMPLE_RATE / FFT_SIZE as f32;
        assert!((result.fundamental_frequency - 440.0).abs() < resolution);
        assert_eq!(result.musical_note, "A4");
    }

    #[test]
    fn harmonic_rich_signal_reports_ordered_harmonics() {
        // Fundamental plus overtones at 2x and 3x.
        let samples: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE;
                let w = 2.0 * std::f32::consts::PI * 220.0 * t;
                (w.sin() + 0.6 * (2.0 * w).sin() + 0.4 * (3.0 * w).sin()) / 2.0
            })
            .collect();
        let result = analyze(AudioInput::Samples(samples));
        assert!(result.harmonics.len() >= 2);
        for pair in result.harmonics.windows(2) {
            assert!(pair[0].frequency < pair[1].frequency);
        }
        for h in &result.harmonics {
            assert!((0.0..=1.0).contains(&h.amplitude));
        }
    }

    #[test]
    fn scores_bounded_across_seed_space() {
        for seed in ["a", "zz", "some long seed string", "🎵", "440hz"] {
            let result = analyze(AudioInput::Seed(seed.into()));
            assert!((30..=100).contains(&result.score), "seed {:?}", seed);
        }
    }
}
