use serde::Serialize;

use super::extract::HarmonicComponent;
use super::spectrum::Spectrum;

/// At most this many harmonics appear in the public result; scoring may see more.
const MAX_REPORTED_HARMONICS: usize = 5;

/// Reference set for the sacred-frequency bonus. Numerological flavor kept as-is
/// for output compatibility; see the scoring contract.
const SACRED_FREQUENCIES_HZ: [f32; 10] =
    [174.0, 285.0, 396.0, 417.0, 432.0, 528.0, 639.0, 741.0, 852.0, 963.0];
const SACRED_TOLERANCE_HZ: f32 = 15.0;
const GOLDEN_RATIO: f32 = 1.618;

const NOTE_NAMES: [&str; 12] =
    ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Terminal value of the pipeline, serialized once per request and discarded.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub fundamental_frequency: f32,
    pub musical_note: String,
    pub harmonics: Vec<HarmonicComponent>,
    pub score: u8,
    pub pattern_classification: PatternClassification,
    pub symmetry: Symmetry,
    pub geometry: &'static str,
    pub spectral_centroid: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternClassification {
    DeepResonance,
    StandingWave,
    ComplexSpiral,
    HighFrequencyLattice,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Symmetry {
    Simple,
    Bilateral,
    Radial,
}

/// Nearest equal-tempered note name for a frequency, A4 = 440 Hz reference.
///
/// The semitone index uses euclidean remainder so that sub-C0 frequencies still
/// land on a valid scale degree instead of indexing with a negative remainder.
pub fn frequency_to_note(freq: f32) -> String {
    let c0 = 440.0f32 * 2.0f32.powf(-4.75);
    let h = (12.0 * (freq / c0).log2()).round() as i32;
    let octave = h.div_euclid(12);
    let name = NOTE_NAMES[h.rem_euclid(12) as usize];
    format!("{}{}", name, octave)
}

/// Magnitude-weighted mean frequency over the full spectrum, 0 when silent.
pub fn spectral_centroid(spectrum: &Spectrum) -> f32 {
    let total: f32 = spectrum.magnitudes().iter().sum();
    if total <= 1e-10 {
        return 0.0;
    }
    let weighted: f32 = spectrum
        .magnitudes()
        .iter()
        .enumerate()
        .map(|(bin, &mag)| spectrum.bin_frequency(bin) * mag)
        .sum();
    weighted / total
}

/// Centroid substitute for the baked fast path: amplitude-weighted mean of the
/// fundamental (unit amplitude) and its overtone ladder.
pub fn harmonic_centroid(fundamental: f32, harmonics: &[HarmonicComponent]) -> f32 {
    let mut weighted = fundamental;
    let mut total = 1.0f32;
    for h in harmonics {
        weighted += h.frequency * h.amplitude;
        total += h.amplitude;
    }
    weighted / total
}

/// Band classification of the fundamental frequency.
pub fn classify(fundamental: f32) -> PatternClassification {
    if fundamental < 200.0 {
        PatternClassification::DeepResonance
    } else if fundamental < 400.0 {
        PatternClassification::StandingWave
    } else if fundamental < 800.0 {
        PatternClassification::ComplexSpiral
    } else {
        PatternClassification::HighFrequencyLattice
    }
}

pub fn symmetry(harmonic_count: usize) -> Symmetry {
    if harmonic_count > 5 {
        Symmetry::Radial
    } else if harmonic_count > 2 {
        Symmetry::Bilateral
    } else {
        Symmetry::Simple
    }
}

pub fn geometry(classification: PatternClassification, harmonic_count: usize) -> &'static str {
    let rich = harmonic_count > 4;
    match classification {
        PatternClassification::DeepResonance => {
            if rich { "concentric_rings" } else { "circle" }
        }
        PatternClassification::StandingWave => {
            if rich { "hexagonal" } else { "square" }
        }
        PatternClassification::ComplexSpiral => {
            if rich { "double_spiral" } else { "spiral" }
        }
        PatternClassification::HighFrequencyLattice => {
            if rich { "lattice" } else { "triangular" }
        }
    }
}

/// Composite quality heuristic, clamped to [30, 100] only after all terms.
///
/// An opaque contract, not an acoustic measurement: base 50, sacred-frequency
/// proximity, harmonic richness, golden-ratio spacing of consecutive harmonics,
/// out-of-range penalty, balanced-amplitude bonus.
pub fn vincian_score(fundamental: f32, harmonics: &[HarmonicComponent]) -> u8 {
    let mut score = 50.0f32;

    if SACRED_FREQUENCIES_HZ
        .iter()
        .any(|&f| (fundamental - f).abs() <= SACRED_TOLERANCE_HZ)
    {
        score += 15.0;
    }

    score += (3 * harmonics.len()).min(20) as f32;

    for pair in harmonics.windows(2) {
        let ratio = pair[1].frequency / pair[0].frequency;
        if (ratio - GOLDEN_RATIO).abs() < 0.1 {
            score += 5.0;
        }
    }

    if !(80.0..=4000.0).contains(&fundamental) {
        score -= 10.0;
    }

    if !harmonics.is_empty() {
        let mean = harmonics.iter().map(|h| h.amplitude).sum::<f32>() / harmonics.len() as f32;
        let variance = harmonics
            .iter()
            .map(|h| (h.amplitude - mean).powi(2))
            .sum::<f32>()
            / harmonics.len() as f32;
        if variance < 0.05 {
            score += 10.0;
        }
    }

    score.round().clamp(30.0, 100.0) as u8
}

/// Assemble the terminal descriptor from the extracted fundamentals/harmonics.
/// Scoring sees every evaluated harmonic; the public list is truncated to five.
pub fn synthesize(
    fundamental: f32,
    harmonics: &[HarmonicComponent],
    spectrum: Option<&Spectrum>,
) -> AnalysisResult {
    let score = vincian_score(fundamental, harmonics);
    let classification = classify(fundamental);
    let centroid = match spectrum {
        Some(spectrum) => spectral_centroid(spectrum),
        None => harmonic_centroid(fundamental, harmonics),
    };

    AnalysisResult {
        fundamental_frequency: round2(fundamental),
        musical_note: frequency_to_note(fundamental),
        harmonics: harmonics.iter().take(MAX_REPORTED_HARMONICS).cloned().collect(),
        score,
        pattern_classification: classification,
        symmetry: symmetry(harmonics.len()),
        geometry: geometry(classification, harmonics.len()),
        spectral_centroid: round2(centroid),
    }
}

fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
