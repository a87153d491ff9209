/// Analysis sample rate in Hz. Bin resolution is SAMPLE_RATE / FFT_SIZE ≈ 21.53 Hz.
pub const SAMPLE_RATE: f32 = 44100.0;
/// Transform size. Must stay a power of two.
pub const FFT_SIZE: usize = 2048;

/// Raw analysis input as it arrives from the request layer.
#[derive(Clone, Debug)]
pub enum AudioInput {
    /// 16-bit signed little-endian PCM bytes.
    Pcm16(Vec<u8>),
    /// Sample values, nominally in [-1, 1].
    Samples(Vec<f32>),
    /// Opaque seed string (demo/test inputs).
    Seed(String),
    Absent,
}

/// Fixed-length buffer of samples in [-1, 1], ready for the spectral transform.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Outcome of sample preparation. Seed-like inputs skip the transform entirely and
/// carry only the reproducible fundamental they hash to; identical seeds always
/// yield identical analysis results.
#[derive(Clone, Debug)]
pub enum Prepared {
    Buffer(SampleBuffer),
    Baked { fundamental: f32 },
}

/// Normalize arbitrary input into either a SampleBuffer of exactly FFT_SIZE samples
/// or a baked fundamental. Never fails; the last-resort fallback is a 440 Hz profile.
pub fn prepare(input: AudioInput) -> Prepared {
    match input {
        AudioInput::Samples(values) => {
            if values.is_empty() {
                return Prepared::Baked { fundamental: DEFAULT_FUNDAMENTAL_HZ };
            }
            // Take the first FFT_SIZE values, zero-pad when fewer are supplied.
            let mut samples = vec![0.0f32; FFT_SIZE];
            for (slot, &v) in samples.iter_mut().zip(values.iter()) {
                *slot = v.clamp(-1.0, 1.0);
            }
            Prepared::Buffer(SampleBuffer { samples })
        }
        AudioInput::Pcm16(bytes) => {
            if bytes.len() < 2 {
                return Prepared::Baked { fundamental: DEFAULT_FUNDAMENTAL_HZ };
            }
            let mut samples = vec![0.0f32; FFT_SIZE];
            for (slot, pair) in samples.iter_mut().zip(bytes.chunks_exact(2)) {
                let v = i16::from_le_bytes([pair[0], pair[1]]);
                *slot = v as f32 / 32768.0;
            }
            Prepared::Buffer(SampleBuffer { samples })
        }
        AudioInput::Seed(seed) => Prepared::Baked { fundamental: seed_frequency(&seed) },
        AudioInput::Absent => Prepared::Baked { fundamental: DEFAULT_FUNDAMENTAL_HZ },
    }
}

pub const DEFAULT_FUNDAMENTAL_HZ: f32 = 440.0;

/// Map a seed string to a reproducible fundamental in [200, 800) Hz.
///
/// Uses the 32-bit wrapping string hash `h = (h << 5) - h + code` over UTF-16 code
/// units. The literal "test" marker and the empty string pin to 440 Hz.
pub fn seed_frequency(seed: &str) -> f32 {
    if seed.is_empty() || seed == "test" {
        return DEFAULT_FUNDAMENTAL_HZ;
    }
    let mut hash: i32 = 0;
    for code in seed.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(code as i32);
    }
    200.0 + (hash % 600).abs() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_test_marker_is_440() {
        assert_eq!(seed_frequency("test"), 440.0);
        assert_eq!(seed_frequency(""), 440.0);
    }

    #[test]
    fn seed_frequency_is_reproducible_and_in_range() {
        let a = seed_frequency("my-track.wav");
        let b = seed_frequency("my-track.wav");
        assert_eq!(a, b);
        assert!((200.0..800.0).contains(&a));
    }

    #[test]
    fn distinct_seeds_usually_differ() {
        assert_ne!(seed_frequency("alpha"), seed_frequency("omega"));
    }

    #[test]
    fn short_samples_are_zero_padded() {
        let prepared = prepare(AudioInput::Samples(vec![0.5, -0.5]));
        match prepared {
            Prepared::Buffer(buf) => {
                assert_eq!(buf.samples().len(), FFT_SIZE);
                assert_eq!(buf.samples()[0], 0.5);
                assert_eq!(buf.samples()[1], -0.5);
                assert!(buf.samples()[2..].iter().all(|&s| s == 0.0));
            }
            Prepared::Baked { .. } => panic!("expected a sample buffer"),
        }
    }

    #[test]
    fn long_samples_are_truncated() {
        let prepared = prepare(AudioInput::Samples(vec![0.1; FFT_SIZE * 2]));
        match prepared {
            Prepared::Buffer(buf) => assert_eq!(buf.samples().len(), FFT_SIZE),
            Prepared::Baked { .. } => panic!("expected a sample buffer"),
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let prepared = prepare(AudioInput::Samples(vec![3.0, -3.0]));
        match prepared {
            Prepared::Buffer(buf) => {
                assert_eq!(buf.samples()[0], 1.0);
                assert_eq!(buf.samples()[1], -1.0);
            }
            Prepared::Baked { .. } => panic!("expected a sample buffer"),
        }
    }

    #[test]
    fn pcm16_is_scaled_to_unit_range() {
        // i16::MIN, 0, i16::MAX as little-endian pairs
        let bytes = vec![0x00, 0x80, 0x00, 0x00, 0xFF, 0x7F];
        let prepared = prepare(AudioInput::Pcm16(bytes));
        match prepared {
            Prepared::Buffer(buf) => {
                assert_eq!(buf.samples()[0], -1.0);
                assert_eq!(buf.samples()[1], 0.0);
                assert!((buf.samples()[2] - 1.0).abs() < 1e-4);
            }
            Prepared::Baked { .. } => panic!("expected a sample buffer"),
        }
    }

    #[test]
    fn degenerate_inputs_bake_the_default() {
        for input in [
            AudioInput::Absent,
            AudioInput::Samples(Vec::new()),
            AudioInput::Pcm16(vec![0x01]),
        ] {
            match prepare(input) {
                Prepared::Baked { fundamental } => assert_eq!(fundamental, 440.0),
                Prepared::Buffer(_) => panic!("expected baked fallback"),
            }
        }
    }
}
