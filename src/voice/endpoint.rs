//! Single-utterance endpointing
//!
//! Decides when one spoken utterance is over using frame energy: speech
//! onset opens the utterance, trailing silence closes it. A session that
//! never hears speech ends on its own.

use super::SAMPLE_RATE;

/// Minimum RMS energy to count a chunk as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum utterance length worth transcribing (0.3 s)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Trailing silence that ends an utterance (0.8 s)
const TRAILING_SILENCE_SAMPLES: usize = SAMPLE_RATE as usize * 8 / 10;

/// Leading silence after which the session gives up (8 s)
const NO_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 8;

/// Hard cap on utterance length (30 s)
const MAX_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 30;

/// Outcome of feeding audio to the endpointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Keep listening
    Pending,
    /// The utterance is over
    Complete,
    /// Nothing was said before the session timed out
    NoSpeech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Speech,
}

/// Energy-based utterance endpointer
#[derive(Debug)]
pub struct UtteranceEndpointer {
    phase: Phase,
    buffer: Vec<f32>,
    silence: usize,
    waited: usize,
}

impl Default for UtteranceEndpointer {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceEndpointer {
    /// Create an endpointer waiting for speech
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: Phase::Waiting,
            buffer: Vec::new(),
            silence: 0,
            waited: 0,
        }
    }

    /// Feed the next chunk of samples
    pub fn push(&mut self, samples: &[f32]) -> Endpoint {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.phase {
            Phase::Waiting => {
                if is_speech {
                    self.phase = Phase::Speech;
                    self.buffer.extend_from_slice(samples);
                    self.silence = 0;
                    tracing::trace!(energy, "speech onset");
                } else {
                    self.waited += samples.len();
                    if self.waited > NO_SPEECH_SAMPLES {
                        tracing::debug!("no speech detected");
                        return Endpoint::NoSpeech;
                    }
                }
            }
            Phase::Speech => {
                self.buffer.extend_from_slice(samples);
                if is_speech {
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                if self.buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    tracing::debug!(samples = self.buffer.len(), "utterance hit length cap");
                    return Endpoint::Complete;
                }

                if self.silence > TRAILING_SILENCE_SAMPLES {
                    if self.buffer.len() > MIN_SPEECH_SAMPLES + self.silence {
                        tracing::debug!(samples = self.buffer.len(), "utterance complete");
                        return Endpoint::Complete;
                    }
                    // A blip followed by silence: keep waiting for real speech
                    tracing::trace!("discarding short noise burst");
                    self.waited += self.buffer.len();
                    self.buffer.clear();
                    self.silence = 0;
                    self.phase = Phase::Waiting;
                }
            }
        }

        Endpoint::Pending
    }

    /// Whether speech has been heard in the current utterance
    #[must_use]
    pub fn has_speech(&self) -> bool {
        self.phase == Phase::Speech
    }

    /// Captured utterance, if long enough to transcribe
    #[must_use]
    pub fn into_utterance(self) -> Option<Vec<f32>> {
        (self.phase == Phase::Speech && self.buffer.len() > MIN_SPEECH_SAMPLES)
            .then_some(self.buffer)
    }
}

/// RMS energy of a chunk
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_of_silence_is_zero() {
        assert!(calculate_energy(&[0.0; 160]) < f32::EPSILON);
        assert!(calculate_energy(&[]) < f32::EPSILON);
    }

    #[test]
    fn test_energy_of_constant_signal() {
        let energy = calculate_energy(&[0.5; 160]);
        assert!((energy - 0.5).abs() < 1e-6);
    }
}
