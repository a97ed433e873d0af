use std::f32::consts::{FRAC_1_SQRT_2, PI};

/// Second-order low-pass biquad (RBJ cookbook, Butterworth Q).
///
/// Rhythmic onsets concentrate in the bass range, so the beat detector runs
/// on the output of this filter rather than the full-band signal.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl LowPassFilter {
    pub fn new(sample_rate: u32, cutoff_hz: f32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        // Keep the cutoff strictly below Nyquist or the coefficients blow up
        let cutoff = cutoff_hz.clamp(1.0, sample_rate * 0.49);

        let omega = 2.0 * PI * cutoff / sample_rate;
        let (sin, cos) = omega.sin_cos();
        let alpha = sin / (2.0 * FRAC_1_SQRT_2);
        let a0 = 1.0 + alpha;

        Self {
            b0: (1.0 - cos) / 2.0 / a0,
            b1: (1.0 - cos) / a0,
            b2: (1.0 - cos) / 2.0 / a0,
            a1: -2.0 * cos / a0,
            a2: (1.0 - alpha) / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let output = self.b0 * sample + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = sample;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Filter a whole buffer, starting from a clean state.
    pub fn process_buffer(&mut self, samples: &[f32]) -> Vec<f32> {
        self.reset();
        samples.iter().map(|&s| self.process(s)).collect()
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}
