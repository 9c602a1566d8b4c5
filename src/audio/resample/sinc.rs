//! `resample/sinc.rs`: Blackman-windowed sinc resampler.
//!
//! Highest quality mode. When downsampling the kernel cutoff follows the
//! target Nyquist frequency.

use crate::audio::constants::SINC_TAPS;

pub struct SincResampler {
    ratio: f64,
    index: f64,
    channels: usize,
    taps: usize,
    /// Normalized cutoff (1.0 = source Nyquist).
    cutoff: f32,
    window: Vec<f32>,
    /// Per-channel delay line, newest sample last.
    buffer: Vec<Vec<f32>>,
}

impl SincResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        let taps = SINC_TAPS;
        let ratio = source_rate as f64 / target_rate as f64;
        Self {
            ratio,
            index: 0.0,
            channels,
            taps,
            cutoff: (1.0 / ratio).min(1.0) as f32,
            window: (0..taps)
                .map(|i| Self::blackman(i as f32, taps as f32 - 1.0))
                .collect(),
            buffer: vec![vec![0.0; taps]; channels],
        }
    }

    fn sinc(x: f32) -> f32 {
        if x.abs() < 1e-6 {
            return 1.0;
        }
        let pi_x = std::f32::consts::PI * x;
        pi_x.sin() / pi_x
    }

    fn blackman(n: f32, m: f32) -> f32 {
        let a0 = 0.42;
        let a1 = 0.5;
        let a2 = 0.08;
        let pi_n_m = 2.0 * std::f32::consts::PI * n / m;
        a0 - a1 * pi_n_m.cos() + a2 * (2.0 * pi_n_m).cos()
    }

    pub fn latency(&self) -> usize {
        self.taps / 2
    }

    /// Resample `input` and append to `output`.
    pub fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        let num_frames = input.len() / self.channels;
        // Read position sits between taps `center` and `center + 1`, which keeps
        // it symmetric inside the window on average.
        let center = (self.taps / 2 - 1) as f32;

        for frame in 0..num_frames {
            for ch in 0..self.channels {
                let line = &mut self.buffer[ch];
                line.copy_within(1.., 0);
                line[self.taps - 1] = input[frame * self.channels + ch];
            }

            while self.index < 1.0 {
                let frac = self.index as f32;
                for ch in 0..self.channels {
                    let mut sum = 0.0;
                    for i in 0..self.taps {
                        let offset = (i as f32 - center) - frac;
                        sum += self.buffer[ch][i]
                            * self.cutoff
                            * Self::sinc(self.cutoff * offset)
                            * self.window[i];
                    }
                    output.push(sum);
                }
                self.index += self.ratio;
            }
            self.index -= 1.0;
        }
    }
}
