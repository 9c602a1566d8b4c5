//! `resample/linear.rs`: fast linear-interpolation resampler.

pub(super) const LATENCY: usize = 1;

pub struct LinearResampler {
    /// Source / target ratio (< 1.0 upsamples, > 1.0 downsamples).
    ratio: f64,
    /// Fractional read head within the current input block.
    index: f64,
    /// Last frame of the previous block (per channel) for cross-block interpolation.
    last_samples: Vec<f32>,
    channels: usize,
}

impl LinearResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self {
            ratio: source_rate as f64 / target_rate as f64,
            index: 0.0,
            last_samples: vec![0.0; channels],
            channels,
        }
    }

    /// Resample `input` and **append** resampled samples into `output`.
    pub fn process(&mut self, input: &[f32], output: &mut Vec<f32>) {
        let num_frames = input.len() / self.channels;
        if num_frames == 0 {
            return;
        }

        while self.index < num_frames as f64 {
            let idx = self.index as usize;
            let fract = self.index.fract() as f32;

            for c in 0..self.channels {
                let s1 = if idx == 0 {
                    self.last_samples[c]
                } else {
                    input[(idx - 1) * self.channels + c]
                };
                let s2 = input[idx * self.channels + c];

                output.push(s1 + (s2 - s1) * fract);
            }

            self.index += self.ratio;
        }

        self.index -= num_frames as f64;

        let tail = (num_frames - 1) * self.channels;
        self.last_samples
            .copy_from_slice(&input[tail..tail + self.channels]);
    }
}
