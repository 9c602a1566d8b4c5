//! Packed sample decoding/encoding and channel remixing.
//!
//! All processing happens on interleaved `f32` in [-1.0, 1.0]. Multi-byte
//! encodings use native byte order.

use byteorder::{ByteOrder, NativeEndian};

use super::{
    constants::{INT16_SCALE, INT32_SCALE, U8_BIAS},
    format::{ChannelLayout, SampleEncoding},
};

/// Decodes every whole sample in `bytes` and appends it to `out`.
pub fn decode_into(encoding: SampleEncoding, bytes: &[u8], out: &mut Vec<f32>) {
    let width = encoding.bytes();
    out.reserve(bytes.len() / width);

    match encoding {
        SampleEncoding::U8 => out.extend(bytes.iter().map(|&b| (b as f32 - U8_BIAS) / U8_BIAS)),
        SampleEncoding::S16 => out.extend(
            bytes
                .chunks_exact(width)
                .map(|c| NativeEndian::read_i16(c) as f32 / INT16_SCALE),
        ),
        SampleEncoding::S32 => out.extend(
            bytes
                .chunks_exact(width)
                .map(|c| (NativeEndian::read_i32(c) as f64 / INT32_SCALE) as f32),
        ),
        SampleEncoding::F32 => out.extend(bytes.chunks_exact(width).map(NativeEndian::read_f32)),
        SampleEncoding::F64 => out.extend(
            bytes
                .chunks_exact(width)
                .map(|c| NativeEndian::read_f64(c) as f32),
        ),
    }
}

/// Encodes `samples` into `out`, which must hold exactly
/// `samples.len() * encoding.bytes()` bytes. Out-of-range values are clamped.
pub fn encode_into(encoding: SampleEncoding, samples: &[f32], out: &mut [u8]) {
    let width = encoding.bytes();
    debug_assert_eq!(out.len(), samples.len() * width);

    match encoding {
        SampleEncoding::U8 => {
            for (dst, &s) in out.iter_mut().zip(samples) {
                *dst = (s * U8_BIAS + U8_BIAS).round().clamp(0.0, 255.0) as u8;
            }
        }
        SampleEncoding::S16 => {
            for (dst, &s) in out.chunks_exact_mut(width).zip(samples) {
                let v = (s * INT16_SCALE).round().clamp(i16::MIN as f32, i16::MAX as f32);
                NativeEndian::write_i16(dst, v as i16);
            }
        }
        SampleEncoding::S32 => {
            for (dst, &s) in out.chunks_exact_mut(width).zip(samples) {
                let v = (s as f64 * INT32_SCALE)
                    .round()
                    .clamp(i32::MIN as f64, i32::MAX as f64);
                NativeEndian::write_i32(dst, v as i32);
            }
        }
        SampleEncoding::F32 => {
            for (dst, &s) in out.chunks_exact_mut(width).zip(samples) {
                NativeEndian::write_f32(dst, s);
            }
        }
        SampleEncoding::F64 => {
            for (dst, &s) in out.chunks_exact_mut(width).zip(samples) {
                NativeEndian::write_f64(dst, s as f64);
            }
        }
    }
}

/// Converts interleaved frames between channel layouts, appending to `out`.
///
/// Mono → stereo duplicates each sample; stereo → mono averages the pair.
pub fn remix_into(input: &[f32], from: ChannelLayout, to: ChannelLayout, out: &mut Vec<f32>) {
    match (from, to) {
        (ChannelLayout::Mono, ChannelLayout::Stereo) => {
            out.reserve(input.len() * 2);
            out.extend(input.iter().flat_map(|&s| [s, s]));
        }
        (ChannelLayout::Stereo, ChannelLayout::Mono) => {
            out.reserve(input.len() / 2);
            out.extend(input.chunks_exact(2).map(|pair| (pair[0] + pair[1]) * 0.5));
        }
        _ => out.extend_from_slice(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(encoding: SampleEncoding, samples: &[f32]) -> Vec<f32> {
        let mut bytes = vec![0u8; samples.len() * encoding.bytes()];
        encode_into(encoding, samples, &mut bytes);
        let mut back = Vec::new();
        decode_into(encoding, &bytes, &mut back);
        back
    }

    #[test]
    fn s16_roundtrip_within_one_lsb() {
        let input = [0.0, 0.5, -0.5, 0.999, -1.0];
        for (a, b) in input.iter().zip(roundtrip(SampleEncoding::S16, &input)) {
            assert!((a - b).abs() <= 1.0 / INT16_SCALE, "{a} vs {b}");
        }
    }

    #[test]
    fn u8_silence_is_128() {
        let mut bytes = [0u8; 1];
        encode_into(SampleEncoding::U8, &[0.0], &mut bytes);
        assert_eq!(bytes[0], 128);

        let mut decoded = Vec::new();
        decode_into(SampleEncoding::U8, &[128, 0, 255], &mut decoded);
        assert_eq!(decoded[0], 0.0);
        assert_eq!(decoded[1], -1.0);
        assert!(decoded[2] > 0.99);
    }

    #[test]
    fn integer_encodings_clamp() {
        let mut bytes = [0u8; 4];
        encode_into(SampleEncoding::S16, &[2.0, -2.0], &mut bytes);
        assert_eq!(NativeEndian::read_i16(&bytes[0..2]), i16::MAX);
        assert_eq!(NativeEndian::read_i16(&bytes[2..4]), i16::MIN);

        let mut bytes = [0u8; 4];
        encode_into(SampleEncoding::S32, &[1.5], &mut bytes);
        assert_eq!(NativeEndian::read_i32(&bytes), i32::MAX);
    }

    #[test]
    fn float_encodings_are_exact() {
        let input = [0.25f32, -0.125, 0.75];
        assert_eq!(roundtrip(SampleEncoding::F32, &input), input);
        assert_eq!(roundtrip(SampleEncoding::F64, &input), input);
    }

    #[test]
    fn decode_ignores_trailing_partial_sample() {
        let mut out = Vec::new();
        decode_into(SampleEncoding::S16, &[0, 0, 0, 0, 7], &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn stereo_to_mono_averages() {
        let mut out = Vec::new();
        remix_into(&[0.2, 0.4, 1.0, -1.0], ChannelLayout::Stereo, ChannelLayout::Mono, &mut out);
        assert!((out[0] - 0.3).abs() < 1e-6);
        assert_eq!(out[1], 0.0);
    }

    #[test]
    fn mono_to_stereo_duplicates() {
        let mut out = Vec::new();
        remix_into(&[0.1, 0.2], ChannelLayout::Mono, ChannelLayout::Stereo, &mut out);
        assert_eq!(out, vec![0.1, 0.1, 0.2, 0.2]);
    }
}
