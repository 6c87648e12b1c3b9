//! PCM16 wire codec: float samples to little-endian bytes and back, plus the
//! base64 layer the JSON transport wraps around them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

/// Convert float samples in [-1, 1] to signed 16-bit integers. Out-of-range
/// input is clamped rather than wrapped; the capture path feeds us whatever
/// the device driver produced.
pub fn floats_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&sample| (sample.clamp(-1.0, 1.0) * 32_767.0) as i16)
        .collect()
}

/// Convert signed 16-bit samples back to floats in [-1, 1].
pub fn i16_to_floats(samples: &[i16]) -> Vec<f32> {
    samples
        .iter()
        .map(|&sample| sample as f32 / 32_768.0)
        .collect()
}

/// Pack samples as little-endian bytes, the layout the wire expects.
pub fn i16_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Unpack little-endian bytes into samples. A trailing odd byte is ignored;
/// the stream is byte-aligned per chunk, not across chunks.
pub fn le_bytes_to_i16(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Encode one outbound capture frame for the realtime-input envelope.
pub fn encode_frame(samples: &[i16]) -> String {
    BASE64.encode(i16_to_le_bytes(samples))
}

/// Decode an inbound base64 audio payload into float samples.
pub fn decode_base64_audio(data: &str) -> Result<Vec<f32>, base64::DecodeError> {
    let bytes = BASE64.decode(data)?;
    Ok(i16_to_floats(&le_bytes_to_i16(&bytes)))
}

/// Decode a raw binary audio frame into float samples.
pub fn decode_binary_audio(bytes: &[u8]) -> Vec<f32> {
    i16_to_floats(&le_bytes_to_i16(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip_preserves_bytes() {
        let cases: Vec<Vec<u8>> = vec![
            Vec::new(),
            vec![0],
            vec![0xff, 0x00, 0x7f, 0x80],
            (0..=255).collect(),
            vec![0xab; 8192],
        ];
        for bytes in cases {
            let encoded = BASE64.encode(&bytes);
            let decoded = BASE64.decode(&encoded).expect("our own encoding decodes");
            assert_eq!(decoded, bytes);
        }
    }

    #[test]
    fn le_bytes_round_trip() {
        let samples = vec![0i16, 1, -1, i16::MAX, i16::MIN, 12_345, -12_345];
        assert_eq!(le_bytes_to_i16(&i16_to_le_bytes(&samples)), samples);
    }

    #[test]
    fn trailing_odd_byte_is_dropped() {
        assert_eq!(le_bytes_to_i16(&[0x34, 0x12, 0x99]), vec![0x1234]);
    }

    #[test]
    fn float_conversion_clamps_out_of_range() {
        let out = floats_to_i16(&[2.0, -2.0]);
        assert_eq!(out, vec![32_767, -32_767]);
    }

    #[test]
    fn capture_block_survives_encode_decode_within_quantization() {
        // A 4096-sample block alternating +-0.5, the shape one capture
        // callback delivers.
        let block: Vec<f32> = (0..4096)
            .map(|i| if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        let encoded = encode_frame(&floats_to_i16(&block));
        let decoded = decode_base64_audio(&encoded).expect("valid payload");
        assert_eq!(decoded.len(), block.len());
        // Encode scales by 32767 and truncates, decode divides by 32768, so
        // the worst case is (1 + |x|) / 32768.
        for (orig, round) in block.iter().zip(&decoded) {
            assert!(
                (orig - round).abs() <= 2.0 / 32_768.0,
                "sample drifted past int16 quantization: {orig} vs {round}"
            );
        }
    }
}
