//! Wire framing for the channel exchange: 12 bytes, three little-endian
//! IEEE-754 binary32 values, plus the encoder quantization model.

use nalgebra::Vector3;

/// Exactly 12 bytes: three little-endian `f32` values.
pub const FRAME_LEN: usize = 12;

/// Pack a 3-vector into a 12-byte little-endian frame.
pub fn pack3(v: &Vector3<f64>) -> [u8; FRAME_LEN] {
    let mut out = [0u8; FRAME_LEN];
    for (i, component) in v.iter().enumerate() {
        let bytes = (*component as f32).to_le_bytes();
        out[i * 4..i * 4 + 4].copy_from_slice(&bytes);
    }
    out
}

/// Unpack a 12-byte little-endian frame into a 3-vector. An empty slice is
/// the Channel's startup sentinel and decodes to the zero vector. Any other
/// length is a framing bug in the core itself, not recoverable input.
pub fn unpack3(bytes: &[u8]) -> Vector3<f64> {
    if bytes.is_empty() {
        return Vector3::zeros();
    }
    debug_assert_eq!(bytes.len(), FRAME_LEN, "wire frame must be empty or 12 bytes");

    let mut components = [0.0f64; 3];
    for (i, chunk) in bytes.chunks_exact(4).take(3).enumerate() {
        let arr: [u8; 4] = chunk.try_into().expect("chunks_exact(4) yields 4 bytes");
        components[i] = f32::from_le_bytes(arr) as f64;
    }
    Vector3::new(components[0], components[1], components[2])
}

/// Quantize a joint angle in `[-pi, pi]` to `resolution` counts per full
/// revolution, the way a fixed-resolution encoder would.
pub fn quantize(q: f64, resolution: u32) -> f64 {
    let n = (resolution as f64 * (q + std::f64::consts::PI) / (2.0 * std::f64::consts::PI)) as i64;
    2.0 * std::f64::consts::PI * (n as f64) / (resolution as f64) - std::f64::consts::PI
}

/// Quantize all three joints in place.
pub fn quantize3(v: &Vector3<f64>, resolution: u32) -> Vector3<f64> {
    Vector3::new(
        quantize(v[0], resolution),
        quantize(v[1], resolution),
        quantize(v[2], resolution),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn p7_round_trip_is_bit_exact_within_f32_precision() {
        let v = Vector3::new(1.23456, -7.891, 0.0001);
        let packed = pack3(&v);
        let unpacked = unpack3(&packed);
        assert_eq!(unpacked, unpack3(&pack3(&unpacked)));
        for i in 0..3 {
            assert_relative_eq!(unpacked[i] as f32, v[i] as f32);
        }
    }

    #[test]
    fn empty_input_is_startup_sentinel() {
        assert_eq!(unpack3(&[]), Vector3::zeros());
    }

    #[test]
    fn frame_is_always_twelve_bytes() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert_eq!(pack3(&v).len(), FRAME_LEN);
    }

    #[test]
    fn e5_encoder_quantization() {
        let v = Vector3::new(5.121, 4.532, 6.553);
        let q = quantize3(&v, 4096);
        assert_relative_eq!(q[0], 5.1204, epsilon = 1e-4);
        assert_relative_eq!(q[1], 4.5313, epsilon = 1e-4);
        assert_relative_eq!(q[2], 6.5516, epsilon = 1e-4);
    }

    #[test]
    fn p8_quantization_error_is_bounded() {
        // `quantize` truncates toward the bin floor (`as i64`, matching the
        // encoder's precision-loss model), so the reconstruction error is
        // one-sided across a full bin width, up to 2*pi/N, not pi/N.
        let resolution = 4096u32;
        let bin = 2.0 * std::f64::consts::PI / resolution as f64;
        for i in -50..50 {
            let q = i as f64 * 0.07;
            let qq = quantize(q, resolution);
            assert!((qq - q).abs() <= bin + 1e-9, "q={q} qq={qq}");
        }
    }
}
