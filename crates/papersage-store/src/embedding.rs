//! Vector encodings: uint8 scalar quantization for candidate scoring and
//! little-endian blobs for storage.

use ndarray::{Array1, ArrayView1};

/// A vector stored as one byte per component.
///
/// Each component is recovered as `byte * scale + offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedVector {
    pub bytes: Vec<u8>,
    pub scale: f32,
    pub offset: f32,
}

impl QuantizedVector {
    /// Map the vector's [min, max] range linearly onto 0..=255.
    pub fn quantize(vector: ArrayView1<'_, f32>) -> Self {
        let (lo, hi) = vector
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let range = hi - lo;
        // constant or empty vector
        if !range.is_finite() || range < 1e-9 {
            return Self {
                bytes: vec![0; vector.len()],
                scale: 0.0,
                offset: if lo.is_finite() { lo } else { 0.0 },
            };
        }

        let scale = range / 255.0;
        let bytes = vector
            .iter()
            .map(|&v| ((v - lo) / scale).round().clamp(0.0, 255.0) as u8)
            .collect();
        Self {
            bytes,
            scale,
            offset: lo,
        }
    }

    pub fn dequantize(&self) -> Array1<f32> {
        self.bytes
            .iter()
            .map(|&b| f32::from(b) * self.scale + self.offset)
            .collect()
    }

    /// Dot product with a float query without dequantizing.
    ///
    /// Σ (b·scale + offset)·q = scale·Σ b·q + offset·Σ q, so callers pass
    /// `query_sum` once per query.
    pub fn dot(&self, query: ArrayView1<'_, f32>, query_sum: f32) -> f32 {
        let raw: f32 = self
            .bytes
            .iter()
            .zip(query.iter())
            .map(|(&b, &q)| f32::from(b) * q)
            .sum();
        self.scale * raw + self.offset * query_sum
    }
}

/// Encode a float vector as little-endian bytes for storage.
pub fn vector_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode little-endian bytes written by `vector_to_blob`.
pub fn blob_to_vector(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}
