//! Capacity-bounded splitting of a requested transfer.

/// Residue below this is treated as float noise, not a chunk.
const VOLUME_EPSILON_UL: f64 = 1e-9;

/// Smallest volume the generated protocol can express.
pub const MIN_CHUNK_UL: f64 = 0.01;

/// Rounds to 2 decimals (µL resolution of the generated protocol).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Splits `total_ul` into chunks no larger than `capacity_ul`, full chunks
/// first and the remainder last. Every chunk is at least [`MIN_CHUNK_UL`];
/// a trailing residue that rounds to zero is dropped, and a total that
/// rounds to zero yields no chunks.
pub fn chunk_volumes(total_ul: f64, capacity_ul: f64) -> Vec<f64> {
    if !(total_ul > 0.0 && capacity_ul > 0.0) {
        return Vec::new();
    }
    let mut chunks = Vec::new();
    let mut remaining = total_ul;
    while remaining > VOLUME_EPSILON_UL {
        let volume = remaining.min(capacity_ul);
        let rounded = round2(volume);
        if rounded < MIN_CHUNK_UL {
            break;
        }
        chunks.push(rounded);
        remaining -= volume;
    }
    chunks
}
