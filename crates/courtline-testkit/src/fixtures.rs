//! Deterministic test identities and court trees

use courtline_core::Address;

/// Juror address derived from a seed.
pub fn juror(seed: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0x1a;
    bytes[19] = seed;
    Address::from_bytes(bytes)
}

/// Arbitrable contract address derived from a seed.
pub fn arbitrable(seed: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xa7;
    bytes[19] = seed;
    Address::from_bytes(bytes)
}

/// Dispute creator address derived from a seed.
pub fn creator(seed: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = 0xc0;
    bytes[19] = seed;
    Address::from_bytes(bytes)
}

/// `(child, parent)` edges of a four-level tree rooted at court 0.
///
/// ```text
/// 0 ─┬─ 1 ─┬─ 2 ── 4
///    │     └─ 3
///    └─ 5 ── 6
/// ```
pub const STANDARD_TREE: [(u64, u64); 6] = [(1, 0), (2, 1), (3, 1), (4, 2), (5, 0), (6, 5)];
