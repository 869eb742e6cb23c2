//! Explicit numeric binning
//!
//! Bin edges are right-closed `(lower, upper]` except for `size_bucket`, which
//! floors into half-open `[k*5, k*5+5)` bins and is unbounded above.

/// Width of a size bucket in ㎡
pub const SIZE_BUCKET_WIDTH: f64 = 5.0;

/// Building-age edges: (0,5] → 0, (5,10] → 1, (10,20] → 2, (20,∞) → 3
pub const AGE_GROUP_EDGES: [f64; 4] = [0.0, 5.0, 10.0, 20.0];

/// Floor edges: (0,5] → 0 low, (5,15] → 1 mid, (15,∞) → 2 high
pub const FLOOR_GROUP_EDGES: [f64; 3] = [0.0, 5.0, 15.0];

/// `floor(area / 5) * 5`. 74.9 → 70, 75.0 → 75.
///
/// Non-finite or negative areas have no bucket.
pub fn size_bucket(area: f64) -> Option<i64> {
    if !area.is_finite() || area < 0.0 {
        return None;
    }
    Some(((area / SIZE_BUCKET_WIDTH).floor() * SIZE_BUCKET_WIDTH) as i64)
}

/// Index of the right-closed bin containing `value`, open-ended above the
/// last edge. Values at or below the first edge fall outside every bin.
fn right_closed_bin(value: f64, edges: &[f64]) -> Option<u8> {
    if !value.is_finite() || value <= edges[0] {
        return None;
    }
    let idx = edges[1..]
        .iter()
        .position(|upper| value <= *upper)
        .unwrap_or(edges.len() - 1);
    Some(idx as u8)
}

pub fn age_group(age: i32) -> Option<u8> {
    right_closed_bin(age as f64, &AGE_GROUP_EDGES)
}

/// Basement floors (≤ 0) are ungrouped
pub fn floor_group(floor: i32) -> Option<u8> {
    right_closed_bin(floor as f64, &FLOOR_GROUP_EDGES)
}

/// 0 winter (12-2), 1 spring (3-5), 2 summer (6-8), 3 autumn (9-11)
pub fn season(month: u32) -> Option<u8> {
    match month {
        12 | 1 | 2 => Some(0),
        3..=5 => Some(1),
        6..=8 => Some(2),
        9..=11 => Some(3),
        _ => None,
    }
}
