//! Unit conversions between container units and schema units.
//!
//! The container stores lengths in twips (1/20 pt), font sizes in
//! half-points and proportional line spacing in 240ths of a line. The
//! schema uses millimetres and points. Reported values are rounded to a
//! granularity coarser than one twip, so converting a reported value back
//! and reporting it again yields the same number.

const TWIPS_PER_INCH: f64 = 1440.0;
const MM_PER_INCH: f64 = 25.4;
const LINE_UNITS: f64 = 240.0;

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Millimetres to twips.
pub fn mm_to_twips(mm: f64) -> i32 {
    (mm * TWIPS_PER_INCH / MM_PER_INCH).round() as i32
}

/// Twips to millimetres, rounded to 0.1 mm.
pub fn twips_to_mm(twips: i32) -> f64 {
    round_to(twips as f64 * MM_PER_INCH / TWIPS_PER_INCH, 1)
}

/// Points to twips.
pub fn pt_to_twips(pt: f64) -> i32 {
    (pt * 20.0).round() as i32
}

/// Twips to points, rounded to 0.01 pt.
pub fn twips_to_pt(twips: i32) -> f64 {
    round_to(twips as f64 / 20.0, 2)
}

/// Points to half-points.
pub fn pt_to_half_points(pt: f64) -> u32 {
    (pt * 2.0).round().max(0.0) as u32
}

/// Half-points to points (exact).
pub fn half_points_to_pt(half_points: u32) -> f64 {
    half_points as f64 / 2.0
}

/// Line multiple (1.0 = single) to 240ths of a line.
pub fn multiple_to_line(multiple: f64) -> i32 {
    (multiple * LINE_UNITS).round() as i32
}

/// 240ths of a line to a line multiple, rounded to 0.01.
pub fn line_to_multiple(line: i32) -> f64 {
    round_to(line as f64 / LINE_UNITS, 2)
}
