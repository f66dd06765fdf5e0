//! Shared primitive types used across the entire engine.

/// Zero-based index of a projected year within a run.
pub type YearIndex = u32;

/// Calendar label of a projected year (e.g. 2021).
pub type Year = u32;

/// The canonical run identifier.
pub type RunId = String;

/// Calendar year of the fiscal base the default calibration describes.
pub const BASE_YEAR: Year = 2020;

/// Calendar label for the year at `index` (index 0 is the first projected year).
pub fn calendar_year(index: YearIndex) -> Year {
    BASE_YEAR + 1 + index
}
