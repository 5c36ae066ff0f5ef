/// Aggregation over flagged QC output.
///
/// Everything here only reads `FlaggedRecord`s; no module in `analysis`
/// changes a flag.
///
/// Submodules:
/// - `monthly`: per-calendar-month pass/fail and band-flag counts.

pub mod monthly;
