/// Hand-off formats the QC core reads directly.
///
/// Provider formats (BSRN station-to-archive files, SAURAN logger CSVs) are
/// parsed and gap-filled upstream. What arrives here is already one row per
/// minute with geometry attached.
///
/// Submodules:
/// - `records`: normalized per-minute CSV with missing-value sentinels.

pub mod records;
