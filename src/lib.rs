//! Quality-control flagging for ground-based solar irradiance series.
//!
//! Applies the BSRN recommended physical-limit tests (1–3) and consistency
//! ratio tests (4–5) from Long & Dutton to minute GHI, DNI and DHI data,
//! derives a final accepted value per channel, and counts outcomes per
//! calendar month.
//!
//! Typical use:
//!
//! ```no_run
//! use irradiance_qc::{config::QcConfig, ingest::records, qc, report::QcReport};
//!
//! let config = QcConfig::load("./irradiance_qc.toml")?;
//! irradiance_qc::logging::init_from_config(&config.logging)?;
//! let input = records::read_records_csv("daa_2019_01.csv")?;
//! let run = qc::run_qc(&input, &config.thresholds, Some("DAA"))?;
//! irradiance_qc::report::log_report(&QcReport::from_run(&run));
//! # Ok::<(), irradiance_qc::model::QcError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod geometry;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod qc;
pub mod report;
pub mod stations;
