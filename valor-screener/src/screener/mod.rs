//! Value Screener Module.
//!
//! Turns a fundamentals export from a Brazilian screening site into a short,
//! ranked list of cheap, profitable, liquid companies.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        Screening funnel                              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  rows ──▶ normalize ──▶ liquidity ──▶ profitability ──▶ quality      │
//! │                                                            │         │
//! │  ranked ◀── rank ◀── outliers ◀── legal ◀── dedup ◀── sort ◀┘         │
//! │                                                                      │
//! │  ScreenerStore: owns {rows, thresholds}, recomputes on mutation      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use valor_screener::screener::{process_stocks, ScreenerEngine};
//!
//! let ranked = process_stocks(&rows, &FilterConfig::default());
//!
//! // Or keep the funnel statistics for a report
//! let result = ScreenerEngine::new(config).run(&rows);
//! ```

pub mod engine;
pub mod normalize;
pub mod numeric;
pub mod quantitative;
pub mod ranking;
pub mod report;
pub mod store;
pub mod summary;
pub mod types;

pub use engine::{process_stocks, ScreenerEngine, ScreenerResult};
pub use normalize::{detect_input_shape, normalize_data, normalize_row, InputShape, StockField};
pub use numeric::parse_numeric;
pub use quantitative::{FilterResult, FilterStage, QuantitativeFilter};
pub use ranking::{assign_ranking, base_issuer_key, deduplicate_companies, sort_by_value};
pub use report::{ReportFormat, ScreenerReport};
pub use store::{FilterConfigPatch, ProcessingError, ScreenerStore};
pub use summary::PortfolioSummary;
pub use types::{CellValue, InputRow, NormalizedStock, RankedStock, RawRow, UNKNOWN_TICKER};
