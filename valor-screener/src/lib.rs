//! Valor Screener Library
//!
//! Value screening for Brazilian equities: reads fundamentals exported from
//! sites like Fundamentus or Status Invest, keeps liquid, profitable,
//! high-ROIC companies, and ranks them by EV/EBIT (cheapest first).
//!
//! # Key Concepts
//!
//! ## Normalization
//! - Column headers differ between sources; each field has an alias list
//! - Numbers arrive PT-BR formatted (`R$ 1.234,56`, `12,5%`)
//!
//! ## Funnel
//! - Liquidity > floor, EBIT margin > 0, ROIC >= floor
//! - One share class per issuer (most liquid wins)
//! - No companies under judicial recovery, no negative valuations
//!
//! ## Price History
//! - Daily closes from Yahoo Finance (`<TICKER>.SA`), decoupled from ranking

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod decode;
pub mod format;
pub mod history;
pub mod screener;

pub use decode::{decode_xlsx, read_rows, DecodeError, InputFormat};
pub use history::{HistoryError, PriceHistoryProvider, StockPriceHistory, TimePeriod, YahooChartClient};
pub use screener::{
    process_stocks, FilterConfigPatch, InputRow, NormalizedStock, RankedStock, RawRow,
    ScreenerEngine, ScreenerReport, ScreenerResult, ScreenerStore,
};
