//! Value ordering, issuer deduplication and final ranking.

use std::collections::HashMap;

use super::types::{NormalizedStock, RankedStock};

/// Length of the issuer prefix shared by all share classes of a company
/// ("PETR" for PETR3/PETR4).
pub const ISSUER_KEY_LEN: usize = 4;

/// Stable ascending sort by EV/EBIT. NaN sorts last.
pub fn sort_by_value(stocks: &mut [NormalizedStock]) {
    stocks.sort_by(|a, b| a.ev_ebit.total_cmp(&b.ev_ebit));
}

/// Issuer key: the first four characters of the ticker, or the whole ticker
/// when shorter.
pub fn base_issuer_key(ticker: &str) -> &str {
    match ticker.char_indices().nth(ISSUER_KEY_LEN) {
        Some((idx, _)) => &ticker[..idx],
        None => ticker,
    }
}

/// Keep one share class per issuer.
///
/// The first record seen for a key holds the slot; a later record replaces it
/// only with strictly greater liquidity. Slots keep first-seen order.
pub fn deduplicate_companies(stocks: Vec<NormalizedStock>) -> Vec<NormalizedStock> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut kept: Vec<NormalizedStock> = Vec::with_capacity(stocks.len());

    for stock in stocks {
        let key = base_issuer_key(&stock.ticker).to_string();
        match slots.get(&key) {
            Some(&slot) => {
                if stock.liquidity > kept[slot].liquidity {
                    kept[slot] = stock;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(stock);
            }
        }
    }

    kept
}

/// Attach 1-based positions in sequence order.
pub fn assign_ranking(stocks: Vec<NormalizedStock>) -> Vec<RankedStock> {
    stocks
        .into_iter()
        .enumerate()
        .map(|(index, stock)| RankedStock {
            stock,
            ranking: index + 1,
        })
        .collect()
}
