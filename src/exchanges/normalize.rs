use super::gate::{RawNumber, RawTickerItem};
use crate::errors::ItemParseError;
use crate::models::FundingRate;

/// Gate settles funding every 8 hours and does not report it per contract.
pub const GATE_FUNDING_INTERVAL_HOURS: u32 = 8;

const QUOTE_TOKEN: &str = "USDT";

/// Only USDT-quoted contracts are kept. Identifiers with a `USD_` segment or a
/// plain `USD` suffix are other margin types and are dropped.
pub fn is_usdt_contract(contract: &str) -> bool {
    !contract.is_empty()
        && contract.contains(QUOTE_TOKEN)
        && !contract.contains("USD_")
        && !contract.ends_with("USD")
}

/// "BTC_USDT" -> "BTCUSDT"
pub fn normalize_symbol(contract: &str) -> String {
    contract.replace('_', "")
}

/// Maps one raw ticker into a [`FundingRate`].
///
/// `Ok(None)` means the contract is filtered out, `Err` means it passed the
/// filter but its numeric fields are unusable.
pub fn normalize(item: &RawTickerItem) -> Result<Option<FundingRate>, ItemParseError> {
    let contract = match item.contract.as_deref() {
        Some(c) if is_usdt_contract(c) => c,
        _ => return Ok(None),
    };

    let rate = parse_f64("funding_rate", item.funding_rate.as_ref())?;
    let next_apply_secs = parse_u64("funding_next_apply", item.funding_next_apply.as_ref())?;
    let next_funding_time_millis = next_apply_secs
        .checked_mul(1000)
        .ok_or(ItemParseError::TimestampOverflow(next_apply_secs))?;

    Ok(Some(FundingRate {
        symbol: normalize_symbol(contract),
        rate,
        next_funding_time_millis,
        funding_interval_hours: GATE_FUNDING_INTERVAL_HOURS,
    }))
}

/// Runs [`normalize`] over a whole listing. Bad items are logged with their
/// raw content and skipped; returns the batch and the number of skipped items.
pub fn normalize_batch(items: &[RawTickerItem]) -> (Vec<FundingRate>, usize) {
    let mut skipped = 0;
    let mut batch = Vec::with_capacity(items.len());

    for item in items {
        match normalize(item) {
            Ok(Some(rate)) => {
                tracing::debug!(
                    "[gate] {} rate={} next_funding_ms={} interval={}h",
                    rate.symbol,
                    rate.rate,
                    rate.next_funding_time_millis,
                    rate.funding_interval_hours
                );
                batch.push(rate);
            }
            Ok(None) => {
                tracing::trace!("[gate] filtered out {:?}", item.contract);
            }
            Err(e) => {
                skipped += 1;
                tracing::warn!("[gate] failed to parse item {item:?}: {e}");
            }
        }
    }

    (batch, skipped)
}

fn parse_f64(field: &'static str, raw: Option<&RawNumber>) -> Result<f64, ItemParseError> {
    let invalid = |value: String| ItemParseError::InvalidNumber { field, value };

    let value = match raw.ok_or(ItemParseError::MissingField(field))? {
        RawNumber::Number(n) => n.as_f64().ok_or_else(|| invalid(n.to_string()))?,
        RawNumber::Text(s) => s.trim().parse::<f64>().map_err(|_| invalid(s.clone()))?,
    };

    // "NaN" and "inf" parse fine but are not rates
    if !value.is_finite() {
        return Err(invalid(value.to_string()));
    }
    Ok(value)
}

fn parse_u64(field: &'static str, raw: Option<&RawNumber>) -> Result<u64, ItemParseError> {
    let invalid = |value: String| ItemParseError::InvalidNumber { field, value };

    match raw.ok_or(ItemParseError::MissingField(field))? {
        RawNumber::Number(n) => n.as_u64().ok_or_else(|| invalid(n.to_string())),
        RawNumber::Text(s) => s.trim().parse::<u64>().map_err(|_| invalid(s.clone())),
    }
}
