use chrono::{DateTime, Utc};

use crate::models::{shorten_address, PriceQuote, RawTransaction, Tier, WhaleAlert};

/// Classify a whale-sized extrinsic.
///
/// Tiering:
/// - **MegaWhale**: ≥ 100,000 TAO
/// - **BigWhale**: ≥ 50,000 TAO
/// - **Whale**: everything else (the minimum is enforced by the fetch filter)
///
/// The alert timestamp is the block timestamp, or `observed_at` when the
/// provider didn't send one.
pub fn classify(tx: &RawTransaction, quote: &PriceQuote, observed_at: DateTime<Utc>) -> WhaleAlert {
    WhaleAlert {
        tier: Tier::for_amount(tx.amount),
        kind: tx.kind.clone(),
        action: tx.kind.action_label(),
        amount: tx.amount,
        usd_value: tx.amount * quote.usd,
        price_usd: quote.usd,
        subnet: tx.subnet,
        from: shorten_address(&tx.source),
        timestamp: tx.block_timestamp.unwrap_or(observed_at),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
