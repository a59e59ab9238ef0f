use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{PriceQuote, StakePosition, TxKind, WalletBalance, WhaleAlert};

pub const STARTUP_MESSAGE: &str =
    "🐋 *Whale Alerts Online*\n\nMonitoring Bittensor for large movements...\n\n_Powered by SubNavis.io_";

pub const NO_ACTIVITY_MESSAGE: &str = "🐋 *No major whale activity detected recently*";

const DIGEST_LIMIT: usize = 5;
const PORTFOLIO_POSITIONS_LIMIT: usize = 5;

fn kind_emoji(kind: &TxKind) -> &'static str {
    match kind {
        TxKind::Stake => "🟢",
        TxKind::Unstake => "🔴",
        TxKind::Transfer => "🔵",
        TxKind::Other(_) => "⚪",
    }
}

fn subnet_suffix(subnet: Option<u16>) -> String {
    subnet.map(|id| format!(" on SN{id}")).unwrap_or_default()
}

fn price_line(usd: Decimal) -> String {
    if usd.is_zero() {
        "unknown".to_string()
    } else {
        format!("${}", format_grouped(usd, 2))
    }
}

/// Render a single channel alert (Telegram Markdown).
pub fn render(alert: &WhaleAlert) -> String {
    format!(
        "{emoji} *{badge} {action}*{subnet}\n\
         \n\
         💰 *{amount} τ* (~${usd})\n\
         \n\
         📊 TAO Price: {price}\n\
         ⏰ {time}\n\
         \n\
         #Bittensor #TAO #WhaleAlert",
        emoji = kind_emoji(&alert.kind),
        badge = alert.tier.badge(),
        action = alert.action,
        subnet = subnet_suffix(alert.subnet),
        amount = format_grouped(alert.amount, 0),
        usd = format_grouped(alert.usd_value, 0),
        price = price_line(alert.price_usd),
        time = alert.timestamp.format("%H:%M UTC"),
    )
}

/// Summary of the most recent whale movements, sent to a single chat on request.
pub fn render_digest(alerts: &[WhaleAlert], quote: &PriceQuote) -> String {
    if alerts.is_empty() {
        return NO_ACTIVITY_MESSAGE.to_string();
    }

    let mut text = String::from("🐋 *Latest Whale Activity*\n\n");

    for alert in alerts.iter().take(DIGEST_LIMIT) {
        let label = match &alert.kind {
            TxKind::Stake => "Stake".to_string(),
            TxKind::Unstake => "Unstake".to_string(),
            TxKind::Transfer => "Transfer".to_string(),
            TxKind::Other(raw) => raw.clone(),
        };
        text.push_str(&format!(
            "{} *{}*{}\n└ {} τ (~${})\n\n",
            kind_emoji(&alert.kind),
            label,
            subnet_suffix(alert.subnet),
            format_grouped(alert.amount, 0),
            format_grouped(alert.usd_value, 0),
        ));
    }

    text.push_str(&format!("_TAO: {}_", price_line(quote.usd)));
    text
}

/// Wallet overview for the conversational front end.
pub fn render_portfolio(
    balance: &WalletBalance,
    stakes: &[StakePosition],
    quote: &PriceQuote,
    now: DateTime<Utc>,
) -> String {
    let total_usd = balance.balance * quote.usd;
    let staked_pct = if balance.balance.is_zero() {
        Decimal::ZERO
    } else {
        balance.stake / balance.balance * Decimal::ONE_HUNDRED
    };

    let mut text = format!(
        "💼 *Your Portfolio*\n\n\
         📍 Wallet: `{wallet}`\n\n\
         ━━━━━━━━━━━━━━━\n\
         💰 *Total Balance:* {total} τ (~${total_usd})\n\
         📊 *Staked:* {staked} τ ({staked_pct}%)\n\
         🆓 *Free:* {free} τ\n\
         ━━━━━━━━━━━━━━━\n\n\
         📈 *Positions:*\n",
        wallet = short_wallet(&balance.address),
        total = format_grouped(balance.balance, 2),
        total_usd = format_grouped(total_usd, 0),
        staked = format_grouped(balance.stake, 2),
        staked_pct = format_grouped(staked_pct, 0),
        free = format_grouped(balance.free, 2),
    );

    if stakes.is_empty() {
        text.push_str("\n_No active stakes_\n");
    } else {
        for stake in stakes.iter().take(PORTFOLIO_POSITIONS_LIMIT) {
            let subnet = stake
                .subnet_id
                .map(|id| format!("SN{id}"))
                .unwrap_or_else(|| "SN?".into());
            text.push_str(&format!(
                "\n*{subnet}*\n├ Staked: {} τ\n└ Value: ${}\n",
                format_grouped(stake.stake, 2),
                format_grouped(stake.stake * quote.usd, 0),
            ));
        }
    }

    let change = quote
        .change_24h_percent
        .round_dp_with_strategy(1, RoundingStrategy::MidpointNearestEven);
    let sign = if change.is_sign_negative() { "" } else { "+" };
    text.push_str(&format!(
        "\n━━━━━━━━━━━━━━━\n_TAO: {} ({sign}{change:.1}% 24h)_\n_Updated: {}_\n",
        price_line(quote.usd),
        now.format("%H:%M UTC"),
    ));

    text
}

/// `5F3sa2TJAWMq...YjQX` style, keeping the first 8 and last 6 characters.
fn short_wallet(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 14 {
        return address.to_string();
    }
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 6..].iter().collect();
    format!("{head}...{tail}")
}

/// Round half-to-even to `dp` places and group the integer part with commas.
///
/// `format_grouped(1234567.891, 0)` → `1,234,568`
pub fn format_grouped(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven);
    let text = format!("{:.*}", dp as usize, rounded.abs());

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    grouped
}
