//! Human-readable summaries of a scan's signals.

use std::fmt::Write;

use crate::models::Signal;

const EMPTY: &str = "Scan complete: no setups matched";

/// Enough decimals to keep sub-cent contracts readable.
pub fn price(value: f64) -> String {
    if value.abs() >= 1.0 {
        format!("{value:.4}")
    } else {
        format!("{value:.8}")
    }
}

/// HTML variant for chat clients (Telegram parse mode).
pub fn html(signals: &[Signal]) -> String {
    if signals.is_empty() {
        return EMPTY.to_string();
    }

    let mut out = format!("<b>Found {} setup(s)</b>\n\n", signals.len());
    for (i, s) in signals.iter().enumerate() {
        let _ = writeln!(out, "<b>{}. {} ({})</b>", i + 1, s.symbol, s.direction);
        let _ = writeln!(out, "   Entry: <code>{}</code>", price(s.entry_price));
        let _ = writeln!(out, "   Stop: <code>{}</code>", price(s.stop_loss));
        let _ = writeln!(out, "   Target: <code>{}</code>", price(s.take_profit));
        out.push('\n');
    }
    out
}

pub fn plain(signals: &[Signal]) -> String {
    if signals.is_empty() {
        return EMPTY.to_string();
    }

    let mut out = format!("Found {} setup(s):\n\n", signals.len());
    for (i, s) in signals.iter().enumerate() {
        let _ = writeln!(out, "{}. {} ({})", i + 1, s.symbol, s.direction);
        let _ = writeln!(out, "   Entry: {}", price(s.entry_price));
        let _ = writeln!(out, "   Stop: {}", price(s.stop_loss));
        let _ = writeln!(out, "   Target: {}", price(s.take_profit));
        out.push('\n');
    }
    out
}
