//! Plain-text rendering of an analysis result

use crate::price_action::{PriceActionResult, Setup};
use std::fmt::{self, Write};

fn price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn levels(values: &[f64]) -> String {
    if values.is_empty() {
        return "-".to_string();
    }
    values.iter().map(|v| format!("{:.2}", v)).collect::<Vec<_>>().join(" / ")
}

fn setup_line(setup: &Setup) -> String {
    format!(
        "  [{}] {} {} | entry {} stop {} target {} | {}",
        setup.confidence,
        setup.setup_type,
        setup.direction,
        price(setup.entry),
        price(setup.stop),
        price(setup.target_1),
        setup.trigger
    )
}

/// Human-readable report for one symbol
pub fn render(symbol: &str, result: &PriceActionResult) -> String {
    let mut out = String::new();
    // fmt::Write into a String never fails
    write_report(&mut out, symbol, result).ok();
    out
}

fn write_report(out: &mut String, symbol: &str, result: &PriceActionResult) -> fmt::Result {
    let m = &result.context.metrics;
    let kl = &result.key_levels;
    let decision = result.decision();

    writeln!(out, "=== {} ===", symbol)?;
    writeln!(out, "Regime: {} / {}", result.market_type, result.direction)?;
    writeln!(
        out,
        "ATR {:.2} | slope/ATR {:+.3} | body/range {:.2} | MA crosses {} | spike {}",
        m.atr,
        m.slope_norm,
        m.body_to_range,
        m.ma_crosses,
        if m.has_spike { "yes" } else { "no" }
    )?;
    if let Some(bias) = m.ma_bias {
        writeln!(out, "Close vs MA: {:+.2}%", bias)?;
    }

    writeln!(out, "Resistance: {}", levels(&kl.swing_resistance))?;
    writeln!(out, "Support:    {}", levels(&kl.swing_support))?;
    writeln!(
        out,
        "Measured move: leg {:.2} -> up {:.2} / down {:.2}",
        kl.measured_move.leg, kl.measured_move.target_up, kl.measured_move.target_down
    )?;

    if result.setups.is_empty() {
        writeln!(out, "Setups: none")?;
    } else {
        writeln!(out, "Setups:")?;
        for setup in &result.setups {
            writeln!(out, "{}", setup_line(setup))?;
        }
    }

    for invalidation in &result.invalidations {
        writeln!(out, "Invalidation: {}", invalidation)?;
    }

    let verdict = if decision.allow_trade { "TRADE ALLOWED" } else { "NO TRADE (research only)" };
    writeln!(out, "Decision: {} - {}", verdict, decision.reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price_action::{fixtures, run};

    #[test]
    fn test_render_range_with_setup() {
        let result = run(&fixtures::failed_breakout_high()).unwrap();
        let text = render("TEST", &result);

        assert!(text.starts_with("=== TEST ==="));
        assert!(text.contains("Regime: TradingRange / Neutral"));
        assert!(text.contains("[medium] FailedBreakout Bear"));
        assert!(text.contains("entry 100.20"));
        assert!(text.contains("Invalidation: two or more strong trend bars"));
        assert!(text.contains("TRADE ALLOWED"));
    }

    #[test]
    fn test_render_without_setups() {
        let result = run(&fixtures::sideways(60)).unwrap();
        let text = render("FLAT", &result);

        assert!(text.contains("Setups: none"));
        assert!(text.contains("NO TRADE (research only)"));
    }

    #[test]
    fn test_render_trend_block_order() {
        let result = run(&fixtures::uptrend_with_pullbacks(58)).unwrap();
        let text = render("UP", &result);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "=== UP ===");
        assert_eq!(lines[1], "Regime: Trend / Bull");
        assert!(lines.iter().any(|l| l.starts_with("Close vs MA: +")));
        assert!(lines.iter().any(|l| l.starts_with("  [medium] H1 Bull")));
        assert!(lines.last().unwrap().starts_with("Decision: TRADE ALLOWED"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_price_formatting() {
        assert_eq!(price(None), "-");
        assert_eq!(price(Some(1.234)), "1.23");
        assert_eq!(levels(&[]), "-");
        assert_eq!(levels(&[1.0, 2.5]), "1.00 / 2.50");
    }
}
