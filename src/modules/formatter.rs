//! Fixed-width text rendering for the tray title and menu rows.
//!
//! Everything here is pure; the menu font is proportional, so column widths
//! are padded generously and must stay stable between refreshes.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{EventRow, SpendSnapshot, UsageSnapshot};

pub const BAR_WIDTH: usize = 20;
pub const EVENT_SLOTS: usize = 10;

pub const TITLE_LOADING: &str = "...";
pub const TITLE_ERROR: &str = "!";
pub const EMPTY_SLOT: &str = "---";

const WARN_PERCENT: i64 = 90;
const FILLED: &str = "●";
const UNFILLED: &str = "○";

/// floor(used * 100 / limit), clamped to [0, 100]; 0 when there is no limit
pub fn percentage(used: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (used.saturating_mul(100) / limit).clamp(0, 100)
}

/// Always exactly `width` glyphs
pub fn progress_bar(current: i64, max: i64, width: usize) -> String {
    if max <= 0 {
        return UNFILLED.repeat(width);
    }

    let filled = (current.saturating_mul(width as i64) / max).clamp(0, width as i64) as usize;
    format!("{}{}", FILLED.repeat(filled), UNFILLED.repeat(width - filled))
}

pub fn tray_title(percent: i64) -> String {
    if percent >= WARN_PERCENT {
        format!("⚠️{}%", percent)
    } else {
        format!("{}%", percent)
    }
}

pub fn request_usage_line(used: i64, limit: i64) -> String {
    format!("{}/{} = {}%", used, limit, percentage(used, limit))
}

pub fn reset_line(cycle_start: DateTime<Utc>) -> String {
    format!("Resets on {}", cycle_start.format("%b %-d, %Y"))
}

pub fn money_usage_line(spend: &SpendSnapshot) -> String {
    format!(
        "${:.2}/${:.0}",
        spend.cents_used as f64 / 100.0,
        spend.cents_limit as f64 / 100.0
    )
}

/// 999 -> "999", 1000 -> "1.0K", 1500000 -> "1.5M"
pub fn format_token_count(n: i64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

pub fn format_tokens(input: i64, output: i64) -> String {
    format!(
        "{} (IN) - (OUT) {}",
        format_token_count(input),
        format_token_count(output)
    )
}

/// Billing category of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Pro,
    Api,
    Abort,
    Other,
}

impl EventKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "USAGE_EVENT_KIND_INCLUDED_IN_PRO" => EventKind::Pro,
            "USAGE_EVENT_KIND_USER_API_KEY" => EventKind::Api,
            "USAGE_EVENT_KIND_ABORTED_NOT_CHARGED" => EventKind::Abort,
            other if other.contains("PRO") => EventKind::Pro,
            other if other.contains("API") => EventKind::Api,
            _ => EventKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Pro => "Pro",
            EventKind::Api => "API",
            EventKind::Abort => "Abort",
            EventKind::Other => "Other",
        }
    }
}

const MODEL_MAX_CHARS: usize = 15;

/// Alias for well-known model ids; anything else is cut to 15 characters
pub fn shorten_model(model: &str) -> String {
    let alias = match model {
        "claude-4.5-sonnet-thinking" | "claude-4.5-sonnet" => Some("claude-sonnet"),
        "claude-4.5-opus-high-thinking" => Some("claude-opus"),
        "claude-4.5-haiku-thinking" => Some("claude-haiku"),
        "gemini-3-pro-preview" => Some("gemini-pro"),
        "gemini-3-flash-preview" => Some("gemini-flash"),
        "gpt-5.2" => Some("gpt-5.2"),
        "gpt-5.1-codex-max" => Some("gpt-codex"),
        "composer-1" => Some("composer"),
        "agent_review" => Some("agent"),
        _ => None,
    };

    match alias {
        Some(short) => short.to_string(),
        None => model.chars().take(MODEL_MAX_CHARS).collect(),
    }
}

/// One menu row: date, kind, model, tokens, request cost, dollar cost.
///
/// The date uses whatever offset `tz` had at the event's own instant.
pub fn format_event<Tz>(row: &EventRow, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let date = row.timestamp.with_timezone(tz).format("%m/%d %H:%M");

    format!(
        "{:<13}   {:<7}   {:<18}   {}   {:>5.0}   ${:.2}",
        date.to_string(),
        EventKind::from_code(&row.kind).label(),
        shorten_model(&row.model),
        format_tokens(row.input_tokens, row.output_tokens),
        row.requests_cost,
        row.cost_cents / 100.0,
    )
}

/// Exactly `EVENT_SLOTS` rows, padded with placeholders
pub fn event_slots<Tz>(rows: &[EventRow], tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    (0..EVENT_SLOTS)
        .map(|i| match rows.get(i) {
            Some(row) => format_event(row, tz),
            None => EMPTY_SLOT.to_string(),
        })
        .collect()
}

/// Title plus the three request-quota lines
#[derive(Debug, Clone, PartialEq)]
pub struct UsageLines {
    pub title: String,
    pub usage: String,
    pub bar: String,
    pub reset: String,
}

impl UsageLines {
    pub fn new(snapshot: &UsageSnapshot, default_limit: i64) -> Self {
        let limit = snapshot.limit_or(default_limit);
        Self {
            title: tray_title(percentage(snapshot.requests_used, limit)),
            usage: request_usage_line(snapshot.requests_used_total, limit),
            bar: progress_bar(snapshot.requests_used_total, limit, BAR_WIDTH),
            reset: reset_line(snapshot.billing_cycle_start),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpendLines {
    pub usage: String,
    pub bar: String,
}

impl SpendLines {
    pub fn new(spend: &SpendSnapshot) -> Self {
        Self {
            usage: money_usage_line(spend),
            bar: progress_bar(spend.cents_used, spend.cents_limit, BAR_WIDTH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Local};

    #[test]
    fn test_percentage_floors_and_stays_in_range() {
        for limit in [1, 7, 100, 500, 1337] {
            for used in 0..=limit {
                let p = percentage(used, limit);
                assert_eq!(p, used * 100 / limit);
                assert!((0..=100).contains(&p));
            }
        }
        assert_eq!(percentage(333, 500), 66);
    }

    #[test]
    fn test_zero_limit_is_empty() {
        assert_eq!(percentage(10, 0), 0);
        assert_eq!(progress_bar(10, 0, BAR_WIDTH), "○".repeat(20));
    }

    #[test]
    fn test_over_limit_is_clamped() {
        assert_eq!(percentage(900, 500), 100);
        assert_eq!(progress_bar(900, 500, BAR_WIDTH), "●".repeat(20));
    }

    #[test]
    fn test_progress_bar_width_is_constant() {
        for current in [-5, 0, 1, 249, 250, 499, 500, 10_000] {
            let bar = progress_bar(current, 500, BAR_WIDTH);
            assert_eq!(bar.chars().count(), BAR_WIDTH);
        }
        assert_eq!(progress_bar(250, 500, 4), "●●○○");
    }

    #[test]
    fn test_tray_title_warns_from_ninety_percent() {
        assert_eq!(tray_title(89), "89%");
        assert_eq!(tray_title(90), "⚠️90%");
    }

    #[test]
    fn test_token_abbreviation() {
        assert_eq!(format_token_count(999), "999");
        assert_eq!(format_token_count(1000), "1.0K");
        assert_eq!(format_token_count(12_340), "12.3K");
        assert_eq!(format_token_count(1_500_000), "1.5M");
        assert_eq!(format_tokens(0, 2048), "0 (IN) - (OUT) 2.0K");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            EventKind::from_code("USAGE_EVENT_KIND_INCLUDED_IN_PRO").label(),
            "Pro"
        );
        assert_eq!(
            EventKind::from_code("USAGE_EVENT_KIND_ABORTED_NOT_CHARGED"),
            EventKind::Abort
        );
        assert_eq!(EventKind::from_code("SOMETHING_API_NEW").label(), "API");
        assert_eq!(EventKind::from_code("SOMETHING_PRO_PLUS"), EventKind::Pro);
        assert_eq!(EventKind::from_code("USAGE_EVENT_KIND_ERRORED").label(), "Other");
    }

    #[test]
    fn test_model_mapping() {
        assert_eq!(shorten_model("composer-1"), "composer");
        assert_eq!(shorten_model("claude-4.5-sonnet-thinking"), "claude-sonnet");
        assert_eq!(shorten_model("abcdefghijklmnopqrst"), "abcdefghijklmno");
        assert_eq!(shorten_model("auto"), "auto");
    }

    #[test]
    fn test_money_line() {
        let spend = SpendSnapshot {
            cents_used: 1234,
            cents_limit: 5000,
        };
        assert_eq!(money_usage_line(&spend), "$12.34/$50");
        assert_eq!(SpendLines::new(&spend).bar, format!("{}{}", "●".repeat(4), "○".repeat(16)));
    }

    #[test]
    fn test_reset_line() {
        let start = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        assert_eq!(reset_line(start), "Resets on Jan 2, 2006");
    }

    #[test]
    fn test_event_row_layout() {
        let row = EventRow {
            timestamp: Utc.with_ymd_and_hms(2025, 11, 14, 9, 5, 0).unwrap(),
            kind: "USAGE_EVENT_KIND_USER_API_KEY".to_string(),
            model: "gpt-5.1-codex-max".to_string(),
            input_tokens: 15_300,
            output_tokens: 820,
            requests_cost: 2.0,
            cost_cents: 41.0,
        };
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(
            format_event(&row, &utc),
            "11/14 09:05     API       gpt-codex            15.3K (IN) - (OUT) 820       2   $0.41"
        );

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert!(format_event(&row, &plus_two).starts_with("11/14 11:05"));
    }

    #[test]
    fn test_event_dates_use_offset_at_each_instant() {
        let row_at = |timestamp: DateTime<Utc>| EventRow {
            timestamp,
            kind: String::new(),
            model: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            requests_cost: 0.0,
            cost_cents: 0.0,
        };
        // Either side of a northern-hemisphere daylight-saving change
        let winter = row_at(Utc.with_ymd_and_hms(2025, 11, 1, 16, 0, 0).unwrap());
        let summer = row_at(Utc.with_ymd_and_hms(2025, 7, 1, 16, 0, 0).unwrap());

        for row in [&winter, &summer] {
            let expected = Local
                .from_utc_datetime(&row.timestamp.naive_utc())
                .format("%m/%d %H:%M")
                .to_string();
            assert!(format_event(row, &Local).starts_with(&expected));
        }

        assert!(format_event(&winter, &Utc).starts_with("11/01 16:00"));
        let slots = event_slots(&[winter, summer], &Utc);
        assert!(slots[1].starts_with("07/01 16:00"));
    }

    #[test]
    fn test_event_slots_pad_and_truncate() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let row = EventRow {
            timestamp: Utc.with_ymd_and_hms(2025, 11, 14, 9, 5, 0).unwrap(),
            kind: String::new(),
            model: String::new(),
            input_tokens: 0,
            output_tokens: 0,
            requests_cost: 0.0,
            cost_cents: 0.0,
        };

        let slots = event_slots(&[row.clone()], &utc);
        assert_eq!(slots.len(), EVENT_SLOTS);
        assert_ne!(slots[0], EMPTY_SLOT);
        assert!(slots[1..].iter().all(|s| s == EMPTY_SLOT));

        let many = vec![row; 14];
        assert_eq!(event_slots(&many, &utc).len(), EVENT_SLOTS);
    }

    #[test]
    fn test_usage_lines_use_default_limit() {
        let snapshot = UsageSnapshot {
            requests_used: 460,
            requests_used_total: 470,
            requests_limit: None,
            billing_cycle_start: Utc.with_ymd_and_hms(2025, 11, 3, 10, 0, 0).unwrap(),
        };
        let lines = UsageLines::new(&snapshot, 500);
        assert_eq!(lines.title, "⚠️92%");
        assert_eq!(lines.usage, "470/500 = 94%");
        assert_eq!(lines.bar, format!("{}{}", "●".repeat(18), "○".repeat(2)));
        assert_eq!(lines.reset, "Resets on Nov 3, 2025");

        let custom = UsageLines::new(&snapshot, 1000);
        assert_eq!(custom.title, "46%");
    }
}
