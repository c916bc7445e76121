use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Per-model request counters from `/api/usage`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelUsage {
    #[serde(default)]
    pub num_requests: i64,
    #[serde(default)]
    pub num_requests_total: i64,
    pub max_request_usage: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    #[serde(rename = "gpt-4", default)]
    pub gpt4: ModelUsage,
    #[serde(default)]
    pub start_of_month: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDemandUsage {
    #[serde(default)]
    pub used: i64,
    #[serde(default)]
    pub limit: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualUsage {
    #[serde(default)]
    pub on_demand: OnDemandUsage,
}

/// Billing summary from `/api/usage-summary`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummaryResponse {
    #[serde(default)]
    pub individual_usage: IndividualUsage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: i64,
    #[serde(default)]
    pub output_tokens: i64,
    #[serde(default)]
    pub total_cents: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageEvent {
    /// Epoch milliseconds, transmitted as a string
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub requests_costs: f64,
    pub token_usage: Option<TokenUsage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredUsageResponse {
    #[serde(default)]
    pub usage_events_display: Vec<UsageEvent>,
}

/// Body of the filtered usage events query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredUsageRequest {
    pub start_date: String,
    pub end_date: String,
    pub page: u32,
    pub page_size: u32,
}

impl FilteredUsageRequest {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, page: u32, page_size: u32) -> Self {
        Self {
            start_date: start.timestamp_millis().to_string(),
            end_date: end.timestamp_millis().to_string(),
            page,
            page_size,
        }
    }
}

/// Request quota for the current billing cycle
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSnapshot {
    /// Drives the tray title
    pub requests_used: i64,
    /// Drives the detail line in the menu
    pub requests_used_total: i64,
    pub requests_limit: Option<i64>,
    pub billing_cycle_start: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn from_response(response: &UsageResponse, now: DateTime<Utc>) -> Self {
        let billing_cycle_start = DateTime::parse_from_rfc3339(&response.start_of_month)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| start_of_month(now));

        Self {
            requests_used: response.gpt4.num_requests,
            requests_used_total: response.gpt4.num_requests_total,
            requests_limit: response.gpt4.max_request_usage,
            billing_cycle_start,
        }
    }

    pub fn limit_or(&self, default_limit: i64) -> i64 {
        self.requests_limit.unwrap_or(default_limit)
    }
}

/// On-demand spend in cents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpendSnapshot {
    pub cents_used: i64,
    pub cents_limit: i64,
}

impl From<&UsageSummaryResponse> for SpendSnapshot {
    fn from(summary: &UsageSummaryResponse) -> Self {
        Self {
            cents_used: summary.individual_usage.on_demand.used,
            cents_limit: summary.individual_usage.on_demand.limit,
        }
    }
}

/// One billable event, reduced to what the menu shows
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub timestamp: DateTime<Utc>,
    pub kind: String,
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub requests_cost: f64,
    pub cost_cents: f64,
}

impl From<&UsageEvent> for EventRow {
    fn from(event: &UsageEvent) -> Self {
        // Unparsable timestamps fall back to the epoch
        let millis = event.timestamp.parse::<i64>().unwrap_or(0);
        let timestamp = DateTime::from_timestamp_millis(millis).unwrap_or_default();

        let (input_tokens, output_tokens, cost_cents) = event
            .token_usage
            .as_ref()
            .map(|t| (t.input_tokens, t.output_tokens, t.total_cents))
            .unwrap_or((0, 0, 0.0));

        Self {
            timestamp,
            kind: event.kind.clone(),
            model: event.model.clone(),
            input_tokens,
            output_tokens,
            requests_cost: event.requests_costs,
            cost_cents,
        }
    }
}

/// First instant of the month containing `now`, in UTC
pub fn start_of_month(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_snapshot_parses_cycle_start() {
        let response: UsageResponse = serde_json::from_str(
            r#"{
                "gpt-4": {"numRequests": 120, "numRequestsTotal": 130, "maxRequestUsage": null},
                "startOfMonth": "2025-11-03T10:00:00.000Z"
            }"#,
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap();
        let snapshot = UsageSnapshot::from_response(&response, now);

        assert_eq!(snapshot.requests_used, 120);
        assert_eq!(snapshot.requests_used_total, 130);
        assert_eq!(snapshot.requests_limit, None);
        assert_eq!(snapshot.limit_or(500), 500);
        assert_eq!(
            snapshot.billing_cycle_start,
            Utc.with_ymd_and_hms(2025, 11, 3, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_cycle_start_falls_back_to_month_start() {
        let response = UsageResponse::default();
        let now = Utc.with_ymd_and_hms(2025, 2, 17, 8, 30, 0).unwrap();
        let snapshot = UsageSnapshot::from_response(&response, now);
        assert_eq!(
            snapshot.billing_cycle_start,
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_event_row_without_token_usage() {
        let event: UsageEvent = serde_json::from_str(
            r#"{"timestamp": "1763200000000", "model": "auto", "kind": "USAGE_EVENT_KIND_INCLUDED_IN_PRO", "requestsCosts": 1}"#,
        )
        .unwrap();
        let row = EventRow::from(&event);
        assert_eq!(row.timestamp.timestamp_millis(), 1_763_200_000_000);
        assert_eq!(row.input_tokens, 0);
        assert_eq!(row.output_tokens, 0);
        assert_eq!(row.cost_cents, 0.0);
        assert_eq!(row.requests_cost, 1.0);
    }

    #[test]
    fn test_filtered_request_body() {
        let start = Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 11, 2, 0, 0, 0).unwrap();
        let body = serde_json::to_value(FilteredUsageRequest::new(start, end, 1, 10)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "startDate": "1761955200000",
                "endDate": "1762041600000",
                "page": 1,
                "pageSize": 10
            })
        );
    }
}
