pub mod config;
pub mod usage;

pub use config::{AppConfig, Credentials};
pub use usage::{
    EventRow, FilteredUsageRequest, FilteredUsageResponse, SpendSnapshot, UsageResponse,
    UsageSnapshot, UsageSummaryResponse,
};
