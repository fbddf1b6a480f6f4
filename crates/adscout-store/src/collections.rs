//! Collection names in the document store.

pub const USERS: &str = "users";
pub const CREATIVES: &str = "creatives";
pub const ALERTS: &str = "alerts";
pub const ALERT_TRIGGERS: &str = "alert_triggers";
pub const SCRAPING_JOBS: &str = "scraping_jobs";

pub const ALL: [&str; 5] = [USERS, CREATIVES, ALERTS, ALERT_TRIGGERS, SCRAPING_JOBS];
