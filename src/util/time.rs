use chrono::{TimeDelta, Utc};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Relative publish label for a card, e.g. "2小时前".
///
/// - under a minute (or in the future): "刚刚"
/// - under an hour: "N分钟前"
/// - under a day: "N小时前"
/// - under two days: "昨天"
/// - otherwise: "N天前"
pub fn relative_label(now_ms: i64, timestamp_ms: i64) -> String {
    let age = TimeDelta::milliseconds(now_ms.saturating_sub(timestamp_ms).max(-i64::MAX));

    if age < TimeDelta::minutes(1) {
        "刚刚".to_string()
    } else if age < TimeDelta::hours(1) {
        format!("{}分钟前", age.num_minutes())
    } else if age < TimeDelta::days(1) {
        format!("{}小时前", age.num_hours())
    } else if age < TimeDelta::days(2) {
        "昨天".to_string()
    } else {
        format!("{}天前", age.num_days())
    }
}
