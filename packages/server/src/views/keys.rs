//! Cache key families owned by the view counter.

pub const VIEWS_PREFIX: &str = "item-views:";
pub const CLIENT_PREFIX: &str = "item-client:";
pub const CONTENT_PREFIX: &str = "item-content:";

pub fn views_key(item_id: i64) -> String {
    format!("{VIEWS_PREFIX}{item_id}")
}

/// Dedup marker for one client viewing one item.
pub fn client_key(item_id: i64, client_id: &str) -> String {
    format!("{CLIENT_PREFIX}{item_id}_{client_id}")
}

pub fn content_key(item_id: i64) -> String {
    format!("{CONTENT_PREFIX}{item_id}")
}

/// Item id of a counter key, or `None` for keys outside the family.
pub fn parse_views_key(key: &str) -> Option<i64> {
    key.strip_prefix(VIEWS_PREFIX)?.parse().ok()
}
