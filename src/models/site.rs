use serde::{Deserialize, Serialize};

use crate::models::generate_id;

/// A target site, keyed by its identifier (for example `ozon.ru`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchedSite {
    #[serde(default = "generate_id")]
    pub id: String,
    pub name: String,
}

impl WatchedSite {
    pub fn new(name: &str) -> Self {
        Self {
            id: generate_id(),
            name: normalize_site_name(name),
        }
    }
}

pub fn normalize_site_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_name_is_normalized() {
        let site = WatchedSite::new("  Ozon.RU ");
        assert_eq!(site.name, "ozon.ru");
    }

    #[test]
    fn test_legacy_json_without_id_gets_one() {
        let sites: Vec<WatchedSite> = serde_json::from_str(r#"[{"name": "ozon.ru"}]"#).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "ozon.ru");
        assert!(!sites[0].id.is_empty());
    }
}
