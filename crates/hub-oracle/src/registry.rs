//! Oracle Registry (C6): single writer (the health poller), snapshot
//! readers everywhere else. `dashmap` is the teacher's own choice for this
//! shape in `http-rpc-gateway` — a sharded, lock-free-read map is a better
//! fit here than a `RwLock<HashMap<..>>` since reads vastly outnumber
//! writes (every oracle round vs. every orders round, estimate call, and
//! HTTP health handler).

use chrono::Utc;
use dashmap::DashMap;
use hub_types::OracleHealth;

pub struct OracleRegistry {
    health: DashMap<String, OracleHealth>,
}

impl OracleRegistry {
    /// Initial state: every configured oracle starts `down` (spec §4.6).
    pub fn new(urls: &[String]) -> Self {
        let health = DashMap::new();
        let now = Utc::now();
        for url in urls {
            health.insert(url.clone(), OracleHealth::unknown(url, now));
        }
        Self { health }
    }

    pub fn update(&self, url: &str, record: OracleHealth) {
        self.health.insert(url.to_string(), record);
    }

    pub fn get(&self, url: &str) -> Option<OracleHealth> {
        self.health.get(url).map(|entry| entry.value().clone())
    }

    pub fn list(&self) -> Vec<OracleHealth> {
        self.health.iter().map(|entry| entry.value().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_types::OracleStatus;

    #[test]
    fn starts_every_configured_oracle_down() {
        let registry = OracleRegistry::new(&["http://a".into(), "http://b".into()]);
        let list = registry.list();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|h| h.status == OracleStatus::Down));
    }

    #[test]
    fn update_overwrites_the_prior_record() {
        let registry = OracleRegistry::new(&["http://a".into()]);
        registry.update("http://a", OracleHealth::unknown("http://a", Utc::now()));
        assert!(registry.get("http://a").is_some());
        assert!(registry.get("http://missing").is_none());
    }
}
