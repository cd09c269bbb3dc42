//! GeoIP lookup via an external HTTP API (ip-api.com by default)
//!
//! Built-in moka cache with singleflight semantics: concurrent lookups
//! for one IP issue a single HTTP request. Lookups never fail a request;
//! any error degrades to None.

use std::sync::OnceLock;
use std::time::Duration;

use moka::future::Cache;
use tracing::{trace, warn};
use ureq::Agent;

use crate::utils::ip::is_private_or_local;

const GEOIP_CACHE_TTL_SECS: u64 = 15 * 60;
const GEOIP_CACHE_MAX_CAPACITY: u64 = 10_000;
const HTTP_TIMEOUT_SECS: u64 = 2;

static HTTP_AGENT: OnceLock<Agent> = OnceLock::new();

fn get_agent() -> &'static Agent {
    HTTP_AGENT.get_or_init(|| {
        Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(HTTP_TIMEOUT_SECS)))
            .build()
            .into()
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoInfo {
    pub country: Option<String>,
    pub city: Option<String>,
}

pub struct GeoIpService {
    api_url_template: String,
    /// IP to GeoInfo cache; None entries are negative caching
    cache: Cache<String, Option<GeoInfo>>,
}

impl GeoIpService {
    /// `api_url_template` uses `{ip}` as the placeholder, e.g.
    /// `http://ip-api.com/json/{ip}?fields=status,country,city`
    pub fn new(api_url_template: &str) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(GEOIP_CACHE_TTL_SECS))
            .max_capacity(GEOIP_CACHE_MAX_CAPACITY)
            .build();

        Self {
            api_url_template: api_url_template.to_string(),
            cache,
        }
    }

    pub async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        // Private and loopback addresses never resolve
        if let Ok(addr) = ip.parse::<std::net::IpAddr>() {
            if is_private_or_local(&addr) {
                return None;
            }
        }

        let ip_key = ip.to_string();

        // get_with deduplicates concurrent fetches for the same key
        self.cache
            .get_with(ip_key, async {
                trace!("GeoIP cache miss for {}, fetching from API", ip);
                self.fetch_from_api(ip).await
            })
            .await
    }

    async fn fetch_from_api(&self, ip: &str) -> Option<GeoInfo> {
        let url = self.api_url_template.replace("{ip}", ip);

        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(url))
            .await
            .unwrap_or_else(|e| {
                warn!("GeoIP spawn_blocking failed: {}", e);
                None
            })
    }

    /// Synchronous fetch, called inside spawn_blocking
    fn fetch_from_api_sync(url: String) -> Option<GeoInfo> {
        let agent = get_agent();

        let resp = match agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("GeoIP API request to \"{}\" failed: {}", url, e);
                return None;
            }
        };

        let json: serde_json::Value = match resp.into_body().read_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("GeoIP API response from \"{}\" parse failed: {}", url, e);
                return None;
            }
        };

        if json["status"].as_str() == Some("fail") {
            trace!("GeoIP API returned fail status");
            return None;
        }

        let country = json["country"]
            .as_str()
            .or_else(|| json["countryCode"].as_str())
            .map(String::from);

        let city = json["city"].as_str().map(String::from);

        trace!("GeoIP lookup: country={:?}, city={:?}", country, city);

        Some(GeoInfo { country, city })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Needs outbound network, may fail in CI
    #[tokio::test]
    #[ignore]
    async fn test_lookup_public_ip() {
        let service = GeoIpService::new("http://ip-api.com/json/{ip}?fields=status,country,city");

        let result = service.lookup("8.8.8.8").await;
        assert!(result.is_some());

        // Second lookup hits the cache
        let cached = service.lookup("8.8.8.8").await;
        assert_eq!(result, cached);
    }

    #[tokio::test]
    async fn test_private_ip_skipped() {
        let service = GeoIpService::new("http://ip-api.com/json/{ip}?fields=status,country,city");
        assert!(service.lookup("192.168.1.1").await.is_none());
        assert!(service.lookup("127.0.0.1").await.is_none());
    }
}
