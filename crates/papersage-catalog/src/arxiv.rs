//! arXiv export API client.

use std::time::Duration;

use papersage_core::{CatalogConfig, Error, Result};
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::atom::parse_feed;
use crate::types::{MetadataCatalog, PaperMetadata};

/// Blocking client for `export.arxiv.org/api/query`.
pub struct ArxivClient {
    client: Client,
    config: CatalogConfig,
}

/// One failed attempt; `retryable` is false for client errors and bad feeds.
struct Attempt {
    error: Error,
    retryable: bool,
}

impl ArxivClient {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Catalog(format!("failed to build HTTP client: {}", e)))?;
        info!("arXiv client ready: {}", config.base_url);
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    fn request_once(&self, ids: &[String]) -> std::result::Result<Vec<PaperMetadata>, Attempt> {
        let id_list = ids.join(",");
        let max_results = ids.len().to_string();
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("id_list", id_list.as_str()), ("max_results", max_results.as_str())])
            .send()
            .map_err(|e| Attempt {
                error: Error::Catalog(format!("arXiv request failed: {}", e)),
                retryable: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Attempt {
                error: Error::Catalog(format!("arXiv API returned status {}", status)),
                retryable: status.is_server_error(),
            });
        }

        let body = response.text().map_err(|e| Attempt {
            error: Error::Catalog(format!("failed to read arXiv response: {}", e)),
            retryable: true,
        })?;
        parse_feed(&body).map_err(|error| Attempt {
            error,
            retryable: false,
        })
    }
}

impl MetadataCatalog for ArxivClient {
    fn fetch_batch(&self, ids: &[String]) -> Result<Vec<PaperMetadata>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut attempt = 0u32;
        loop {
            // Exponential backoff delay (except first attempt)
            if attempt > 0 {
                let factor = 1u64 << (attempt - 1).min(16);
                let delay = self.config.retry_backoff_ms.saturating_mul(factor);
                std::thread::sleep(Duration::from_millis(delay));
            }

            match self.request_once(ids) {
                Ok(records) => {
                    debug!(
                        "arXiv returned {} records for {} ids (attempt {})",
                        records.len(),
                        ids.len(),
                        attempt + 1
                    );
                    return Ok(records);
                }
                Err(Attempt { error, retryable }) => {
                    if !retryable || attempt >= self.config.max_retries {
                        return Err(error);
                    }
                    warn!("arXiv fetch attempt {} failed, retrying: {}", attempt + 1, error);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const FEED: &str = include_str!("../tests/fixtures/arxiv_feed.xml");

    type RequestLog = Arc<parking_lot::Mutex<Vec<String>>>;

    /// Serve canned HTTP responses in order, one per connection.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>, RequestLog) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (hits_bg, requests_bg) = (hits.clone(), requests.clone());
        std::thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                requests_bg
                    .lock()
                    .push(request.lines().next().unwrap_or("").to_string());
                hits_bg.fetch_add(1, Ordering::SeqCst);
                let reply = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/atom+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(reply.as_bytes());
            }
        });
        (format!("http://{}/api/query", addr), hits, requests)
    }

    fn client(base_url: String) -> ArxivClient {
        ArxivClient::new(CatalogConfig {
            base_url,
            timeout_secs: 5,
            max_retries: 2,
            retry_backoff_ms: 1,
            ..CatalogConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_fetch_batch_parses_feed_and_sends_id_list() {
        let (url, hits, requests) = serve(vec![(200, FEED)]);
        let records = client(url)
            .fetch_batch(&["1706.03762".to_string(), "1810.04805".to_string()])
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let line = requests.lock()[0].clone();
        assert!(line.contains("id_list=1706.03762%2C1810.04805"), "{}", line);
        assert!(line.contains("max_results=2"), "{}", line);
    }

    #[test]
    fn test_server_error_is_retried() {
        let (url, hits, _) = serve(vec![(503, "busy"), (200, FEED)]);
        let records = client(url).fetch_batch(&["1706.03762".to_string()]).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_client_error_is_not_retried() {
        let (url, hits, _) = serve(vec![(400, "bad request"), (200, FEED)]);
        let err = client(url).fetch_batch(&["x".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Catalog(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retries_are_bounded() {
        let (url, hits, _) = serve(vec![(500, "a"), (500, "b"), (500, "c"), (200, FEED)]);
        assert!(client(url).fetch_batch(&["1706.03762".to_string()]).is_err());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_empty_batch_makes_no_request() {
        let client = client("http://127.0.0.1:9/unreachable".to_string());
        assert!(client.fetch_batch(&[]).unwrap().is_empty());
    }
}
