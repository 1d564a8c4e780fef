//! I/O helpers: simulated latency and, with the `http` feature, plain
//! status-code fetching.

use crate::logging::get_logger;
use std::thread;
use std::time::{Duration, Instant};

/// Jitter applied around every simulated wait
pub const PRETEND_IO_JITTER: Duration = Duration::from_millis(20);

/// Sleep for about `duration` (± 20 ms of jitter) and return the time
/// actually spent.
pub fn pretend_io(duration: Duration) -> Duration {
    let start = Instant::now();
    let jitter_ms = PRETEND_IO_JITTER.as_secs_f64() * 1000.0;
    let offset_ms = (fastrand::f64() * 2.0 - 1.0) * jitter_ms;
    let target_ms = (duration.as_secs_f64() * 1000.0 + offset_ms).max(0.0);
    thread::sleep(Duration::from_secs_f64(target_ms / 1000.0));
    start.elapsed()
}

/// Lazily run [`pretend_io`] `count` times, yielding each elapsed time
pub fn iter_pretend_io(count: usize, duration: Duration) -> impl Iterator<Item = Duration> {
    (0..count).map(move |_| pretend_io(duration))
}

/// Run [`pretend_io`] `count` times back to back and log the total
pub fn serial_pretend_io(count: usize, duration: Duration) -> Vec<Duration> {
    let start = Instant::now();
    let out: Vec<Duration> = iter_pretend_io(count, duration).collect();
    get_logger("io").debug(format!(
        "serial_pretend_io count={} total_s={:.4}",
        count,
        start.elapsed().as_secs_f64()
    ));
    out
}

#[cfg(feature = "http")]
pub use http::{fetch_all_serial, fetch_url, iter_urls_serial, DEFAULT_TIMEOUT};

#[cfg(feature = "http")]
mod http {
    use crate::logging::get_logger;
    use std::thread;
    use std::time::Duration;

    /// Timeout used when none is given
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    const USER_AGENT: &str = concat!("concurrency-lab/", env!("CARGO_PKG_VERSION"));
    const RETRIES: u32 = 2;
    const BACKOFF: Duration = Duration::from_millis(200);
    const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

    fn client(timeout: Duration) -> reqwest::Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
    }

    /// GET `url` and return `(status, None)`, or `(0, Some(error))` when no
    /// response arrived. Retryable statuses are retried with backoff.
    pub fn fetch_url(url: &str, timeout: Duration) -> (u16, Option<String>) {
        let logger = get_logger("io");
        let client = match client(timeout) {
            Ok(client) => client,
            Err(e) => return (0, Some(e.to_string())),
        };

        let mut attempt = 0;
        loop {
            match client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < RETRIES && RETRY_STATUSES.contains(&status) {
                        attempt += 1;
                        thread::sleep(BACKOFF * attempt);
                        continue;
                    }
                    return (status, None);
                }
                Err(e) => {
                    let kind = if e.is_timeout() {
                        "Timeout"
                    } else if e.is_connect() {
                        "ConnectionError"
                    } else {
                        "RequestError"
                    };
                    logger.warning(format!("fetch_url_failed url={} err={}", url, kind));
                    return (0, Some(e.to_string()));
                }
            }
        }
    }

    /// Fetch every url in turn; returns `(url, status, error)` triples
    pub fn fetch_all_serial<'a>(
        urls: impl IntoIterator<Item = &'a str>,
        timeout: Duration,
    ) -> Vec<(String, u16, Option<String>)> {
        iter_urls_serial(urls, timeout).collect()
    }

    /// Lazy variant of [`fetch_all_serial`]
    pub fn iter_urls_serial<'a>(
        urls: impl IntoIterator<Item = &'a str>,
        timeout: Duration,
    ) -> impl Iterator<Item = (String, u16, Option<String>)> {
        urls.into_iter().map(move |url| {
            let (status, err) = fetch_url(url, timeout);
            (url.to_string(), status, err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretend_io_sleeps_about_duration() {
        let elapsed = pretend_io(Duration::from_millis(30));
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_pretend_io_zero_duration() {
        let elapsed = pretend_io(Duration::ZERO);
        assert!(elapsed < Duration::from_millis(500));
    }

    #[test]
    fn test_iter_pretend_io_yields_count() {
        let results: Vec<Duration> = iter_pretend_io(3, Duration::from_millis(10)).collect();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_serial_pretend_io() {
        assert_eq!(serial_pretend_io(2, Duration::from_millis(5)).len(), 2);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_fetch_url_unreachable() {
        // Port 9 on localhost is the discard port; nothing listens in CI.
        let (status, err) = fetch_url("http://127.0.0.1:9/", Duration::from_millis(500));
        assert_eq!(status, 0);
        assert!(err.is_some());
    }
}
