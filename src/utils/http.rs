use std::time::Duration;

use reqwest::{Client, Proxy};
use tracing::debug;

use crate::error::{AppError, AppResult};

/// HTTP client with a request timeout, routed through `proxy_url` when one is set.
///
/// A malformed proxy is a config error rather than a silent direct connection.
pub fn create_client(timeout: Duration, proxy_url: Option<&str>) -> AppResult<Client> {
    let builder = Client::builder().timeout(timeout);

    let builder = match proxy_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let proxy = Proxy::all(url)
                .map_err(|e| AppError::Config(format!("Invalid proxy {}: {}", url, e)))?;
            debug!("Routing requests through proxy {}", url);
            builder.proxy(proxy)
        }
        None => builder,
    };

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_settings() {
        let timeout = Duration::from_secs(30);
        assert!(create_client(timeout, None).is_ok());
        assert!(create_client(timeout, Some("  ")).is_ok());
        assert!(create_client(timeout, Some("socks5://127.0.0.1:1080")).is_ok());

        let err = create_client(timeout, Some("http://127.0.0.1:notaport")).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
