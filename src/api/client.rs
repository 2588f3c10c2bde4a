use std::time::Duration;

use anyhow::anyhow;
use reqwest::{Client, Url};

use crate::prelude::*;

/// Build a default client.
pub fn try_new() -> Result<Client> {
    Ok(Client::builder().timeout(Duration::from_secs(10)).build()?)
}

/// Append the `segment` to the base URL path.
///
/// Unlike [`Url::join`], keeps the last segment of a base path without a trailing slash.
pub fn endpoint(base_url: &Url, segment: &str) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow!("`{base_url}` cannot be used as a base URL"))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint_of(base_url: &str) -> String {
        endpoint(&base_url.parse().unwrap(), "predictions").unwrap().to_string()
    }

    #[test]
    fn endpoint_ok() {
        assert_eq!(endpoint_of("http://localhost:5002"), "http://localhost:5002/predictions");
        assert_eq!(endpoint_of("http://localhost:5002/"), "http://localhost:5002/predictions");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        assert_eq!(endpoint_of("http://host/api"), "http://host/api/predictions");
        assert_eq!(endpoint_of("http://host/api/"), "http://host/api/predictions");
    }

    #[test]
    fn endpoint_cannot_be_base() {
        assert!(endpoint(&"mailto:grid@example.com".parse().unwrap(), "submissions").is_err());
    }
}
