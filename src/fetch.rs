/*
 * Copyright 2019-2021 Wren Powell
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Downloading archives which are only trusted once their digest is verified.

use std::future::Future;
use std::pin::Pin;

use sha2::{Digest, Sha256};

use crate::message::MessageLog;

/// The archive of the freely distributed demo version of the game.
pub const DEMO_URL: &str =
    "https://archive.org/download/HeroesofMightandMagicIITheSuccessionWars_1020/h2demo.zip";

/// The URL the demo archive is actually downloaded from, which adds CORS headers.
pub const DEMO_DOWNLOAD_URL: &str = "https://corsproxy.io/?url=https://archive.org/download/HeroesofMightandMagicIITheSuccessionWars_1020/h2demo.zip";

/// The hex-encoded SHA-256 digest of the demo archive.
pub const DEMO_SHA256: &str = "12048c8b03875c81e69534a3813aaf6340975e77b762dc1b79a4ff5514240e3c";

/// A future which resolves to a downloaded blob.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<Vec<u8>>> + Send + 'a>>;

/// Something which can download a blob from a URL.
pub trait Fetcher: Send + Sync {
    /// Download the whole blob at `url`.
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a>;
}

/// A [`Fetcher`] which downloads over HTTP.
#[cfg(feature = "fetch")]
#[cfg_attr(docsrs, doc(cfg(feature = "fetch")))]
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "fetch")]
impl HttpFetcher {
    /// Create a fetcher which uses `client`.
    pub fn new(client: reqwest::Client) -> Self {
        HttpFetcher { client }
    }
}

#[cfg(feature = "fetch")]
impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let response = self.client.get(url).send().await?.error_for_status()?;
            Ok(response.bytes().await?.to_vec())
        })
    }
}

/// Return the hex-encoded SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Download the blob at `url` and return it only if its SHA-256 digest is `expected`.
///
/// # Errors
/// - `Error::Fetch`: The download failed.
/// - `Error::HashMismatch`: The blob does not have the expected digest.
pub async fn fetch_verified(
    fetcher: &dyn Fetcher,
    url: &str,
    expected: &str,
    messages: &MessageLog,
) -> crate::Result<Vec<u8>> {
    messages.info(format!(
        "Fetching data from [{}]\nExpected hash is [{}]",
        url, expected
    ));

    let data = fetcher.fetch(url).await.map_err(|error| {
        messages.warn(format!("Download failed: {}", error));
        crate::Error::Fetch(error)
    })?;

    messages.info("Checking hash...");
    let actual = sha256_hex(&data);
    if !actual.eq_ignore_ascii_case(expected) {
        messages.warn("Bad hash");
        return Err(crate::Error::HashMismatch {
            expected: expected.to_owned(),
            actual,
        });
    }

    messages.info("Hash is ok... Initializing.");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    struct StaticFetcher(Option<Vec<u8>>);

    impl Fetcher for StaticFetcher {
        fn fetch<'a>(&'a self, _url: &'a str) -> FetchFuture<'a> {
            let result = self.0.clone().ok_or_else(|| anyhow!("Connection refused"));
            Box::pin(async move { result })
        }
    }

    #[test]
    fn digest_of_empty_blob() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn matching_digest_returns_blob() {
        let fetcher = StaticFetcher(Some(b"abc".to_vec()));
        let expected = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";

        let data = fetch_verified(&fetcher, DEMO_URL, expected, &MessageLog::default())
            .await
            .unwrap();
        assert_eq!(data, b"abc");
    }

    #[tokio::test]
    async fn mismatched_digest_is_rejected() {
        let fetcher = StaticFetcher(Some(b"not the demo".to_vec()));
        let messages = MessageLog::default();

        let result = fetch_verified(&fetcher, DEMO_URL, DEMO_SHA256, &messages).await;
        assert!(matches!(result, Err(crate::Error::HashMismatch { .. })));
        assert!(messages.contains("Bad hash"));
    }

    #[tokio::test]
    async fn failed_download_is_reported() {
        let fetcher = StaticFetcher(None);
        let result = fetch_verified(&fetcher, DEMO_URL, DEMO_SHA256, &MessageLog::default()).await;
        assert!(matches!(result, Err(crate::Error::Fetch(_))));
    }
}
