//! RPC Block Meta Fetcher
//!
//! Implements `BlockMetaFetcher` by asking the node's JSON-RPC `block`
//! method for blocks that fell out of (or never entered) the cache.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::{nanos_to_time, BlockMeta, FetchError};
use crate::ports::outbound::BlockMetaFetcher;

/// RPC error name the node uses for unknown blocks.
const UNKNOWN_BLOCK: &str = "UNKNOWN_BLOCK";

/// JSON-RPC backed block metadata fetcher.
#[derive(Debug, Clone)]
pub struct RpcBlockMetaFetcher {
    /// Node RPC URL (e.g., "http://localhost:3030").
    url: String,
    /// HTTP client with the request timeout applied.
    client: reqwest::Client,
}

impl RpcBlockMetaFetcher {
    /// Create a fetcher for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError(format!("building rpc client: {e}")))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Node RPC URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl BlockMetaFetcher for RpcBlockMetaFetcher {
    async fn fetch(&self, id: &str) -> Result<Option<BlockMeta>, FetchError> {
        debug!(block_id = %id, url = %self.url, "fetching block meta over rpc");

        let body = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": "block",
            "params": { "block_id": id },
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError(format!("rpc request: {e}")))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError(format!("rpc response body: {e}")))?;

        parse_block_response(id, &bytes)
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<RpcBlock>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    header: RpcHeader,
}

#[derive(Debug, Deserialize)]
struct RpcHeader {
    hash: String,
    height: u64,
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    cause: Option<RpcErrorCause>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorCause {
    name: String,
}

/// Map a JSON-RPC `block` response to block metadata.
///
/// `UNKNOWN_BLOCK` errors are "not found"; any other RPC error is a failure.
pub fn parse_block_response(id: &str, body: &[u8]) -> Result<Option<BlockMeta>, FetchError> {
    let response: RpcResponse = serde_json::from_slice(body)
        .map_err(|e| FetchError(format!("decoding rpc response for {id}: {e}")))?;

    if let Some(error) = response.error {
        let cause = error.cause.map(|c| c.name).unwrap_or_default();
        if cause == UNKNOWN_BLOCK {
            return Ok(None);
        }
        return Err(FetchError(format!(
            "rpc error for {id}: {} {cause}",
            error.message
        )));
    }

    let Some(block) = response.result else {
        return Err(FetchError(format!("rpc response for {id} has no result")));
    };

    let header = block.header;
    Ok(Some(BlockMeta::new(
        header.hash,
        header.height,
        nanos_to_time(header.timestamp),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_result() {
        let body = br#"{
            "jsonrpc": "2.0",
            "id": "dontcare",
            "result": {
                "author": "node0",
                "header": {
                    "hash": "7nsuuitwS7xcdGnD9JgrE22cRB2vf2VS4yh1N9S71F4d",
                    "height": 17821130,
                    "timestamp": 1595350551591948000,
                    "prev_hash": "ignored"
                }
            }
        }"#;

        let meta = parse_block_response("x", body).unwrap().unwrap();
        assert_eq!(meta.id, "7nsuuitwS7xcdGnD9JgrE22cRB2vf2VS4yh1N9S71F4d");
        assert_eq!(meta.height, 17821130);
        assert_eq!(meta.observed_at.timestamp(), 1595350551);
    }

    #[test]
    fn test_parse_unknown_block_is_not_found() {
        let body = br#"{
            "jsonrpc": "2.0",
            "id": "dontcare",
            "error": {
                "name": "HANDLER_ERROR",
                "cause": { "name": "UNKNOWN_BLOCK", "info": {} },
                "code": -32000,
                "message": "Server error"
            }
        }"#;

        assert_eq!(parse_block_response("x", body), Ok(None));
    }

    #[test]
    fn test_parse_other_error_fails() {
        let body = br#"{
            "jsonrpc": "2.0",
            "id": "dontcare",
            "error": { "code": -32000, "message": "Server error", "cause": { "name": "INTERNAL_ERROR" } }
        }"#;

        let err = parse_block_response("x", body).unwrap_err();
        assert!(err.to_string().contains("INTERNAL_ERROR"));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_block_response("x", b"not json").is_err());
    }

    #[test]
    fn test_new_keeps_url() {
        let fetcher =
            RpcBlockMetaFetcher::new("http://localhost:3030", Duration::from_secs(1)).unwrap();
        assert_eq!(fetcher.url(), "http://localhost:3030");
    }
}
