//! Cosmos block and transaction fetcher.
//!
//! Block headers come from CometBFT RPC (`/status`, `/block`); transactions
//! come from the Cosmos LCD (`/cosmos/tx/v1beta1/txs`), which renders every
//! message as JSON tagged with its `@type` URL.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use tacindex_core::error::IndexerError;
use tacindex_core::types::{BlockSummary, Coin, RawMsg, RawTx};

/// Trait for fetching chain data from a Cosmos node.
#[async_trait]
pub trait CosmosRpcClient: Send + Sync {
    /// Latest committed height.
    async fn latest_height(&self) -> Result<u64, IndexerError>;
    /// Block header at `height`; `None` if the node does not have it yet.
    async fn block(&self, height: u64) -> Result<Option<BlockSummary>, IndexerError>;
    /// All transactions included at `height`.
    async fn block_txs(&self, height: u64) -> Result<Vec<RawTx>, IndexerError>;
}

/// Fetcher that wraps a `CosmosRpcClient`.
pub struct CosmosFetcher<C> {
    client: C,
}

impl<C: CosmosRpcClient> CosmosFetcher<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub async fn latest_height(&self) -> Result<u64, IndexerError> {
        self.client.latest_height().await
    }

    pub async fn block(&self, height: u64) -> Result<Option<BlockSummary>, IndexerError> {
        self.client.block(height).await
    }

    /// Fetch the header and, when `with_txs` is set and the block is not
    /// empty, its transactions.
    pub async fn block_with_txs(
        &self,
        height: u64,
        with_txs: bool,
    ) -> Result<Option<(BlockSummary, Vec<RawTx>)>, IndexerError> {
        let Some(block) = self.client.block(height).await? else {
            return Ok(None);
        };
        if !with_txs || block.tx_count == 0 {
            return Ok(Some((block, vec![])));
        }

        let txs = self.client.block_txs(height).await?;
        if txs.len() != block.tx_count as usize {
            tracing::warn!(
                height,
                header_txs = block.tx_count,
                fetched = txs.len(),
                "transaction count differs from block header"
            );
        }
        Ok(Some((block, txs)))
    }
}

// ─── JSON helpers ─────────────────────────────────────────────────────────────

/// Parse a decimal string (`"123"`) or JSON number to u64.
pub fn parse_u64_str(v: &Value) -> Option<u64> {
    match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Unwrap a JSON-RPC envelope (`{"result": …}`); plain bodies pass through.
pub fn rpc_result(v: &Value) -> &Value {
    v.get("result").unwrap_or(v)
}

/// Latest height from a CometBFT `/status` response.
pub fn latest_height_from_json(v: &Value) -> Option<u64> {
    parse_u64_str(&rpc_result(v)["sync_info"]["latest_block_height"])
}

/// Convert a CometBFT `/block` response to `BlockSummary`.
pub fn block_from_json(v: &Value) -> Option<BlockSummary> {
    let result = rpc_result(v);
    let header = &result["block"]["header"];
    let time = header["time"].as_str()?;
    let timestamp = chrono::DateTime::parse_from_rfc3339(time)
        .ok()?
        .timestamp();

    Some(BlockSummary {
        height: parse_u64_str(&header["height"])?,
        hash: result["block_id"]["hash"].as_str()?.to_string(),
        parent_hash: header["last_block_id"]["hash"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        chain_id: header["chain_id"].as_str()?.to_string(),
        timestamp,
        proposer: header["proposer_address"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        tx_count: result["block"]["data"]["txs"]
            .as_array()
            .map(|a| a.len() as u32)
            .unwrap_or(0),
    })
}

// ─── LCD tx search response ───────────────────────────────────────────────────

/// One page of `GET /cosmos/tx/v1beta1/txs`.
#[derive(Debug, Deserialize)]
pub struct TxSearchPage {
    #[serde(default)]
    pub tx_responses: Vec<TxResponse>,
    /// Total matches across all pages (decimal string).
    #[serde(default)]
    pub total: Option<String>,
}

impl TxSearchPage {
    pub fn total(&self) -> Option<u64> {
        self.total.as_deref().and_then(|t| t.parse().ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct TxResponse {
    pub height: String,
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub gas_wanted: String,
    #[serde(default)]
    pub gas_used: String,
    pub tx: Value,
}

impl TxResponse {
    /// Convert to a `RawTx`, pulling messages, memo and fee out of the
    /// embedded `cosmos.tx.v1beta1.Tx`.
    pub fn into_raw(self) -> Result<RawTx, IndexerError> {
        let height = self.height.parse().map_err(|_| IndexerError::Decode {
            height: 0,
            reason: format!("tx {}: invalid height {:?}", self.txhash, self.height),
        })?;

        let body = &self.tx["body"];
        let messages = body["messages"]
            .as_array()
            .map(|msgs| msgs.iter().map(raw_msg_from_json).collect())
            .unwrap_or_default();

        let fee = self.tx["auth_info"]["fee"]["amount"]
            .as_array()
            .map(|coins| {
                coins
                    .iter()
                    .filter_map(|c| {
                        Some(Coin {
                            denom: c["denom"].as_str()?.to_string(),
                            amount: c["amount"].as_str()?.to_string(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(RawTx {
            hash: self.txhash,
            height,
            code: self.code,
            codespace: self.codespace,
            gas_wanted: self.gas_wanted.parse().unwrap_or(0),
            gas_used: self.gas_used.parse().unwrap_or(0),
            memo: body["memo"].as_str().unwrap_or_default().to_string(),
            fee,
            messages,
        })
    }
}

/// Split an LCD message (`{"@type": "/…", …fields}`) into type URL + value.
pub fn raw_msg_from_json(v: &Value) -> RawMsg {
    let mut value = v.clone();
    let type_url = value
        .as_object_mut()
        .and_then(|obj| obj.remove("@type"))
        .and_then(|t| t.as_str().map(str::to_string))
        .unwrap_or_default();
    RawMsg { type_url, value }
}

/// Parse a full tx search page into `RawTx`s.
pub fn txs_from_json(v: Value) -> Result<(Vec<RawTx>, Option<u64>), IndexerError> {
    let page: TxSearchPage = serde_json::from_value(v).map_err(|e| IndexerError::Decode {
        height: 0,
        reason: format!("invalid tx search response: {e}"),
    })?;
    let total = page.total();
    let txs = page
        .tx_responses
        .into_iter()
        .map(TxResponse::into_raw)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((txs, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn block_json() -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": -1,
            "result": {
                "block_id": { "hash": "9F86D081884C7D65" },
                "block": {
                    "header": {
                        "chain_id": "tacchain_239-1",
                        "height": "1200",
                        "time": "2025-06-01T12:00:00.5Z",
                        "last_block_id": { "hash": "0A1B2C3D" },
                        "proposer_address": "C0FFEE"
                    },
                    "data": { "txs": ["AAA=", "BBB="] }
                }
            }
        })
    }

    #[test]
    fn parse_u64_str_basic() {
        assert_eq!(parse_u64_str(&json!("123")), Some(123));
        assert_eq!(parse_u64_str(&json!(7)), Some(7));
        assert_eq!(parse_u64_str(&json!("0x1")), None);
        assert_eq!(parse_u64_str(&Value::Null), None);
    }

    #[test]
    fn block_header_parsed() {
        let block = block_from_json(&block_json()).unwrap();
        assert_eq!(block.height, 1200);
        assert_eq!(block.hash, "9F86D081884C7D65");
        assert_eq!(block.parent_hash, "0A1B2C3D");
        assert_eq!(block.chain_id, "tacchain_239-1");
        assert_eq!(block.proposer, "C0FFEE");
        assert_eq!(block.tx_count, 2);
        assert_eq!(block.timestamp, 1_748_779_200);
    }

    #[test]
    fn empty_block_has_zero_txs() {
        let mut v = block_json();
        v["result"]["block"]["data"]["txs"] = Value::Null;
        assert_eq!(block_from_json(&v).unwrap().tx_count, 0);
    }

    #[test]
    fn status_height_parsed() {
        let v = json!({ "result": { "sync_info": { "latest_block_height": "4242" } } });
        assert_eq!(latest_height_from_json(&v), Some(4242));
    }

    #[test]
    fn tx_page_parsed() {
        let page = json!({
            "tx_responses": [{
                "height": "1200",
                "txhash": "ABCDEF",
                "code": 0,
                "codespace": "",
                "gas_wanted": "200000",
                "gas_used": "150000",
                "tx": {
                    "@type": "/cosmos.tx.v1beta1.Tx",
                    "body": {
                        "messages": [
                            { "@type": "/cosmos.evm.vm.v1.MsgEthereumTx", "from": "0xabc" },
                            { "@type": "/cosmos.bank.v1beta1.MsgSend", "amount": [] }
                        ],
                        "memo": "hello"
                    },
                    "auth_info": { "fee": { "amount": [{ "denom": "utac", "amount": "5000" }] } }
                }
            }],
            "total": "1"
        });

        let (txs, total) = txs_from_json(page).unwrap();
        assert_eq!(total, Some(1));
        assert_eq!(txs.len(), 1);
        let tx = &txs[0];
        assert_eq!(tx.hash, "ABCDEF");
        assert_eq!(tx.height, 1200);
        assert_eq!(tx.gas_used, 150_000);
        assert_eq!(tx.memo, "hello");
        assert_eq!(tx.fee[0].denom, "utac");
        assert_eq!(tx.messages.len(), 2);
        assert_eq!(tx.messages[0].type_url, "/cosmos.evm.vm.v1.MsgEthereumTx");
        // the type tag is moved out of the value
        assert!(tx.messages[0].value.get("@type").is_none());
        assert_eq!(tx.messages[0].value["from"], "0xabc");
    }

    #[test]
    fn message_without_type_tag() {
        let msg = raw_msg_from_json(&json!({ "foo": 1 }));
        assert_eq!(msg.type_url, "");
        assert_eq!(msg.value["foo"], 1);
    }
}
