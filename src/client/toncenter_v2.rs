use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::client::base::{ClientParams, HttpClient, HttpRequest, UreqClient};
use crate::client::error::{ProviderError, Result};
use crate::models::basic::StringOrInt;
use crate::models::stack::{StackValue, parse_response};
use crate::models::toncenter_v2::{
    AddressInformation, EstimateFeeParams, JsonRpcRequest, MasterchainInfo, RunGetMethodParams,
    RunGetMethodResult, SHARD_ID_ALL, SendQueryParams, StackArg, WalletInformation,
};
use crate::tvm::{Cell, boc_to_base64};

/// JSON-RPC provider for the toncenter v2 API
pub struct HttpProvider<C: HttpClient = UreqClient> {
    params: ClientParams,
    client: C,
}

impl HttpProvider<UreqClient> {
    pub fn new(params: ClientParams) -> Self {
        let timeout = Duration::from_secs(params.timeout.unwrap_or(5));
        Self {
            params,
            client: UreqClient::new(timeout),
        }
    }
}

impl Default for HttpProvider<UreqClient> {
    fn default() -> Self {
        Self::new(ClientParams::default())
    }
}

impl<C: HttpClient> HttpProvider<C> {
    pub fn with_client(params: ClientParams, client: C) -> Self {
        Self { params, client }
    }

    pub fn params(&self) -> &ClientParams {
        &self.params
    }

    fn build_request(&self, method: &str, params: Value) -> Result<HttpRequest> {
        let body = serde_json::to_string(&JsonRpcRequest::new(method, params))?;
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(api_key) = &self.params.api_key {
            headers.push(("X-API-Key".to_string(), api_key.clone()));
        }
        Ok(HttpRequest {
            url: self.params.url().to_string(),
            headers,
            body,
        })
    }

    async fn send_once<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T> {
        let response = self.client.post(request).await?;
        if response.status == 429 || response.status >= 500 {
            return Err(ProviderError::Status {
                status: response.status,
                body: response.body,
            });
        }

        let value: Value = serde_json::from_str(&response.body).map_err(|e| {
            if (200..300).contains(&response.status) {
                ProviderError::Json(e)
            } else {
                ProviderError::Status {
                    status: response.status,
                    body: response.body.clone(),
                }
            }
        })?;
        let Value::Object(mut object) = value else {
            return Err(ProviderError::InconsistentResponse);
        };
        if let Some(error) = object.remove("error") {
            let message = match error {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Err(ProviderError::Api(message));
        }
        let result = object
            .remove("result")
            .ok_or(ProviderError::InconsistentResponse)?;
        Ok(serde_json::from_value(result)?)
    }

    /// Calls a JSON-RPC method, retrying transient failures
    pub async fn send<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = self.build_request(method, params)?;
        let max_retries = self.params.max_retries.unwrap_or(0);
        let mut attempt = 0;
        loop {
            match self.send_once(request.clone()).await {
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    log::warn!(
                        "{} failed ({}), retry {}/{}",
                        method,
                        e,
                        attempt,
                        max_retries
                    );
                    tokio::time::sleep(Duration::from_millis(200 * attempt)).await;
                }
                result => return result,
            }
        }
    }

    pub async fn get_address_info(&self, address: &str) -> Result<AddressInformation> {
        self.send("getAddressInformation", json!({ "address": address }))
            .await
    }

    pub async fn get_extended_address_info(&self, address: &str) -> Result<Value> {
        self.send("getExtendedAddressInformation", json!({ "address": address }))
            .await
    }

    pub async fn get_wallet_info(&self, address: &str) -> Result<WalletInformation> {
        self.send("getWalletInformation", json!({ "address": address }))
            .await
    }

    /// Transactions of `address`, newest first; `limit` defaults to 20
    pub async fn get_transactions(
        &self,
        address: &str,
        limit: Option<u32>,
        lt: Option<&str>,
        hash: Option<&str>,
        to_lt: Option<&str>,
        archival: bool,
    ) -> Result<Vec<Value>> {
        let mut params = json!({
            "address": address,
            "limit": limit.unwrap_or(20),
            "archival": archival,
        });
        if let Some(lt) = lt {
            params["lt"] = json!(lt);
        }
        if let Some(hash) = hash {
            params["hash"] = json!(hash);
        }
        if let Some(to_lt) = to_lt {
            params["to_lt"] = json!(to_lt);
        }
        self.send("getTransactions", params).await
    }

    /// Balance in nanotons
    pub async fn get_balance(&self, address: &str) -> Result<u128> {
        let balance: StringOrInt = self
            .send("getAddressBalance", json!({ "address": address }))
            .await?;
        balance
            .as_u128()
            .ok_or(ProviderError::InconsistentResponse)
    }

    /// Sends a base64 encoded external message
    pub async fn send_boc(&self, boc: &str) -> Result<Value> {
        self.send("sendBoc", json!({ "boc": boc })).await
    }

    pub async fn send_boc_cell(&self, message: &Arc<Cell>) -> Result<Value> {
        let boc = boc_to_base64(message, false)?;
        self.send_boc(&boc).await
    }

    pub async fn get_estimate_fee(&self, query: &EstimateFeeParams) -> Result<Value> {
        self.send("estimateFee", serde_json::to_value(query)?).await
    }

    pub async fn send_query(&self, query: &SendQueryParams) -> Result<Value> {
        self.send("sendQuerySimple", serde_json::to_value(query)?)
            .await
    }

    /// Runs a get-method and returns the raw result
    pub async fn call(
        &self,
        address: &str,
        method: impl Into<StringOrInt>,
        stack: Vec<StackArg>,
    ) -> Result<RunGetMethodResult> {
        let params = RunGetMethodParams {
            address: address.to_string(),
            method: method.into(),
            stack,
        };
        self.send("runGetMethod", serde_json::to_value(&params)?)
            .await
    }

    /// Runs a get-method and decodes its stack
    pub async fn call2(
        &self,
        address: &str,
        method: impl Into<StringOrInt>,
        stack: Vec<StackArg>,
    ) -> Result<Vec<StackValue>> {
        let result = self.call(address, method, stack).await?;
        parse_response(&result)
    }

    pub async fn get_masterchain_info(&self) -> Result<MasterchainInfo> {
        self.send("getMasterchainInfo", json!({})).await
    }

    pub async fn get_block_shards(&self, masterchain_seqno: u32) -> Result<Value> {
        self.send("shards", json!({ "seqno": masterchain_seqno }))
            .await
    }

    pub async fn get_block_transactions(
        &self,
        workchain: i32,
        shard: &str,
        seqno: u32,
    ) -> Result<Value> {
        self.send(
            "getBlockTransactions",
            json!({ "workchain": workchain, "shard": shard, "seqno": seqno }),
        )
        .await
    }

    pub async fn get_masterchain_block_transactions(&self, seqno: u32) -> Result<Value> {
        self.get_block_transactions(-1, SHARD_ID_ALL, seqno).await
    }

    pub async fn get_block_header(&self, workchain: i32, shard: &str, seqno: u32) -> Result<Value> {
        self.send(
            "getBlockHeader",
            json!({ "workchain": workchain, "shard": shard, "seqno": seqno }),
        )
        .await
    }

    pub async fn get_masterchain_block_header(&self, seqno: u32) -> Result<Value> {
        self.get_block_header(-1, SHARD_ID_ALL, seqno).await
    }
}
