use std::sync::Arc;

use num_traits::{ToPrimitive, Zero};

use crate::client::base::HttpClient;
use crate::client::error::{ProviderError, Result as ProviderResult};
use crate::client::toncenter_v2::HttpProvider;
use crate::contract::StateInit;
use crate::models::stack::StackValue;
use crate::tvm::error::Result;
use crate::tvm::{Address, BASECHAIN, Cell, CellBuilder, Slice, hex_to_boc};

/// Standard NFT item code
pub const NFT_ITEM_CODE_HEX: &str = concat!(
    "B5EE9C7241020B0100019C000114FF00F4A413F4BCF2C80B0102016202030202CE04050009A11F9FE003020120060700",
    "1D403C8CB3F58CF1601CF16CCC9ED54802A30C8871C02497C0F83434C0C05C6C2497C0F83E900C3C00412CE3844C0C8D",
    "1480B1C17CB865407E90350C3C00B80174C7F4CFE08417F30F45148C2EB8C08C0D0D4D60840BF2C9A8852EB8C097C121",
    "03FCBC200809003B3B513434CFFE900835D27080269FC07E90350C04090408F80C1C165B5B6001FC3210365E22015124",
    "C705F2E19101FA40FA40D20031FA00820AFAF0801AA121A120C200F2E192218E3E821005138D91C85008CF16500ACF16",
    "71244814544690708010C8CB055007CF165005FA0215CB6A12CB1FCB3F226EB39458CF17019132E201C901FB00103694",
    "1029365BE226D70B01C3009410266C31E30D5502F0020A00767082108B77173504C8CBFF5005CF161024102380407080",
    "10C8CB055007CF165005FA0215CB6A12CB1FCB3F226EB39458CF17019132E201C901FB0000648210D53276DB10374404",
    "6D71708010C8CB055007CF165005FA0215CB6A12CB1FCB3F226EB39458CF17019132E201C901FB00D5B62154",
);

pub const OP_TRANSFER: u32 = 0x5fcc3d14;
pub const OP_GET_STATIC_DATA: u32 = 0x2fcb26a2;

#[derive(Debug, Clone)]
pub struct TransferBodyParams {
    pub new_owner: Address,
    pub response_address: Address,
    pub query_id: u64,
    /// Nanotons forwarded to the new owner with the notification
    pub forward_amount: u128,
    /// Stored inline after the `Either` bit
    pub forward_payload: Option<Vec<u8>>,
}

impl TransferBodyParams {
    pub fn new(new_owner: Address, response_address: Address) -> Self {
        Self {
            new_owner,
            response_address,
            query_id: 0,
            forward_amount: 0,
            forward_payload: None,
        }
    }
}

/// Result of the `get_nft_data` get-method
#[derive(Debug, Clone)]
pub struct NftItemData {
    pub is_initialized: bool,
    pub index: u64,
    pub collection_address: Option<Address>,
    pub owner_address: Option<Address>,
    pub content: Option<Arc<Cell>>,
}

/// An NFT item identified by its collection and index, always in the basechain
#[derive(Debug, Clone)]
pub struct NftItem {
    index: u64,
    collection_address: Address,
    code: Arc<Cell>,
}

impl NftItem {
    pub fn new(index: u64, collection_address: Address) -> Result<Self> {
        Ok(Self::with_code(
            index,
            collection_address,
            hex_to_boc(NFT_ITEM_CODE_HEX)?,
        ))
    }

    pub fn with_code(index: u64, collection_address: Address, code: Arc<Cell>) -> Self {
        Self {
            index,
            collection_address,
            code,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn collection_address(&self) -> &Address {
        &self.collection_address
    }

    pub fn code(&self) -> &Arc<Cell> {
        &self.code
    }

    pub fn create_data_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        builder
            .store_u64(self.index)?
            .store_address(Some(&self.collection_address))?;
        builder.build()
    }

    pub fn state_init(&self) -> Result<StateInit> {
        Ok(StateInit::new(self.code.clone(), self.create_data_cell()?))
    }

    pub fn address(&self) -> Result<Address> {
        self.state_init()?.address(BASECHAIN)
    }

    pub fn create_transfer_body(params: &TransferBodyParams) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        builder
            .store_u32(OP_TRANSFER)?
            .store_u64(params.query_id)?
            .store_address(Some(&params.new_owner))?
            .store_address(Some(&params.response_address))?
            // null custom_payload
            .store_bit(false)?
            .store_coins(params.forward_amount)?
            .store_bit(false)?;
        if let Some(payload) = &params.forward_payload {
            builder.store_bytes(payload)?;
        }
        builder.build()
    }

    pub fn create_get_static_data_body(query_id: u64) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        builder.store_u32(OP_GET_STATIC_DATA)?.store_u64(query_id)?;
        builder.build()
    }

    /// Queries the deployed item through `get_nft_data`
    pub async fn get_data<C: HttpClient>(
        &self,
        provider: &HttpProvider<C>,
    ) -> ProviderResult<NftItemData> {
        let address = self.address()?;
        let stack = provider
            .call2(&address.to_string(), "get_nft_data", vec![])
            .await?;
        parse_nft_data(&stack)
    }
}

fn stack_num(stack: &[StackValue], position: usize) -> ProviderResult<&num_bigint::BigInt> {
    stack
        .get(position)
        .and_then(StackValue::as_num)
        .ok_or_else(|| {
            ProviderError::UnexpectedStackEntry(format!("expected number at {}", position))
        })
}

fn stack_cell(stack: &[StackValue], position: usize) -> ProviderResult<&Arc<Cell>> {
    stack
        .get(position)
        .and_then(StackValue::as_cell)
        .ok_or_else(|| {
            ProviderError::UnexpectedStackEntry(format!("expected cell at {}", position))
        })
}

fn stack_address(stack: &[StackValue], position: usize) -> ProviderResult<Option<Address>> {
    let cell = stack_cell(stack, position)?;
    Ok(Slice::new(cell.clone()).load_address()?)
}

/// Decodes the `(init?, index, collection, owner, content)` stack of `get_nft_data`
pub fn parse_nft_data(stack: &[StackValue]) -> ProviderResult<NftItemData> {
    let is_initialized = !stack_num(stack, 0)?.is_zero();
    let index = stack_num(stack, 1)?.to_u64().ok_or_else(|| {
        ProviderError::UnexpectedStackEntry("item index does not fit in 64 bits".to_string())
    })?;
    let collection_address = stack_address(stack, 2)?;
    let owner_address = if is_initialized {
        stack_address(stack, 3)?
    } else {
        None
    };
    let content = stack.get(4).and_then(StackValue::as_cell).cloned();

    Ok(NftItemData {
        is_initialized,
        index,
        collection_address,
        owner_address,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::base::{ClientParams, HttpRequest, HttpResponse};
    use async_trait::async_trait;
    use num_bigint::BigInt;
    use serde_json::json;
    use std::sync::Mutex;

    const COLLECTION: &str = "UQCf-xXXVDL87MAmMNFmxVUuohYIaXfLRjQXZ8Czp_Wo4KGM";

    fn collection() -> Address {
        Address::parse(COLLECTION).unwrap()
    }

    #[test]
    fn test_item_code() {
        let code = hex_to_boc(NFT_ITEM_CODE_HEX).unwrap();
        assert_eq!(
            code.hash_hex(),
            "11200487503ff94c8e08703e7ea20926eb19e4f050d2b332dbbcb0642cfc07fa"
        );
        assert_eq!(code.depth(), 6);
    }

    #[test]
    fn test_item_address() {
        let item = NftItem::new(5, collection()).unwrap();
        let data = item.create_data_cell().unwrap();
        assert_eq!(data.bit_len(), 64 + 267);
        assert_eq!(
            data.hash_hex(),
            "99145a5df0bb2ca1ebe1f8ee012043bb8acd088c20789a569da3c44b0b1a8c62"
        );

        let address = item.address().unwrap();
        assert_eq!(address.workchain(), 0);
        assert_eq!(
            address.to_user_friendly(true, true, false),
            "EQBwtslPJf6KG-5f-u-E2d371l_j9yEIHjfu1RVYiKdh_RLG"
        );
    }

    #[test]
    fn test_transfer_body() {
        let owner = collection();
        let params = TransferBodyParams {
            query_id: 7,
            forward_amount: 10_000_000,
            forward_payload: Some(b"hi".to_vec()),
            ..TransferBodyParams::new(owner, owner)
        };
        let body = NftItem::create_transfer_body(&params).unwrap();
        assert_eq!(body.bit_len(), 676);
        assert_eq!(body.reference_count(), 0);
        assert_eq!(
            body.hash_hex(),
            "9613e13674a6cfc8a598afac2368c68adcfd35763a92cb21b4f28452b49812bd"
        );

        let mut slice = Slice::new(body);
        assert_eq!(slice.load_u32().unwrap(), OP_TRANSFER);
        assert_eq!(slice.load_u64().unwrap(), 7);
        assert_eq!(slice.load_address().unwrap(), Some(owner));
        assert_eq!(slice.load_address().unwrap(), Some(owner));
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.load_coins().unwrap(), 10_000_000);
        assert!(!slice.load_bit().unwrap());
        assert_eq!(slice.load_string(2).unwrap(), "hi");
        assert!(slice.is_empty());
    }

    #[test]
    fn test_get_static_data_body() {
        let body = NftItem::create_get_static_data_body(0).unwrap();
        assert_eq!(body.bit_len(), 96);
        assert_eq!(
            body.hash_hex(),
            "b93989803208b9d5a6daac061498c99b22a3f9a98e843ffa1edbecd4f527c40a"
        );
    }

    struct FixedResponse {
        body: String,
        requests: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpClient for FixedResponse {
        async fn post(&self, request: HttpRequest) -> ProviderResult<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    #[tokio::test]
    async fn test_get_data() {
        let body = json!({
            "ok": true,
            "result": {
                "gas_used": 3000,
                "exit_code": 0,
                "stack": [
                    ["num", "-0x1"],
                    ["num", "0x5"],
                    ["cell", {"bytes": "te6ccgEBAQEAJAAAQ4AT/2K66oZfnZgExhos2Kql1ELBDS75aMaC7PgWdP61HBA="}],
                    ["cell", {"bytes": "te6ccgEBAQEAJAAAQ5/gAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABA="}],
                    ["cell", {"bytes": "te6ccgEBAQEAAgAAAA=="}]
                ]
            }
        });
        let client = FixedResponse {
            body: body.to_string(),
            requests: Mutex::new(vec![]),
        };
        let provider = HttpProvider::with_client(ClientParams::default(), client);
        let item = NftItem::new(5, collection()).unwrap();
        let data = item.get_data(&provider).await.unwrap();

        assert!(data.is_initialized);
        assert_eq!(data.index, 5);
        assert_eq!(data.collection_address, Some(collection()));
        let owner = data.owner_address.unwrap();
        assert_eq!(owner.workchain(), -1);
        assert_eq!(owner.hash_part(), &[0u8; 32]);
        assert_eq!(data.content.unwrap().bit_len(), 0);
    }

    #[test]
    fn test_uninitialized_item_has_no_owner() {
        let stack = vec![
            StackValue::Num(BigInt::from(0)),
            StackValue::Num(BigInt::from(9)),
            StackValue::Cell(Arc::new(
                Cell::with_data(vec![0x00], 2).unwrap(),
            )),
            StackValue::Num(BigInt::from(0)),
        ];
        let data = parse_nft_data(&stack).unwrap();
        assert!(!data.is_initialized);
        assert_eq!(data.index, 9);
        assert_eq!(data.collection_address, None);
        assert_eq!(data.owner_address, None);
        assert!(data.content.is_none());

        assert!(matches!(
            parse_nft_data(&stack[..1]),
            Err(ProviderError::UnexpectedStackEntry(_))
        ));
    }
}
