//! Smart-contract helpers built on top of [`crate::tvm`]
//!
//! A contract's address is the hash of its initial state, so everything here
//! reduces to building the right cells.

pub mod nft;

use std::sync::Arc;

use crate::tvm::error::Result;
use crate::tvm::{Address, Cell, CellBuilder, Slice, TvmError};

pub use nft::{NftItem, NftItemData, TransferBodyParams};

/// `tick_tock` flags of a special account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickTock {
    pub tick: bool,
    pub tock: bool,
}

/// Initial state of a contract
/// ```tlb
/// _ split_depth:(Maybe (## 5)) special:(Maybe TickTock)
///   code:(Maybe ^Cell) data:(Maybe ^Cell)
///   library:(Maybe ^Cell) = StateInit;
/// ```
/// Libraries are always stored as empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateInit {
    pub split_depth: Option<u8>,
    pub special: Option<TickTock>,
    pub code: Option<Arc<Cell>>,
    pub data: Option<Arc<Cell>>,
}

impl StateInit {
    pub fn new(code: Arc<Cell>, data: Arc<Cell>) -> Self {
        Self {
            code: Some(code),
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn to_cell(&self) -> Result<Arc<Cell>> {
        let mut builder = CellBuilder::new();
        match self.split_depth {
            Some(depth) => {
                if depth >= 32 {
                    return Err(TvmError::out_of_range(format!(
                        "split depth {} does not fit in 5 bits",
                        depth
                    )));
                }
                builder.store_bit(true)?.store_uint(depth as u128, 5)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        match self.special {
            Some(TickTock { tick, tock }) => {
                builder.store_bit(true)?.store_bit(tick)?.store_bit(tock)?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }
        builder
            .store_maybe_ref(self.code.clone())?
            .store_maybe_ref(self.data.clone())?
            .store_bit(false)?;
        builder.build()
    }

    pub fn from_cell(cell: Arc<Cell>) -> Result<Self> {
        let mut slice = Slice::new(cell);
        let split_depth = if slice.load_bit()? {
            Some(slice.load_uint(5)? as u8)
        } else {
            None
        };
        let special = if slice.load_bit()? {
            Some(TickTock {
                tick: slice.load_bit()?,
                tock: slice.load_bit()?,
            })
        } else {
            None
        };
        let code = slice.load_maybe_ref()?;
        let data = slice.load_maybe_ref()?;
        // library
        slice.load_maybe_ref()?;
        Ok(Self {
            split_depth,
            special,
            code,
            data,
        })
    }

    /// Address of the contract deployed with this state in `workchain`
    pub fn address(&self, workchain: i32) -> Result<Address> {
        Address::new(workchain, self.to_cell()?.hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tvm::{base64_to_boc, hex_to_boc};

    const WALLET_DEPLOY_TRANSFER: &str = "te6ccsECBAEAAQwAAAAAbgCyANgD0YgBP/Yrrqhl+dmATGGizYqqXUQsENLvloxoLs+BZ0/rUcARmHC0GF4v7v2ia5PQYlR3yUiENZSC+Jqz/m55HhKG7LIjuA6izVQ8bbmbRDuqks+xfX8e5Y0NZoY+FF2C6nGiAGAAAAAAcAECAwCE/wAg3aTyYIECANcYINcLH+1E0NMf0//RURK68qEi+QFUEET5EPKi+AAB0x8xINdKltMH1AL7AN7RpMjLH8v/ye1UAEgAAAAAbkBe/GUa5GDCuc1VaDzCLxheNOgRQZpXvPCHAR7umAcAZEIAMJXnhwXmE22prcyW4kuNJNWTaSA7Jvgrq6xCSp/iSz0QINAAAAAAAAAAAAAAAAAAyMokRQ==";

    const WALLET_CODE_HEX: &str = "ff0020dda4f260810200d71820d70b1fed44d0d31fd3ffd15112baf2a122f901541044f910f2a2f80001d31f3120d74a96d307d402fb00ded1a4c8cb1fcbffc9ed54";
    const WALLET_DATA_HEX: &str =
        "000000006e405efc651ae460c2b9cd55683cc22f185e34e811419a57bcf087011eee9807";

    fn wallet_state_init() -> StateInit {
        let code = Cell::with_data(hex::decode(WALLET_CODE_HEX).unwrap(), 528).unwrap();
        let data = Cell::with_data(hex::decode(WALLET_DATA_HEX).unwrap(), 288).unwrap();
        StateInit::new(Arc::new(code), Arc::new(data))
    }

    #[test]
    fn test_state_init_layout() {
        let cell = wallet_state_init().to_cell().unwrap();
        assert_eq!(cell.bit_len(), 5);
        assert_eq!(cell.bits().to_hex(), "34_");
        assert_eq!(cell.reference_count(), 2);
        assert_eq!(
            cell.hash_hex(),
            "9ffb15d75432fcecc02630d166c5552ea216086977cb46341767c0b3a7f5a8e0"
        );
    }

    #[test]
    fn test_state_init_address() {
        let address = wallet_state_init().address(0).unwrap();
        assert_eq!(
            address.to_user_friendly(true, false, false),
            "UQCf-xXXVDL87MAmMNFmxVUuohYIaXfLRjQXZ8Czp_Wo4KGM"
        );
    }

    #[test]
    fn test_state_init_from_deploy_message() {
        let message = base64_to_boc(WALLET_DEPLOY_TRANSFER).unwrap();
        let mut slice = Slice::new(message.clone());
        let expected = wallet_state_init();
        let code = slice.load_reference().unwrap();
        let data = slice.load_reference().unwrap();
        assert_eq!(code.as_ref(), expected.code.as_deref().unwrap());
        assert_eq!(data.as_ref(), expected.data.as_deref().unwrap());

        let parsed = StateInit::from_cell(expected.to_cell().unwrap()).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_state_init_optional_fields() {
        let state = StateInit {
            split_depth: Some(7),
            special: Some(TickTock {
                tick: true,
                tock: false,
            }),
            code: None,
            data: Some(hex_to_boc("b5ee9c72010101010002000000").unwrap()),
        };
        let cell = state.to_cell().unwrap();
        assert_eq!(cell.bit_len(), 1 + 5 + 1 + 2 + 1 + 1 + 1);
        assert_eq!(cell.reference_count(), 1);
        assert_eq!(StateInit::from_cell(cell).unwrap(), state);

        let too_deep = StateInit {
            split_depth: Some(32),
            ..StateInit::default()
        };
        assert!(matches!(
            too_deep.to_cell(),
            Err(TvmError::ValueOutOfRange(_))
        ));
    }
}
