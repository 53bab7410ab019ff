use crate::client::base::ClientParams;
use crate::client::toncenter_v2::HttpProvider;
use crate::contract::NftItem;
use crate::models::basic::StringOrInt;
use crate::models::stack::StackValue;
use crate::models::toncenter_v2::StackArg;
use crate::tvm::address::Address;
use crate::tvm::{Cell, deserialize_boc_roots};
use crate::utils::{from_nano, method_name_to_id};
use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use num_bigint::BigInt;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

/// tonweb-rs CLI
#[derive(Parser, Debug)]
#[command(name = "tonweb-rs")]
#[command(about = "tonweb-rs CLI", long_about = None)]
pub struct Cli {
    /// JSON-RPC endpoint, overrides TONCENTER_URL
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// toncenter API key, overrides TONCENTER_API_KEY
    #[arg(long, global = true)]
    pub api_key: Option<String>,
    /// Use the testnet endpoint
    #[arg(long, global = true)]
    pub testnet: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show an address in all of its forms
    Address {
        /// Raw (`wc:hex`) or user-friendly address
        address: String,
    },
    /// Dump the cell tree of a bag of cells
    Boc {
        /// Base64 or hex encoded BoC
        boc: String,
    },
    /// Compute the address of an NFT item
    NftAddress {
        /// Collection address
        #[arg(short = 'c', long)]
        collection: String,
        /// Item index
        #[arg(short = 'i', long)]
        index: u64,
    },
    /// Get masterchain info
    MasterchainInfo,
    /// Get account balance
    Balance {
        address: String,
    },
    /// Send a base64 encoded external message
    SendBoc {
        boc: String,
    },
    /// Run a get-method
    RunGetMethod {
        address: String,
        /// Method name
        method: String,
        /// Send the numeric method id instead of the name
        #[arg(long)]
        by_id: bool,
        /// Integer arguments, pushed in order
        #[arg(short = 'a', long = "arg", allow_negative_numbers = true)]
        args: Vec<String>,
    },
}

/// Decodes a BoC given either as hex or as base64
fn decode_boc(input: &str) -> Result<Vec<Arc<Cell>>> {
    let input = input.trim();
    let is_hex =
        !input.is_empty() && input.len() % 2 == 0 && input.chars().all(|c| c.is_ascii_hexdigit());
    let data = if is_hex {
        hex::decode(input)?
    } else {
        STANDARD.decode(input)?
    };
    Ok(deserialize_boc_roots(&data)?)
}

/// One line per distinct cell; repeated cells are listed once more by hash
/// without their subtree
fn cell_tree_lines(root: &Arc<Cell>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![(root.clone(), 0usize)];
    while let Some((cell, indent)) = stack.pop() {
        if !seen.insert(cell.hash()) {
            lines.push(format!(
                "{:indent$}x{{{}}} (see hash={})",
                "",
                cell.bits().to_hex(),
                cell.hash_hex(),
                indent = indent * 2
            ));
            continue;
        }
        lines.push(format!(
            "{:indent$}x{{{}}} bits={} refs={} depth={} hash={}",
            "",
            cell.bits().to_hex(),
            cell.bit_len(),
            cell.reference_count(),
            cell.depth(),
            cell.hash_hex(),
            indent = indent * 2
        ));
        for child in cell.references().iter().rev() {
            stack.push((child.clone(), indent + 1));
        }
    }
    lines
}

fn log_stack_value(value: &StackValue, indent: usize) {
    match value {
        StackValue::Num(n) => log::info!("{:indent$}num {}", "", n, indent = indent * 2),
        StackValue::Cell(cell) => log::info!(
            "{:indent$}cell {} ({} bits, {} refs)",
            "",
            cell.hash_hex(),
            cell.bit_len(),
            cell.reference_count(),
            indent = indent * 2
        ),
        StackValue::Tuple(items) => {
            log::info!("{:indent$}tuple [{}]", "", items.len(), indent = indent * 2);
            for item in items {
                log_stack_value(item, indent + 1);
            }
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    pub fn client_params(&self) -> ClientParams {
        let mut params = ClientParams::from_env();
        if self.testnet {
            params.base_url = ClientParams::testnet().base_url;
        }
        if let Some(host) = &self.host {
            params.base_url = Some(host.clone());
        }
        if let Some(api_key) = &self.api_key {
            params.api_key = Some(api_key.clone());
        }
        params
    }

    pub fn create_provider(&self) -> HttpProvider {
        let params = self.client_params();
        log::debug!("Using endpoint {}", params.url());
        HttpProvider::new(params)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Address { address } => self.execute_address(address),
            Commands::Boc { boc } => self.execute_boc(boc),
            Commands::NftAddress { collection, index } => {
                self.execute_nft_address(collection, *index)
            }
            Commands::MasterchainInfo => self.execute_masterchain_info().await,
            Commands::Balance { address } => self.execute_balance(address).await,
            Commands::SendBoc { boc } => self.execute_send_boc(boc).await,
            Commands::RunGetMethod {
                address,
                method,
                by_id,
                args,
            } => {
                self.execute_run_get_method(address, method, *by_id, args)
                    .await
            }
        }
    }

    fn execute_address(&self, address: &str) -> Result<()> {
        let address = Address::from_str(address)?;
        let test_only = self.testnet || address.is_test_only();
        log::info!("Workchain: {}", address.workchain());
        log::info!("Raw: {}", address.to_raw());
        log::info!(
            "Bounceable: {}",
            address.to_user_friendly(true, true, test_only)
        );
        log::info!(
            "Non-bounceable: {}",
            address.to_user_friendly(true, false, test_only)
        );
        log::info!(
            "Bounceable (base64): {}",
            address.to_user_friendly(false, true, test_only)
        );
        log::info!(
            "Non-bounceable (base64): {}",
            address.to_user_friendly(false, false, test_only)
        );
        Ok(())
    }

    fn execute_boc(&self, boc: &str) -> Result<()> {
        let roots = decode_boc(boc)?;
        log::info!("Roots: {}", roots.len());
        for (i, root) in roots.iter().enumerate() {
            log::info!("Root #{}:", i);
            for line in cell_tree_lines(root) {
                log::info!("{}", line);
            }
        }
        Ok(())
    }

    fn execute_nft_address(&self, collection: &str, index: u64) -> Result<()> {
        let collection = Address::from_str(collection)?;
        let item = NftItem::new(index, collection)?;
        let address = item.address()?;
        log::info!("NFT item #{} of {}", index, collection);
        log::info!("Address: {}", address);
        log::info!("Raw: {}", address.to_raw());
        Ok(())
    }

    async fn execute_masterchain_info(&self) -> Result<()> {
        let provider = self.create_provider();

        let op_start = Instant::now();
        let info = provider.get_masterchain_info().await?;
        let op_duration = op_start.elapsed();

        log::info!("Last block:");
        log::info!("  Workchain: {}", info.last.workchain);
        log::info!("  Shard: {}", info.last.shard);
        log::info!("  Seqno: {}", info.last.seqno);
        log::info!("  Root hash: {}", info.last.root_hash);
        log::info!("  File hash: {}", info.last.file_hash);
        log::info!("State root hash: {}", info.state_root_hash);
        log::info!("Init block:");
        log::info!("  Workchain: {}", info.init.workchain);
        log::info!("  Root hash: {}", info.init.root_hash);
        log::info!("  File hash: {}", info.init.file_hash);
        log::info!("⏱️  getMasterchainInfo: {:.3}s", op_duration.as_secs_f64());
        Ok(())
    }

    async fn execute_balance(&self, address: &str) -> Result<()> {
        let address = Address::from_str(address)?;
        let provider = self.create_provider();

        let op_start = Instant::now();
        let balance = provider.get_balance(&address.to_string()).await?;
        let op_duration = op_start.elapsed();

        log::info!("Balance: {} TON ({} nanoton)", from_nano(balance), balance);
        log::info!("⏱️  getAddressBalance: {:.3}s", op_duration.as_secs_f64());
        Ok(())
    }

    async fn execute_send_boc(&self, boc: &str) -> Result<()> {
        // Reject malformed messages before they reach the API
        let roots = decode_boc(boc)?;
        if roots.len() != 1 {
            return Err(anyhow::anyhow!("expected a single message, got {} roots", roots.len()));
        }
        log::info!("Message hash: {}", roots[0].hash_hex());

        let provider = self.create_provider();
        let op_start = Instant::now();
        let result = provider.send_boc_cell(&roots[0]).await?;
        let op_duration = op_start.elapsed();

        log::info!("result: {}", result);
        log::info!("⏱️  sendBoc: {:.3}s", op_duration.as_secs_f64());
        Ok(())
    }

    async fn execute_run_get_method(
        &self,
        address: &str,
        method: &str,
        by_id: bool,
        args: &[String],
    ) -> Result<()> {
        let address = Address::from_str(address)?;
        let method = if by_id {
            StringOrInt::from(i64::from(method_name_to_id(method)))
        } else {
            StringOrInt::from(method)
        };
        let stack = args
            .iter()
            .map(|arg| {
                BigInt::from_str(arg)
                    .map(StackArg::Num)
                    .map_err(|_| anyhow::anyhow!("argument {} is not an integer", arg))
            })
            .collect::<Result<Vec<_>>>()?;

        let provider = self.create_provider();
        let op_start = Instant::now();
        let result = provider.call2(&address.to_string(), method, stack).await?;
        let op_duration = op_start.elapsed();

        log::info!("Stack ({} entries):", result.len());
        for value in &result {
            log_stack_value(value, 1);
        }
        log::info!("⏱️  runGetMethod: {:.3}s", op_duration.as_secs_f64());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::parse_from([
            "tonweb-rs",
            "balance",
            "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N",
            "--testnet",
            "--api-key",
            "secret",
        ]);
        assert!(cli.testnet);
        let params = cli.client_params();
        assert_eq!(params.url(), "https://testnet.toncenter.com/api/v2/jsonRPC");
        assert_eq!(params.api_key.as_deref(), Some("secret"));

        let cli = Cli::parse_from([
            "tonweb-rs",
            "--host",
            "http://localhost:8081/jsonRPC",
            "masterchain-info",
        ]);
        assert_eq!(cli.client_params().url(), "http://localhost:8081/jsonRPC");
    }

    #[test]
    fn test_cell_tree_lines_shared_chain() {
        let mut chain = Arc::new(Cell::with_data(vec![0xFF], 8).unwrap());
        for i in 0..30u8 {
            chain = Arc::new(Cell::new(vec![i], 8, vec![chain.clone(), chain]).unwrap());
        }
        let boc = crate::tvm::boc_to_hex(&chain, false).unwrap();
        let roots = decode_boc(&boc).unwrap();

        let lines = cell_tree_lines(&roots[0]);
        assert_eq!(lines.len(), 31 + 30);
        assert!(lines[0].starts_with("x{1D} bits=8 refs=2 depth=30 hash="));
        assert_eq!(lines.iter().filter(|l| l.contains("(see hash=")).count(), 30);
    }

    #[test]
    fn test_parse_run_get_method() {
        let cli = Cli::parse_from([
            "tonweb-rs",
            "run-get-method",
            "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N",
            "get_nft_address_by_index",
            "--by-id",
            "-a",
            "-5",
            "--arg",
            "7",
        ]);
        match cli.command {
            Commands::RunGetMethod { by_id, args, .. } => {
                assert!(by_id);
                assert_eq!(args, vec!["-5".to_string(), "7".to_string()]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_decode_boc_accepts_hex_and_base64() {
        let from_hex = decode_boc("b5ee9c72010101010002000000").unwrap();
        let from_base64 = decode_boc("te6ccgEBAQEAAgAAAA==").unwrap();
        assert_eq!(from_hex, from_base64);
        assert!(decode_boc("not a boc").is_err());
    }

    #[test]
    fn test_offline_commands() {
        let cli = Cli::parse_from([
            "tonweb-rs",
            "nft-address",
            "-c",
            "UQCf-xXXVDL87MAmMNFmxVUuohYIaXfLRjQXZ8Czp_Wo4KGM",
            "-i",
            "5",
        ]);
        assert!(
            cli.execute_nft_address("UQCf-xXXVDL87MAmMNFmxVUuohYIaXfLRjQXZ8Czp_Wo4KGM", 5)
                .is_ok()
        );
        assert!(
            cli.execute_address(
                "-1:3333333333333333333333333333333333333333333333333333333333333333"
            )
            .is_ok()
        );
        assert!(cli.execute_address("not an address").is_err());
        assert!(cli.execute_boc("b5ee9c7201010301000b000100010202ff02020001b0").is_ok());
    }
}
