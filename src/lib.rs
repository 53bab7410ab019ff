pub mod cli;
pub mod client;
pub mod contract;
pub mod crc;
pub mod models;
pub mod tvm;
pub mod utils;
