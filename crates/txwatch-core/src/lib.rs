//! txwatch-core — per-address transaction index fed by a block scanner.
//!
//! # Architecture
//!
//! ```text
//! Parser (facade) ──queries──▶ AddressIndex (memory / SQLite)
//!    │                              ▲
//!    └─spawns─▶ Scanner ──append────┘
//!                  │
//!                  └──fetch──▶ ChainReader (JSON-RPC)
//! ```

pub mod config;
pub mod cursor;
pub mod error;
pub mod parser;
pub mod quantity;
pub mod reader;
pub mod retry;
pub mod scanner;
pub mod shutdown;
pub mod store;
pub mod types;

pub use config::{FanOutMode, FetchFailurePolicy, ScannerConfig, ScannerState};
pub use cursor::Cursor;
pub use error::IndexError;
pub use parser::Parser;
pub use quantity::{decode_quantity, encode_quantity};
pub use reader::ChainReader;
pub use retry::RetryConfig;
pub use scanner::{fan_out, ScanStatus, Scanner, ScannerHandle};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use store::AddressIndex;
pub use types::{Block, ChainTransaction, Direction, TxRecord};
