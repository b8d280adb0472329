pub mod aggregate;
pub mod balances;
pub mod cache;
pub mod chains;
pub mod config;
pub mod error;
pub mod explore;
pub mod explorer;
pub mod export;
pub mod models;
pub mod normalize;
pub mod report;
pub mod response;
pub mod session;
pub mod transactions;

pub use error::{Result, TokenflowError};
pub use explorer::ExplorerClient;
pub use models::{FetchParams, NormalizedTransfer, RawTransferRecord, TransferTable};
pub use session::Session;
