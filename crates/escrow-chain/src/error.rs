use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("network error: {0}")]
    Network(String),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("wallet has not been deployed on-chain")]
    UndeployedWallet,
    #[error("amount {0} is at or below the fee reserve; nothing to send")]
    InsufficientForFee(f64),
}
