//! External collaborators: price predictions and the trade counterparty.

pub mod catalogue;
pub mod client;
pub mod counterparty;
pub mod grid_operator;
pub mod market_service;
pub mod oracle;
pub mod random;

/// Context attached to a failed collaborator call.
///
/// Recoverable from the resulting error with [`anyhow::Error::downcast_ref`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::Display)]
pub enum CollaboratorUnavailable {
    #[display("market oracle is unavailable")]
    MarketOracle,

    #[display("trade counterparty is unavailable")]
    TradeCounterparty,
}
