pub mod audit;
pub mod candidates;
pub mod ledger;
pub mod limits;
pub mod optimiser;
pub mod period;
pub mod rejection;
pub mod state;
pub mod submission;
