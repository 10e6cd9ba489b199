pub mod consensus;
pub mod fetcher;
pub mod flatten;
pub mod ledger;
pub mod notify;
pub mod pipeline;
pub mod prompt;
pub mod publish;
pub mod retry;
pub mod selector;
pub mod sources;
pub mod stats;
pub mod tweet;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
