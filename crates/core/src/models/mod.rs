pub mod analytics;
pub mod archive;
pub mod ledger;
pub mod month;
pub mod settings;
pub mod summary;
pub mod transaction;
