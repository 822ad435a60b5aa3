pub mod aggregation_service;
pub mod archive_service;
pub mod export_service;
pub mod history_service;
pub mod prompt_service;
pub mod summary_service;
