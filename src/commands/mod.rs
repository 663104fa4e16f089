pub mod ingest;
pub mod link;
pub mod query;
pub mod status;
