//! Production store implementations.
//!
//! `PostgresTicketStore` backs the ticket/result/event rows; `S3ImageStore`
//! holds the uploaded image blobs on any S3-compatible endpoint (MinIO in
//! development).

pub mod postgres;
pub mod s3;

pub use postgres::PostgresTicketStore;
pub use s3::S3ImageStore;
