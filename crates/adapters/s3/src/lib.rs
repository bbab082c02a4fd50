//! adapter-s3 - Amazon S3 adapter
//!
//! Object listing, reads and writes, CSV uploads of tabular data and QuickSight manifest
//! generation.

pub mod client;
pub mod error;
pub mod manifest;

pub use client::S3Handler;
pub use manifest::QuickSightManifest;
