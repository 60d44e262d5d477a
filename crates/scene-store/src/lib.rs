//! Object-store backed scene archive.
//!
//! Stores raw scenes as a JSON manifest plus one little-endian `f32`
//! payload per band, on the local filesystem or in an S3-compatible bucket,
//! and serves them to the median compositor through `SceneArchive`.

pub mod archive;
pub mod codec;
pub mod config;

pub use archive::{ObjectStoreSceneArchive, SceneManifest};
pub use codec::{decode_band, encode_band, DEFAULT_NODATA};
pub use config::{S3Config, SceneStoreConfig};
