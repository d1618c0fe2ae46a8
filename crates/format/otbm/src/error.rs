use mapcore_codec::{CodecError, StructureError};
use thiserror::Error;

/// An error encountered while reading or writing a map file.
#[derive(Error, Debug)]
pub enum OtbmError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error("unsupported map version {found} (supported up to {max_supported})")]
    UnsupportedVersion {
        found:         u32,
        max_supported: u32,
    },
    #[error("root node has type {found}, expected {expected}")]
    WrongRootType {
        expected: u8,
        found:    u8,
    },
    #[error(transparent)]
    Xml(#[from] quick_xml::DeError),
    #[error(transparent)]
    XmlWrite(#[from] quick_xml::SeError),
}

/// Counts of soft-skipped entries accumulated while reading a map, matching the "fails soft
/// per node" behaviour of the reference reader: a single bad child node is logged and
/// skipped rather than aborting the whole load.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadStats {
    pub tiles_read:      u64,
    pub items_read:      u64,
    pub towns_read:      u64,
    pub waypoints_read:  u64,
    pub creatures_read:  u64,
    pub tiles_skipped:   u64,
    pub entries_skipped: u64,
}
