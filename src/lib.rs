//! # sigmf-utils
//! Small helpers for producing and consuming [SigMF](https://sigmf.org) metadata.
//!
//! * [`time`]: SigMF timestamps (`2025-09-20T13:05:03.250000Z`), always UTC with
//!   microsecond precision.
//! * [`merge`]: recursive merging of metadata mappings, the override side wins.
//! * [`record`]: `captures`/`annotations` style record lists kept sorted by a field,
//!   merging records which land on an existing key.
//! * [`dtype`] and [`label`]: the SigMF `core:datatype` label (`cf32_le`, `u8_be`, ...)
//!   of an array of samples.
//!
//! Reading and writing SigMF archives, and validating metadata against the schema,
//! are left to other crates.
//!
//! ## Examples
//!
//! ### Labelling a recording
//!
//! ```
//! use num_complex::Complex;
//! use sigmf_utils::{data_type_label, Endianness};
//!
//! let samples = vec![Complex::new(0.0f32, 1.0); 1024];
//! let label = data_type_label(&samples).unwrap();
//! let expected = format!("cf32{}", Endianness::host().suffix());
//! assert_eq!(label, expected);
//! ```
//!
//! Arrays coming from elsewhere can be described with the numpy array interface
//! mapping instead:
//!
//! ```
//! use serde_json::json;
//! use sigmf_utils::data_type_label;
//!
//! let interface = json!({"typestr": ">i2", "shape": [2, 4096]});
//! assert_eq!(data_type_label(&interface).unwrap(), "i16_be");
//! ```
//!
//! ### Keeping captures sorted
//!
//! ```
//! use serde_json::json;
//! use sigmf_utils::{now_as_iso8601, RecordList};
//!
//! let mut captures = RecordList::new();
//! captures.insert_or_merge(json!({"core:sample_start": 0}), "core:sample_start", false)?;
//! captures.insert_or_merge(
//!     json!({"core:sample_start": 0, "core:datetime": now_as_iso8601()}),
//!     "core:sample_start",
//!     false,
//! )?;
//! assert_eq!(captures.len(), 1);
//! # Ok::<(), sigmf_utils::Error>(())
//! ```
//!
pub mod dtype;
pub mod label;
pub mod merge;
pub mod record;
pub mod time;

use thiserror::Error;

pub use dtype::{ArrayDescriptor, ArrayLike, ByteOrder, DType, Element, Endianness, Kind, TypeError};
pub use label::{DataTypeLabel, LabelKind, data_type_label, endian_suffix};
pub use merge::{merge, merge_into};
pub use record::{Placement, RecordError, RecordList, insert_sorted};
pub use time::{TimestampError, format_iso8601, now_as_iso8601, parse_iso8601};

/// Any error raised by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Timestamp(#[from] TimestampError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Record(#[from] RecordError),
}
