//! SigMF data type labels such as `cf32_le` or `u8_be`, derived from the element
//! type of a sample array.

use crate::dtype::{ArrayLike, DType, Endianness, Kind, TypeError};
use std::{fmt, str::FromStr};
use tracing::debug;

/// The kinds of sample SigMF can describe.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum LabelKind {
    ComplexFloat,
    Float,
    Unsigned,
    Signed,
}

impl LabelKind {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ComplexFloat => "cf",
            Self::Float => "f",
            Self::Unsigned => "u",
            Self::Signed => "i",
        }
    }
}

/// Parsed form of a SigMF data type label.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DataTypeLabel {
    pub kind: LabelKind,
    /// Bits per value. For complex samples this is per component, so `cf32` is
    /// two `f32` back to back.
    pub bits: usize,
    pub endianness: Endianness,
}

impl DataTypeLabel {
    /// Builds the label for `dtype`, resolving native and single byte orders
    /// against `host`.
    pub fn derive(dtype: &DType, host: Endianness) -> Result<Self, TypeError> {
        let kind = match dtype.kind() {
            Kind::Complex => LabelKind::ComplexFloat,
            Kind::Float => LabelKind::Float,
            Kind::Unsigned => LabelKind::Unsigned,
            Kind::Signed => LabelKind::Signed,
            _ => {
                debug!("No SigMF data type for {}", dtype);
                return Err(TypeError::UnsupportedDataType(*dtype));
            }
        };

        let Some(bits) = dtype.bits() else {
            debug!("Item size of {} overflows its bit width", dtype);
            return Err(TypeError::UnsupportedDataType(*dtype));
        };
        let bits = match kind {
            LabelKind::ComplexFloat => bits / 2,
            _ => bits,
        };

        Ok(DataTypeLabel {
            kind,
            bits,
            endianness: dtype.byteorder().resolve(host),
        })
    }
}

impl fmt::Display for DataTypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.kind.prefix(),
            self.bits,
            self.endianness.suffix()
        )
    }
}

impl FromStr for DataTypeLabel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TypeError::MalformedLabel(s.to_owned());

        // "cf" has to be tried before "f"
        let (kind, rest) = [
            LabelKind::ComplexFloat,
            LabelKind::Float,
            LabelKind::Unsigned,
            LabelKind::Signed,
        ]
        .into_iter()
        .find_map(|kind| s.strip_prefix(kind.prefix()).map(|rest| (kind, rest)))
        .ok_or_else(malformed)?;

        let (bits, endianness) = if let Some(bits) = rest.strip_suffix(Endianness::Little.suffix())
        {
            (bits, Endianness::Little)
        } else if let Some(bits) = rest.strip_suffix(Endianness::Big.suffix()) {
            (bits, Endianness::Big)
        } else {
            return Err(malformed());
        };

        if bits.is_empty() || !bits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        Ok(DataTypeLabel {
            kind,
            bits: bits.parse().map_err(|_| malformed())?,
            endianness,
        })
    }
}

/// Endianness suffix (`_le` or `_be`) for the element type of `array`. Native and
/// single byte types get the byte order of the host.
pub fn endian_suffix<A: ArrayLike + ?Sized>(array: &A) -> Result<&'static str, TypeError> {
    Ok(array.dtype()?.byteorder().resolve(Endianness::host()).suffix())
}

/// SigMF data type label for the element type of `array`, e.g. `f32_le`.
pub fn data_type_label<A: ArrayLike + ?Sized>(array: &A) -> Result<String, TypeError> {
    let dtype = array.dtype()?;
    Ok(DataTypeLabel::derive(&dtype, Endianness::host())?.to_string())
}
