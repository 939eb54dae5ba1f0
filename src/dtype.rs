//! Element type descriptors for in-memory sample arrays.
//!
//! The model follows numpy's `__array_interface__` typestr: a byte order character,
//! a kind character and an item size in bytes, e.g. `<f4` or `|u1`. Rust element types
//! map onto it through [`Element`], and anything which can report a [`DType`] is
//! [`ArrayLike`].

use byteorder::{ByteOrder as _, NativeEndian};
use num_complex::Complex;
use serde_json::Value;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TypeError {
    #[error("Argument must be an array, got {0}")]
    NotAnArray(String),
    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(DType),
    #[error("Typestr {0:?} is not of the form <byteorder><kind><size>")]
    MalformedTypestr(String),
    #[error("Data type label {0:?} is not of the form {{cf|f|u|i}}<bits>_{{le|be}}")]
    MalformedLabel(String),
}

/// The numpy kind character of an element type.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Kind {
    Bool,
    Signed,
    Unsigned,
    Float,
    /// Complex floating point, both components stored back to back
    Complex,
    TimeDelta,
    DateTime,
    Object,
    Bytes,
    Unicode,
    Void,
}

impl Kind {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'b' => Self::Bool,
            'i' => Self::Signed,
            'u' => Self::Unsigned,
            'f' => Self::Float,
            'c' => Self::Complex,
            'm' => Self::TimeDelta,
            'M' => Self::DateTime,
            'O' => Self::Object,
            'S' | 'a' => Self::Bytes,
            'U' => Self::Unicode,
            'V' => Self::Void,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Bool => 'b',
            Self::Signed => 'i',
            Self::Unsigned => 'u',
            Self::Float => 'f',
            Self::Complex => 'c',
            Self::TimeDelta => 'm',
            Self::DateTime => 'M',
            Self::Object => 'O',
            Self::Bytes => 'S',
            Self::Unicode => 'U',
            Self::Void => 'V',
        }
    }
}

/// Byte order as declared by a dtype.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteOrder {
    /// `<`
    Little,
    /// `>`
    Big,
    /// `=`, whatever the machine running the code uses
    Native,
    /// `|`, single byte items and byte blobs
    NotApplicable,
}

impl ByteOrder {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '<' => Self::Little,
            '>' => Self::Big,
            '=' => Self::Native,
            '|' => Self::NotApplicable,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Little => '<',
            Self::Big => '>',
            Self::Native => '=',
            Self::NotApplicable => '|',
        }
    }

    /// Concrete byte order of the data, given the byte order of the host it lives on.
    pub fn resolve(self, host: Endianness) -> Endianness {
        match self {
            Self::Little => Endianness::Little,
            Self::Big => Endianness::Big,
            Self::Native | Self::NotApplicable => host,
        }
    }
}

/// A concrete byte order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the machine we are running on.
    pub fn host() -> Self {
        // NativeEndian aliases either LittleEndian or BigEndian
        if NativeEndian::read_u16(&[1, 0]) == 1 {
            Self::Little
        } else {
            Self::Big
        }
    }

    /// SigMF suffix, `_le` or `_be`
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Little => "_le",
            Self::Big => "_be",
        }
    }
}

/// Element type of an array: kind, item size in bytes and byte order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct DType {
    kind: Kind,
    itemsize: usize,
    byteorder: ByteOrder,
}

impl DType {
    /// Byte order is dropped for single byte items and opaque byte kinds, same as
    /// numpy does, so `>u1` and `|u1` are the same dtype.
    pub const fn new(kind: Kind, itemsize: usize, byteorder: ByteOrder) -> Self {
        let byteorder = if itemsize <= 1 || matches!(kind, Kind::Object | Kind::Bytes | Kind::Void)
        {
            ByteOrder::NotApplicable
        } else {
            byteorder
        };
        DType {
            kind,
            itemsize,
            byteorder,
        }
    }

    pub fn of<T: Element>() -> Self {
        T::DTYPE
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Size of a single item in bytes. For complex types this covers both components.
    pub fn itemsize(&self) -> usize {
        self.itemsize
    }

    pub fn byteorder(&self) -> ByteOrder {
        self.byteorder
    }

    /// Bits per item, `None` if that does not fit in a `usize`.
    pub fn bits(&self) -> Option<usize> {
        self.itemsize.checked_mul(8)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = if self.kind == Kind::Unicode {
            self.itemsize / 4
        } else {
            self.itemsize
        };
        write!(
            f,
            "{}{}{}",
            self.byteorder.as_char(),
            self.kind.as_char(),
            count
        )
    }
}

impl FromStr for DType {
    type Err = TypeError;

    /// Parses numpy typestrs such as `<f4`, `|u1`, `>c16`, `<U8` or `<M8[ns]`.
    /// Datetime units are accepted but not kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || TypeError::MalformedTypestr(s.to_owned());

        let mut chars = s.chars();
        let byteorder = chars
            .next()
            .and_then(ByteOrder::from_char)
            .ok_or_else(malformed)?;
        let kind = chars.next().and_then(Kind::from_char).ok_or_else(malformed)?;

        let rest = chars.as_str();
        let digits = match rest.find('[') {
            Some(i) if matches!(kind, Kind::DateTime | Kind::TimeDelta) && rest.ends_with(']') => {
                &rest[..i]
            }
            Some(_) => return Err(malformed()),
            None => rest,
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }

        let count: usize = digits.parse().map_err(|_| malformed())?;
        let itemsize = if kind == Kind::Unicode {
            count.checked_mul(4).ok_or_else(malformed)?
        } else {
            count
        };
        // The bit width has to be representable too
        itemsize.checked_mul(8).ok_or_else(malformed)?;

        Ok(DType::new(kind, itemsize, byteorder))
    }
}

/// Rust types which can be the element of a sample array.
pub trait Element: Copy + 'static {
    const DTYPE: DType;
}

macro_rules! impl_element {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::new(Kind::$kind, size_of::<$ty>(), ByteOrder::Native);
            }
        )*
    };
}

impl_element!(
    bool => Bool,
    u8 => Unsigned,
    u16 => Unsigned,
    u32 => Unsigned,
    u64 => Unsigned,
    i8 => Signed,
    i16 => Signed,
    i32 => Signed,
    i64 => Signed,
    f32 => Float,
    f64 => Float,
    Complex<f32> => Complex,
    Complex<f64> => Complex,
);

/// Anything holding samples whose element type can be described.
pub trait ArrayLike {
    fn dtype(&self) -> Result<DType, TypeError>;
}

impl<T: Element> ArrayLike for [T] {
    fn dtype(&self) -> Result<DType, TypeError> {
        Ok(T::DTYPE)
    }
}

impl<T: Element> ArrayLike for Vec<T> {
    fn dtype(&self) -> Result<DType, TypeError> {
        Ok(T::DTYPE)
    }
}

impl<T: Element, const N: usize> ArrayLike for [T; N] {
    fn dtype(&self) -> Result<DType, TypeError> {
        Ok(T::DTYPE)
    }
}

/// Dtype and shape of an array which is not held in memory as a Rust slice, for
/// example one described by a numpy `__array_interface__` mapping.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ArrayDescriptor {
    pub dtype: DType,
    pub shape: Vec<usize>,
}

impl ArrayDescriptor {
    pub fn new(dtype: DType, shape: Vec<usize>) -> Self {
        ArrayDescriptor { dtype, shape }
    }

    /// Reads `{"typestr": "<f4", "shape": [..]}`. A missing shape means a 0-d array.
    pub fn from_interface(value: &Value) -> Result<Self, TypeError> {
        let not_an_array = || TypeError::NotAnArray(value.to_string());

        let Value::Object(fields) = value else {
            return Err(not_an_array());
        };
        let dtype = fields
            .get("typestr")
            .and_then(Value::as_str)
            .ok_or_else(not_an_array)?
            .parse()?;

        let shape = match fields.get("shape") {
            None => Vec::new(),
            Some(Value::Array(dims)) => dims
                .iter()
                .map(|d| d.as_u64().and_then(|d| usize::try_from(d).ok()))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(not_an_array)?,
            Some(_) => return Err(not_an_array()),
        };
        let descriptor = ArrayDescriptor { dtype, shape };
        descriptor.len().ok_or_else(not_an_array)?;

        Ok(descriptor)
    }

    /// Number of items, `None` if the shape describes more than `usize::MAX`.
    pub fn len(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |total, &dim| total.checked_mul(dim))
    }

    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }
}

impl ArrayLike for ArrayDescriptor {
    fn dtype(&self) -> Result<DType, TypeError> {
        Ok(self.dtype)
    }
}

/// Metadata values are only arrays when they carry an array interface mapping.
impl ArrayLike for Value {
    fn dtype(&self) -> Result<DType, TypeError> {
        Ok(ArrayDescriptor::from_interface(self)?.dtype)
    }
}

#[cfg(test)]
mod dtype_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_endianness_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            Endianness::Little
        } else {
            Endianness::Big
        };
        assert_eq!(Endianness::host(), expected);
    }

    #[test]
    fn resolve_byteorder() {
        for host in [Endianness::Little, Endianness::Big] {
            assert_eq!(ByteOrder::Little.resolve(host), Endianness::Little);
            assert_eq!(ByteOrder::Big.resolve(host), Endianness::Big);
            assert_eq!(ByteOrder::Native.resolve(host), host);
            assert_eq!(ByteOrder::NotApplicable.resolve(host), host);
        }
    }

    #[test]
    fn element_dtypes() {
        assert_eq!(DType::of::<u8>().to_string(), "|u1");
        assert_eq!(DType::of::<i8>().to_string(), "|i1");
        assert_eq!(DType::of::<bool>().to_string(), "|b1");
        assert_eq!(DType::of::<i16>().to_string(), "=i2");
        assert_eq!(DType::of::<u64>().to_string(), "=u8");
        assert_eq!(DType::of::<f32>().to_string(), "=f4");
        assert_eq!(DType::of::<f64>().to_string(), "=f8");
        assert_eq!(DType::of::<Complex<f32>>().to_string(), "=c8");
        assert_eq!(DType::of::<Complex<f64>>().to_string(), "=c16");
    }

    #[test]
    fn parse_typestr() {
        let d: DType = "<f4".parse().unwrap();
        assert_eq!(d.kind(), Kind::Float);
        assert_eq!(d.itemsize(), 4);
        assert_eq!(d.byteorder(), ByteOrder::Little);

        let d: DType = ">c16".parse().unwrap();
        assert_eq!(d.kind(), Kind::Complex);
        assert_eq!(d.bits(), Some(128));
        assert_eq!(d.byteorder(), ByteOrder::Big);

        let d: DType = "<U4".parse().unwrap();
        assert_eq!(d.kind(), Kind::Unicode);
        assert_eq!(d.itemsize(), 16);
        assert_eq!(d.to_string(), "<U4");

        let d: DType = "<M8[ns]".parse().unwrap();
        assert_eq!(d.kind(), Kind::DateTime);
        assert_eq!(d.to_string(), "<M8");
    }

    #[test]
    fn single_byte_drops_byteorder() {
        let d: DType = ">u1".parse().unwrap();
        assert_eq!(d.byteorder(), ByteOrder::NotApplicable);
        assert_eq!(d, DType::of::<u8>());

        let d: DType = "<S8".parse().unwrap();
        assert_eq!(d.to_string(), "|S8");
    }

    #[test]
    fn parse_malformed_typestr() {
        for bad in ["", "<", "f4", "<x4", "<f", "<f4x", "<f+4", "<i4[ns]", "<M8[ns"] {
            assert_eq!(
                bad.parse::<DType>(),
                Err(TypeError::MalformedTypestr(bad.to_owned())),
                "{bad}"
            );
        }
    }

    #[test]
    fn slices_and_vecs_are_arrays() {
        let v = vec![1.0f64, 2.0];
        assert_eq!(v.dtype().unwrap(), DType::of::<f64>());
        assert_eq!(v.as_slice().dtype().unwrap(), DType::of::<f64>());
        assert_eq!([1i16; 4].dtype().unwrap(), DType::of::<i16>());
        let empty: [Complex<f32>; 0] = [];
        assert_eq!(empty.dtype().unwrap(), DType::of::<Complex<f32>>());
    }

    #[test]
    fn array_interface() {
        let desc = ArrayDescriptor::from_interface(&json!({"typestr": ">i2", "shape": [2, 3]}))
            .unwrap();
        assert_eq!(desc.dtype.to_string(), ">i2");
        assert_eq!(desc.shape, vec![2, 3]);
        assert_eq!(desc.len(), Some(6));
        assert!(!desc.is_empty());

        let scalar = ArrayDescriptor::from_interface(&json!({"typestr": "<f8"})).unwrap();
        assert!(scalar.shape.is_empty());
        assert_eq!(scalar.len(), Some(1));
    }

    #[test]
    fn oversized_items_are_rejected() {
        let huge = format!("<f{}", usize::MAX / 8 + 1);
        assert_eq!(
            huge.parse::<DType>(),
            Err(TypeError::MalformedTypestr(huge.clone()))
        );
        let largest = format!("<f{}", usize::MAX / 8);
        assert_eq!(
            largest.parse::<DType>().unwrap().bits(),
            Some(usize::MAX / 8 * 8)
        );
        assert_eq!(DType::new(Kind::Float, usize::MAX, ByteOrder::Little).bits(), None);
    }

    #[test]
    fn oversized_shapes_are_rejected() {
        let huge = json!({"typestr": "<f4", "shape": [u64::MAX, 2]});
        assert!(matches!(
            ArrayDescriptor::from_interface(&huge),
            Err(TypeError::NotAnArray(_))
        ));

        let desc = ArrayDescriptor::new(DType::of::<f32>(), vec![usize::MAX, 2]);
        assert_eq!(desc.len(), None);
        assert!(!desc.is_empty());
        assert!(ArrayDescriptor::new(DType::of::<f32>(), vec![usize::MAX, 0]).is_empty());
    }

    #[test]
    fn not_an_array() {
        for value in [
            json!(3),
            json!("hello"),
            json!([1, 2, 3]),
            json!({"shape": [3]}),
            json!({"typestr": "<f4", "shape": "3"}),
            json!({"typestr": "<f4", "shape": [-1]}),
        ] {
            assert!(matches!(value.dtype(), Err(TypeError::NotAnArray(_))), "{value}");
        }
    }

    #[test]
    fn interface_with_bad_typestr() {
        assert_eq!(
            json!({"typestr": "nope"}).dtype(),
            Err(TypeError::MalformedTypestr("nope".to_owned()))
        );
    }
}
