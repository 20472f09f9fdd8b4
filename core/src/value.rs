//! Primitive value representations for data elements.
//!
//! A [`PrimitiveValue`] is a tagged union over every value kind this
//! toolkit keeps in memory: character strings, fixed-width binary
//! numbers, attribute tags, or plain bytes. Multiplicity is first class,
//! each variant holding a small vector of components.

use crate::header::Tag;
use num_traits::NumCast;
use smallvec::SmallVec;
use snafu::Snafu;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// The type of a collection of multiple values,
/// kept inline for the common low-multiplicity case.
pub type C<T> = SmallVec<[T; 2]>;

/// A discriminant of [`PrimitiveValue`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// No value.
    Empty,
    /// A single string.
    Str,
    /// A sequence of strings.
    Strs,
    /// A sequence of unsigned 8-bit integers (or raw bytes).
    U8,
    /// A sequence of signed 16-bit integers.
    I16,
    /// A sequence of unsigned 16-bit integers.
    U16,
    /// A sequence of signed 32-bit integers.
    I32,
    /// A sequence of unsigned 32-bit integers.
    U32,
    /// A sequence of 32-bit floating point numbers.
    F32,
    /// A sequence of 64-bit floating point numbers.
    F64,
    /// A sequence of attribute tags.
    Tags,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ValueType::Empty => "Empty",
            ValueType::Str => "Str",
            ValueType::Strs => "Strs",
            ValueType::U8 => "U8",
            ValueType::I16 => "I16",
            ValueType::U16 => "U16",
            ValueType::I32 => "I32",
            ValueType::U32 => "U32",
            ValueType::F32 => "F32",
            ValueType::F64 => "F64",
            ValueType::Tags => "Tags",
        };
        f.write_str(name)
    }
}

/// An error raised when accessing a value under the wrong variant.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(display("heterogeneous value access: requested `{}` but value is `{}`", requested, got))]
pub struct CastValueError {
    /// the name of the variant requested by the caller
    pub requested: &'static str,
    /// the actual variant of the value
    pub got: ValueType,
}

/// An error raised when a value could not be converted
/// to the requested type.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(display(
    "could not convert `{}` value to `{}`{}",
    original,
    requested,
    cause.as_deref().map(|c| format!(": {}", c)).unwrap_or_default()
))]
pub struct ConvertValueError {
    /// the name of the type requested by the caller
    pub requested: &'static str,
    /// the variant of the original value
    pub original: ValueType,
    /// an underlying parse or cast failure, if any
    pub cause: Option<String>,
}

/// An in-memory value of a primitive (non-nested) data element.
///
/// String components are kept already stripped of trailing padding.
/// The byte length a value would occupy on the wire, including the
/// mandatory even-length padding, is available through [`byte_len`].
///
/// Note: for string variants, the byte length of the text encoded in
/// UTF-8 is assumed, which matches the wire length for ASCII content;
/// serialization derives the definitive length from the encoded bytes.
///
/// [`byte_len`]: PrimitiveValue::byte_len
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    /// No value. The value length is zero.
    Empty,
    /// A single string, used by text block representations.
    Str(String),
    /// One or more string components.
    Strs(C<String>),
    /// One or more unsigned 8-bit integers, also raw byte data.
    U8(C<u8>),
    /// One or more signed 16-bit integers.
    I16(C<i16>),
    /// One or more unsigned 16-bit integers.
    U16(C<u16>),
    /// One or more signed 32-bit integers.
    I32(C<i32>),
    /// One or more unsigned 32-bit integers.
    U32(C<u32>),
    /// One or more 32-bit floating point numbers.
    F32(C<f32>),
    /// One or more 64-bit floating point numbers.
    F64(C<f64>),
    /// One or more attribute tags.
    Tags(C<Tag>),
}

impl PrimitiveValue {
    /// Retrieve the discriminant of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            PrimitiveValue::Empty => ValueType::Empty,
            PrimitiveValue::Str(_) => ValueType::Str,
            PrimitiveValue::Strs(_) => ValueType::Strs,
            PrimitiveValue::U8(_) => ValueType::U8,
            PrimitiveValue::I16(_) => ValueType::I16,
            PrimitiveValue::U16(_) => ValueType::U16,
            PrimitiveValue::I32(_) => ValueType::I32,
            PrimitiveValue::U32(_) => ValueType::U32,
            PrimitiveValue::F32(_) => ValueType::F32,
            PrimitiveValue::F64(_) => ValueType::F64,
            PrimitiveValue::Tags(_) => ValueType::Tags,
        }
    }

    /// The number of individual components in this value.
    pub fn multiplicity(&self) -> u32 {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::Str(_) => 1,
            PrimitiveValue::Strs(v) => v.len() as u32,
            PrimitiveValue::U8(v) => v.len() as u32,
            PrimitiveValue::I16(v) => v.len() as u32,
            PrimitiveValue::U16(v) => v.len() as u32,
            PrimitiveValue::I32(v) => v.len() as u32,
            PrimitiveValue::U32(v) => v.len() as u32,
            PrimitiveValue::F32(v) => v.len() as u32,
            PrimitiveValue::F64(v) => v.len() as u32,
            PrimitiveValue::Tags(v) => v.len() as u32,
        }
    }

    /// The number of bytes this value occupies when serialized,
    /// including the trailing padding byte that keeps lengths even.
    pub fn byte_len(&self) -> usize {
        match self {
            PrimitiveValue::Empty => 0,
            PrimitiveValue::U8(v) => v.len() + (v.len() & 1),
            PrimitiveValue::I16(v) => v.len() * 2,
            PrimitiveValue::U16(v) => v.len() * 2,
            PrimitiveValue::I32(v) => v.len() * 4,
            PrimitiveValue::U32(v) => v.len() * 4,
            PrimitiveValue::F32(v) => v.len() * 4,
            PrimitiveValue::F64(v) => v.len() * 8,
            PrimitiveValue::Tags(v) => v.len() * 4,
            PrimitiveValue::Str(s) => s.len() + (s.len() & 1),
            PrimitiveValue::Strs(v) => {
                let total: usize =
                    v.iter().map(String::len).sum::<usize>() + v.len().saturating_sub(1);
                total + (total & 1)
            }
        }
    }

    /// Whether this value holds nothing.
    pub fn is_empty(&self) -> bool {
        self.multiplicity() == 0
    }

    /// Render the full value as a single string,
    /// joining multiple components with backslash.
    pub fn to_str(&self) -> Cow<str> {
        fn join<T: fmt::Display>(parts: &[T]) -> String {
            let mut out = String::new();
            for (i, p) in parts.iter().enumerate() {
                if i > 0 {
                    out.push('\\');
                }
                out.push_str(&p.to_string());
            }
            out
        }
        match self {
            PrimitiveValue::Empty => Cow::from(""),
            PrimitiveValue::Str(s) => Cow::from(s.as_str()),
            PrimitiveValue::Strs(v) if v.len() == 1 => Cow::from(v[0].as_str()),
            PrimitiveValue::Strs(v) => Cow::from(join(v)),
            PrimitiveValue::U8(v) => Cow::from(join(v)),
            PrimitiveValue::I16(v) => Cow::from(join(v)),
            PrimitiveValue::U16(v) => Cow::from(join(v)),
            PrimitiveValue::I32(v) => Cow::from(join(v)),
            PrimitiveValue::U32(v) => Cow::from(join(v)),
            PrimitiveValue::F32(v) => Cow::from(join(v)),
            PrimitiveValue::F64(v) => Cow::from(join(v)),
            PrimitiveValue::Tags(v) => Cow::from(join(v)),
        }
    }

    /// Retrieve the value as its raw bytes,
    /// available for byte and string variants.
    pub fn to_bytes(&self) -> Result<Cow<[u8]>, CastValueError> {
        match self {
            PrimitiveValue::Empty => Ok(Cow::from(&[][..])),
            PrimitiveValue::U8(v) => Ok(Cow::from(&v[..])),
            PrimitiveValue::Str(s) => Ok(Cow::from(s.as_bytes())),
            PrimitiveValue::Strs(_) => Ok(Cow::from(self.to_str().into_owned().into_bytes())),
            other => Err(CastValueError {
                requested: "bytes",
                got: other.value_type(),
            }),
        }
    }

    /// Get the single string of this value, if it is a `Str`.
    pub fn string(&self) -> Result<&str, CastValueError> {
        match self {
            PrimitiveValue::Str(s) => Ok(s),
            other => Err(CastValueError {
                requested: "Str",
                got: other.value_type(),
            }),
        }
    }

    /// Get the sequence of string components, if the value is a `Strs`.
    pub fn strings(&self) -> Result<&[String], CastValueError> {
        match self {
            PrimitiveValue::Strs(v) => Ok(v),
            other => Err(CastValueError {
                requested: "Strs",
                got: other.value_type(),
            }),
        }
    }

    /// Get the unsigned 8-bit components without conversion.
    pub fn uint8_slice(&self) -> Result<&[u8], CastValueError> {
        match self {
            PrimitiveValue::U8(v) => Ok(v),
            other => Err(CastValueError {
                requested: "U8",
                got: other.value_type(),
            }),
        }
    }

    /// Get the signed 16-bit components without conversion.
    pub fn int16_slice(&self) -> Result<&[i16], CastValueError> {
        match self {
            PrimitiveValue::I16(v) => Ok(v),
            other => Err(CastValueError {
                requested: "I16",
                got: other.value_type(),
            }),
        }
    }

    /// Get the unsigned 16-bit components without conversion.
    pub fn uint16_slice(&self) -> Result<&[u16], CastValueError> {
        match self {
            PrimitiveValue::U16(v) => Ok(v),
            other => Err(CastValueError {
                requested: "U16",
                got: other.value_type(),
            }),
        }
    }

    /// Get the signed 32-bit components without conversion.
    pub fn int32_slice(&self) -> Result<&[i32], CastValueError> {
        match self {
            PrimitiveValue::I32(v) => Ok(v),
            other => Err(CastValueError {
                requested: "I32",
                got: other.value_type(),
            }),
        }
    }

    /// Get the unsigned 32-bit components without conversion.
    pub fn uint32_slice(&self) -> Result<&[u32], CastValueError> {
        match self {
            PrimitiveValue::U32(v) => Ok(v),
            other => Err(CastValueError {
                requested: "U32",
                got: other.value_type(),
            }),
        }
    }

    /// Get the 32-bit floating point components without conversion.
    pub fn float32_slice(&self) -> Result<&[f32], CastValueError> {
        match self {
            PrimitiveValue::F32(v) => Ok(v),
            other => Err(CastValueError {
                requested: "F32",
                got: other.value_type(),
            }),
        }
    }

    /// Get the 64-bit floating point components without conversion.
    pub fn float64_slice(&self) -> Result<&[f64], CastValueError> {
        match self {
            PrimitiveValue::F64(v) => Ok(v),
            other => Err(CastValueError {
                requested: "F64",
                got: other.value_type(),
            }),
        }
    }

    /// Get the attribute tag components without conversion.
    pub fn tags(&self) -> Result<&[Tag], CastValueError> {
        match self {
            PrimitiveValue::Tags(v) => Ok(v),
            other => Err(CastValueError {
                requested: "Tags",
                got: other.value_type(),
            }),
        }
    }

    /// Convert the first component to an integer,
    /// parsing string values in decimal notation.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: NumCast,
        T: FromStr<Err = std::num::ParseIntError>,
    {
        let missing = || ConvertValueError {
            requested: "integer",
            original: self.value_type(),
            cause: Some("no value component".into()),
        };
        match self {
            PrimitiveValue::Str(s) => s.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConvertValueError {
                    requested: "integer",
                    original: self.value_type(),
                    cause: Some(e.to_string()),
                }
            }),
            PrimitiveValue::Strs(v) => v
                .first()
                .ok_or_else(missing)?
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| ConvertValueError {
                    requested: "integer",
                    original: self.value_type(),
                    cause: Some(e.to_string()),
                }),
            PrimitiveValue::U8(v) => cast_first(v, self.value_type()),
            PrimitiveValue::I16(v) => cast_first(v, self.value_type()),
            PrimitiveValue::U16(v) => cast_first(v, self.value_type()),
            PrimitiveValue::I32(v) => cast_first(v, self.value_type()),
            PrimitiveValue::U32(v) => cast_first(v, self.value_type()),
            PrimitiveValue::F32(v) => cast_first(v, self.value_type()),
            PrimitiveValue::F64(v) => cast_first(v, self.value_type()),
            _ => Err(ConvertValueError {
                requested: "integer",
                original: self.value_type(),
                cause: None,
            }),
        }
    }

    /// Convert the first component to a single precision float,
    /// parsing string values in decimal notation.
    pub fn to_float32(&self) -> Result<f32, ConvertValueError> {
        self.to_multi_float32()?
            .into_iter()
            .next()
            .ok_or_else(|| ConvertValueError {
                requested: "f32",
                original: self.value_type(),
                cause: Some("no value component".into()),
            })
    }

    /// Convert all components to single precision floats,
    /// parsing string values in decimal notation.
    pub fn to_multi_float32(&self) -> Result<Vec<f32>, ConvertValueError> {
        let err = |cause: Option<String>| ConvertValueError {
            requested: "f32",
            original: self.value_type(),
            cause,
        };
        match self {
            PrimitiveValue::F32(v) => Ok(v.to_vec()),
            PrimitiveValue::F64(v) => Ok(v.iter().map(|x| *x as f32).collect()),
            PrimitiveValue::U8(v) => Ok(v.iter().map(|x| <f32 as From<_>>::from(*x)).collect()),
            PrimitiveValue::I16(v) => Ok(v.iter().map(|x| <f32 as From<_>>::from(*x)).collect()),
            PrimitiveValue::U16(v) => Ok(v.iter().map(|x| <f32 as From<_>>::from(*x)).collect()),
            PrimitiveValue::I32(v) => Ok(v.iter().map(|x| *x as f32).collect()),
            PrimitiveValue::U32(v) => Ok(v.iter().map(|x| *x as f32).collect()),
            PrimitiveValue::Str(s) => parse_components(std::slice::from_ref(s))
                .map_err(|e| err(Some(e))),
            PrimitiveValue::Strs(v) => parse_components(v).map_err(|e| err(Some(e))),
            _ => Err(err(None)),
        }
    }

    /// Convert the first component to a double precision float,
    /// parsing string values in decimal notation.
    pub fn to_float64(&self) -> Result<f64, ConvertValueError> {
        self.to_multi_float64()?
            .into_iter()
            .next()
            .ok_or_else(|| ConvertValueError {
                requested: "f64",
                original: self.value_type(),
                cause: Some("no value component".into()),
            })
    }

    /// Convert all components to double precision floats,
    /// parsing string values in decimal notation.
    pub fn to_multi_float64(&self) -> Result<Vec<f64>, ConvertValueError> {
        let err = |cause: Option<String>| ConvertValueError {
            requested: "f64",
            original: self.value_type(),
            cause,
        };
        match self {
            PrimitiveValue::F64(v) => Ok(v.to_vec()),
            PrimitiveValue::F32(v) => Ok(v.iter().map(|x| <f64 as From<_>>::from(*x)).collect()),
            PrimitiveValue::U8(v) => Ok(v.iter().map(|x| <f64 as From<_>>::from(*x)).collect()),
            PrimitiveValue::I16(v) => Ok(v.iter().map(|x| <f64 as From<_>>::from(*x)).collect()),
            PrimitiveValue::U16(v) => Ok(v.iter().map(|x| <f64 as From<_>>::from(*x)).collect()),
            PrimitiveValue::I32(v) => Ok(v.iter().map(|x| <f64 as From<_>>::from(*x)).collect()),
            PrimitiveValue::U32(v) => Ok(v.iter().map(|x| <f64 as From<_>>::from(*x)).collect()),
            PrimitiveValue::Str(s) => parse_components(std::slice::from_ref(s))
                .map_err(|e| err(Some(e))),
            PrimitiveValue::Strs(v) => parse_components(v).map_err(|e| err(Some(e))),
            _ => Err(err(None)),
        }
    }
}

fn cast_first<T, U>(values: &[U], original: ValueType) -> Result<T, ConvertValueError>
where
    T: NumCast,
    U: Copy + num_traits::ToPrimitive,
{
    let first = *values.first().ok_or(ConvertValueError {
        requested: "integer",
        original,
        cause: Some("no value component".into()),
    })?;
    NumCast::from(first).ok_or(ConvertValueError {
        requested: "integer",
        original,
        cause: Some("out of range".into()),
    })
}

fn parse_components<T: FromStr>(parts: &[String]) -> Result<Vec<T>, String>
where
    T::Err: fmt::Display,
{
    parts
        .iter()
        .map(|s| s.trim().parse().map_err(|e: T::Err| e.to_string()))
        .collect()
}

impl From<String> for PrimitiveValue {
    fn from(s: String) -> Self {
        PrimitiveValue::Strs(smallvec::smallvec![s])
    }
}

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        PrimitiveValue::Strs(smallvec::smallvec![s.to_owned()])
    }
}

impl From<Vec<String>> for PrimitiveValue {
    fn from(v: Vec<String>) -> Self {
        PrimitiveValue::Strs(v.into())
    }
}

impl From<Tag> for PrimitiveValue {
    fn from(v: Tag) -> Self {
        PrimitiveValue::Tags(smallvec::smallvec![v])
    }
}

macro_rules! impl_from_numeric {
    ($base: ty, $variant: ident) => {
        impl From<$base> for PrimitiveValue {
            fn from(v: $base) -> Self {
                PrimitiveValue::$variant(smallvec::smallvec![v])
            }
        }
        impl From<Vec<$base>> for PrimitiveValue {
            fn from(v: Vec<$base>) -> Self {
                PrimitiveValue::$variant(v.into())
            }
        }
        impl From<&[$base]> for PrimitiveValue {
            fn from(v: &[$base]) -> Self {
                PrimitiveValue::$variant(SmallVec::from_slice(v))
            }
        }
    };
}

impl_from_numeric!(u8, U8);
impl_from_numeric!(i16, I16);
impl_from_numeric!(u16, U16);
impl_from_numeric!(i32, I32);
impl_from_numeric!(u32, U32);
impl_from_numeric!(f32, F32);
impl_from_numeric!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn multiplicity_and_byte_len() {
        assert_eq!(PrimitiveValue::Empty.multiplicity(), 0);
        assert_eq!(PrimitiveValue::Empty.byte_len(), 0);

        let v = PrimitiveValue::from(vec![1.5f32, 2.5, 3.5]);
        assert_eq!(v.multiplicity(), 3);
        assert_eq!(v.byte_len(), 12);

        // odd byte counts are padded to even
        let v = PrimitiveValue::from(vec![0u8, 1, 2]);
        assert_eq!(v.byte_len(), 4);
        let v = PrimitiveValue::Str("1.2.840.10008.1.2.1".into());
        assert_eq!(v.byte_len(), 20);
        let v = PrimitiveValue::Strs(smallvec!["AB".to_owned(), "CDE".to_owned()]);
        // "AB\CDE" is 6 bytes, already even
        assert_eq!(v.byte_len(), 6);
    }

    #[test]
    fn to_str_joins_components() {
        let v = PrimitiveValue::from(vec![256u16, 0, 16]);
        assert_eq!(v.to_str(), "256\\0\\16");
        let v = PrimitiveValue::Strs(smallvec!["DERIVED".to_owned(), "PRIMARY".to_owned()]);
        assert_eq!(v.to_str(), "DERIVED\\PRIMARY");
        assert_eq!(PrimitiveValue::Empty.to_str(), "");
    }

    #[test]
    fn numeric_conversions() {
        let v = PrimitiveValue::from("42");
        assert_eq!(v.to_int::<i32>().unwrap(), 42);
        let v = PrimitiveValue::from(vec!["0.5".to_owned(), "1.5".to_owned()]);
        assert_eq!(v.to_multi_float64().unwrap(), vec![0.5, 1.5]);
        let v = PrimitiveValue::from(vec![1u16, 2, 3]);
        assert_eq!(v.to_multi_float32().unwrap(), vec![1.0, 2.0, 3.0]);

        let bad = PrimitiveValue::from("not a number");
        assert!(bad.to_int::<i32>().is_err());
    }

    #[test]
    fn strict_getters_check_the_variant() {
        let v = PrimitiveValue::from(vec![0.25f32]);
        assert_eq!(v.float32_slice().unwrap(), &[0.25]);
        let err = v.uint16_slice().unwrap_err();
        assert_eq!(err.requested, "U16");
        assert_eq!(err.got, ValueType::F32);
    }
}
