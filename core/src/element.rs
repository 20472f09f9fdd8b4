//! The in-memory data element: a tag, a value representation and a
//! primitive value, kept mutually consistent.

use crate::header::{DataElementHeader, Length, Tag, VR};
use crate::value::{CastValueError, ConvertValueError, PrimitiveValue, ValueType};
use snafu::{ensure, Snafu};
use std::borrow::Cow;

/// An error raised when assigning a value that breaks a data element's
/// internal consistency.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[non_exhaustive]
pub enum InvalidValueError {
    /// The declared component count does not match the actual value.
    #[snafu(display("declared {} value components, but the value holds {}", declared, actual))]
    CountMismatch {
        /// the count declared by the caller
        declared: u32,
        /// the multiplicity of the provided value
        actual: u32,
    },
    /// The value kind cannot be encoded under the element's VR.
    #[snafu(display("a `{}` value cannot be encoded as {}", kind, vr))]
    IncompatibleVr {
        /// the element's value representation
        vr: VR,
        /// the kind of the rejected value
        kind: ValueType,
    },
}

/// A data element fully resident in memory: one attribute tag, its value
/// representation and its primitive value.
///
/// The declared length always tracks the value: value-replacing
/// operations update both together, or fail leaving the element
/// untouched. Mutating an element never affects any data set it was
/// retrieved from; put the element back to make a change visible.
#[derive(Debug, PartialEq, Clone)]
pub struct DataElement {
    header: DataElementHeader,
    value: PrimitiveValue,
}

impl DataElement {
    /// Create a data element from the given parts,
    /// deriving the length from the value's byte length.
    ///
    /// This constructor does not check that the value representation is
    /// compatible with the value; see [`validate`](Self::validate).
    pub fn new<T>(tag: Tag, vr: VR, value: T) -> Self
    where
        T: Into<PrimitiveValue>,
    {
        let value = value.into();
        DataElement {
            header: DataElementHeader {
                tag,
                vr,
                len: Length(value.byte_len() as u32),
            },
            value,
        }
    }

    /// Create a data element with an explicitly given length,
    /// as when materializing an element decoded from a stream.
    pub fn new_with_len<T>(tag: Tag, vr: VR, len: Length, value: T) -> Self
    where
        T: Into<PrimitiveValue>,
    {
        DataElement {
            header: DataElementHeader { tag, vr, len },
            value: value.into(),
        }
    }

    /// Create an empty data element.
    pub fn empty(tag: Tag, vr: VR) -> Self {
        DataElement {
            header: DataElementHeader {
                tag,
                vr,
                len: Length(0),
            },
            value: PrimitiveValue::Empty,
        }
    }

    /// Retrieve the element header.
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// The element's attribute tag.
    #[inline]
    pub fn tag(&self) -> Tag {
        self.header.tag
    }

    /// The element's value representation.
    #[inline]
    pub fn vr(&self) -> VR {
        self.header.vr
    }

    /// The element's declared value length.
    #[inline]
    pub fn length(&self) -> Length {
        self.header.len
    }

    /// Retrieve the element's value.
    pub fn value(&self) -> &PrimitiveValue {
        &self.value
    }

    /// Move the value out of the element, discarding the rest.
    pub fn into_value(self) -> PrimitiveValue {
        self.value
    }

    /// Override the element's value representation.
    ///
    /// The value is left as is: overriding the VR is the explicit opt-out
    /// from the compatibility check in a subsequent [`set_array`] call.
    ///
    /// [`set_array`]: Self::set_array
    pub fn set_vr(&mut self, vr: VR) {
        self.header.vr = vr;
    }

    /// Replace the element's value, updating the declared length to the
    /// new value's byte length in the same operation.
    pub fn set_value<T>(&mut self, value: T)
    where
        T: Into<PrimitiveValue>,
    {
        let value = value.into();
        self.header.len = Length(value.byte_len() as u32);
        self.value = value;
    }

    /// Store a multi-component value, declaring its component count.
    ///
    /// Fails without touching the element when `count` differs from the
    /// value's actual multiplicity, or when the value kind cannot be
    /// encoded under the element's current VR (use [`set_vr`] first to
    /// override the representation deliberately).
    ///
    /// [`set_vr`]: Self::set_vr
    pub fn set_array<T>(&mut self, value: T, count: usize) -> Result<(), InvalidValueError>
    where
        T: Into<PrimitiveValue>,
    {
        let value = value.into();
        let actual = value.multiplicity();
        ensure!(
            count as u32 == actual,
            CountMismatchSnafu {
                declared: count as u32,
                actual,
            }
        );
        ensure!(
            vr_accepts(self.header.vr, &value),
            IncompatibleVrSnafu {
                vr: self.header.vr,
                kind: value.value_type(),
            }
        );
        self.set_value(value);
        Ok(())
    }

    /// Check that the element's VR and value kind form a valid pairing,
    /// as required before serialization.
    pub fn validate(&self) -> Result<(), InvalidValueError> {
        ensure!(
            vr_accepts(self.header.vr, &self.value),
            IncompatibleVrSnafu {
                vr: self.header.vr,
                kind: self.value.value_type(),
            }
        );
        Ok(())
    }

    /// Render the element's value as a single string.
    pub fn to_str(&self) -> Cow<str> {
        self.value.to_str()
    }

    /// Retrieve the element's value as raw bytes, when representable.
    pub fn to_bytes(&self) -> Result<Cow<[u8]>, CastValueError> {
        self.value.to_bytes()
    }

    /// Convert the element's first value component to an integer.
    pub fn to_int<T>(&self) -> Result<T, ConvertValueError>
    where
        T: num_traits::NumCast,
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        self.value.to_int()
    }

    /// Convert the element's value components to single precision floats.
    pub fn to_multi_float32(&self) -> Result<Vec<f32>, ConvertValueError> {
        self.value.to_multi_float32()
    }

    /// Convert the element's value components to double precision floats.
    pub fn to_multi_float64(&self) -> Result<Vec<f64>, ConvertValueError> {
        self.value.to_multi_float64()
    }
}

/// The closed compatibility table between value representations and the
/// value kinds that may be serialized under them.
fn vr_accepts(vr: VR, value: &PrimitiveValue) -> bool {
    use PrimitiveValue as P;
    match value {
        P::Empty => true,
        P::Str(_) | P::Strs(_) => vr.is_text(),
        P::U8(_) => matches!(vr, VR::OB | VR::UN),
        P::I16(_) => matches!(vr, VR::SS),
        P::U16(_) => matches!(vr, VR::US | VR::OW),
        P::I32(_) => matches!(vr, VR::SL),
        P::U32(_) => matches!(vr, VR::UL | VR::OL),
        P::F32(_) => matches!(vr, VR::FL | VR::OF),
        P::F64(_) => matches!(vr, VR::FD | VR::OD),
        P::Tags(_) => matches!(vr, VR::AT),
    }
}
