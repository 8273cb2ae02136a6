//! Native argument values and their foreign-side counterparts.
//!
//! [`Arg`] is the tagged value the caller builds; [`ForeignValue`] is what a
//! [`ForeignRuntime`](super::ForeignRuntime) receives after conversion.
//! Only the types listed here convert into an [`Arg`], so passing anything
//! else to a marshaled call fails at compile time.

use std::borrow::Cow;
use std::fmt;

/// Opaque reference to an object living in the foreign runtime.
///
/// The bridge never interprets the raw value; it only hands it back to the
/// runtime that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// Wrap a raw runtime reference.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw runtime reference.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// A primitive array argument, already narrowed to the element type the
/// foreign side expects.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayArg<'a> {
    /// One-byte elements (`[B`).
    Byte(Cow<'a, [u8]>),
    /// Four-byte integral elements (`[I`).
    Int(Cow<'a, [i32]>),
    /// Eight-byte integral elements (`[J`).
    Long(Cow<'a, [i64]>),
    /// Four-byte floating point elements (`[F`).
    Float(Cow<'a, [f32]>),
    /// Eight-byte floating point elements (`[D`).
    Double(Cow<'a, [f64]>),
}

impl ArrayArg<'_> {
    /// Number of elements in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            ArrayArg::Byte(v) => v.len(),
            ArrayArg::Int(v) => v.len(),
            ArrayArg::Long(v) => v.len(),
            ArrayArg::Float(v) => v.len(),
            ArrayArg::Double(v) => v.len(),
        }
    }

    /// Check if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Element types that can be marshaled as a primitive array.
///
/// The array kind is chosen by element size and kind: 1-byte types become a
/// byte array, 4- and 8-byte integers become int and long arrays, and the
/// two float widths become float and double arrays. Unsigned integers are
/// reinterpreted bit-for-bit.
pub trait ArrayElement: Copy + sealed::Sealed {
    /// Build the array argument for a slice of this element type.
    fn array_arg(items: &[Self]) -> ArrayArg<'_>;
}

macro_rules! borrowed_element {
    ($ty:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}
        impl ArrayElement for $ty {
            fn array_arg(items: &[Self]) -> ArrayArg<'_> {
                ArrayArg::$variant(Cow::Borrowed(items))
            }
        }
    };
}

macro_rules! reinterpreted_element {
    ($ty:ty, $target:ty, $variant:ident) => {
        impl sealed::Sealed for $ty {}
        impl ArrayElement for $ty {
            fn array_arg(items: &[Self]) -> ArrayArg<'_> {
                ArrayArg::$variant(Cow::Owned(items.iter().map(|&v| v as $target).collect()))
            }
        }
    };
}

borrowed_element!(u8, Byte);
borrowed_element!(i32, Int);
borrowed_element!(i64, Long);
borrowed_element!(f32, Float);
borrowed_element!(f64, Double);
reinterpreted_element!(i8, u8, Byte);
reinterpreted_element!(u32, i32, Int);
reinterpreted_element!(u64, i64, Long);

/// A statically-typed argument for a marshaled call.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'a> {
    /// Boolean (`Z`).
    Bool(bool),
    /// 8-bit character (`C`), widened to a 16-bit foreign char.
    Char(u8),
    /// Unsigned byte (`B`).
    Byte(u8),
    /// 16-bit integer (`S`).
    Short(i16),
    /// 32-bit integer (`I`).
    Int(i32),
    /// 64-bit integer (`J`).
    Long(i64),
    /// 32-bit float (`F`).
    Float(f32),
    /// 64-bit float (`D`).
    Double(f64),
    /// Text, marshaled as a foreign string.
    Text(&'a str),
    /// List of strings, marshaled as a foreign string array.
    StringList(&'a [String]),
    /// Primitive array.
    Array(ArrayArg<'a>),
}

impl<'a> Arg<'a> {
    /// Build an array argument from any supported element slice.
    #[must_use]
    pub fn array<T: ArrayElement>(items: &'a [T]) -> Self {
        Arg::Array(T::array_arg(items))
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Arg<'_> {
                fn from(value: $ty) -> Self {
                    Arg::$variant(value)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
}

impl From<i8> for Arg<'_> {
    fn from(value: i8) -> Self {
        Arg::Byte(value as u8)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Text(value)
    }
}

impl<'a> From<&'a String> for Arg<'a> {
    fn from(value: &'a String) -> Self {
        Arg::Text(value.as_str())
    }
}

impl<'a> From<&'a [String]> for Arg<'a> {
    fn from(value: &'a [String]) -> Self {
        Arg::StringList(value)
    }
}

impl<'a> From<&'a Vec<String>> for Arg<'a> {
    fn from(value: &'a Vec<String>) -> Self {
        Arg::StringList(value.as_slice())
    }
}

macro_rules! array_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> From<&'a [$ty]> for Arg<'a> {
                fn from(value: &'a [$ty]) -> Self {
                    Arg::array(value)
                }
            }

            impl<'a> From<&'a Vec<$ty>> for Arg<'a> {
                fn from(value: &'a Vec<$ty>) -> Self {
                    Arg::array(value.as_slice())
                }
            }
        )*
    };
}

array_from!(u8, i8, i32, u32, i64, u64, f32, f64);

/// Return kind of a marshaled call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    /// No value (`V`).
    Void,
    /// Boolean (`Z`).
    Bool,
    /// 32-bit integer (`I`).
    Int,
    /// 64-bit integer (`J`).
    Long,
    /// 32-bit float (`F`).
    Float,
    /// 64-bit float (`D`).
    Double,
    /// String reference.
    String,
    /// Byte array reference (`[B`).
    ByteArray,
}

/// A value in the foreign runtime's call representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForeignValue {
    /// No value.
    Void,
    /// Boolean.
    Bool(bool),
    /// 16-bit unsigned char.
    Char(u16),
    /// Signed byte.
    Byte(i8),
    /// 16-bit integer.
    Short(i16),
    /// 32-bit integer.
    Int(i32),
    /// 64-bit integer.
    Long(i64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// Object reference, `None` for null.
    Object(Option<ObjectRef>),
}

impl ForeignValue {
    /// Name of the variant, for diagnostics.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            ForeignValue::Void => "void",
            ForeignValue::Bool(_) => "boolean",
            ForeignValue::Char(_) => "char",
            ForeignValue::Byte(_) => "byte",
            ForeignValue::Short(_) => "short",
            ForeignValue::Int(_) => "int",
            ForeignValue::Long(_) => "long",
            ForeignValue::Float(_) => "float",
            ForeignValue::Double(_) => "double",
            ForeignValue::Object(_) => "object",
        }
    }
}
