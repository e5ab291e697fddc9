//! # Data Types
//!
//! The dtype model used by dtype schemas and by the array accessor
//! contract. A [`DType`] is a concrete element type; a [`DTypeCategory`] is
//! an abstract node of the scalar hierarchy ("any floating", "any integer");
//! a [`DTypeSpec`] is either, and is what a schema expects.
//!
//! ## Text Form
//!
//! Concrete dtypes render as array-protocol type strings: a byte-order
//! character followed by a kind code and an item size (`<i4`, `|b1`,
//! `<U5`, `<M8[ns]`). Parsing accepts any byte-order prefix, the bare code,
//! or the long name (`int32`, `float64`, `datetime64[ns]`).
//!
//! ## Subtype Relation
//!
//! ```text
//! generic
//! ├── number
//! │   ├── integer
//! │   │   ├── signedinteger    int8..int64, timedelta64
//! │   │   └── unsignedinteger  uint8..uint64
//! │   └── inexact
//! │       ├── floating         float16..float64
//! │       └── complexfloating  complex64, complex128
//! ├── flexible
//! │   └── character            str, bytes
//! └── bool, datetime64, object
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConstructionError;

/// Resolution of a datetime or timedelta dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
    Picosecond,
    Femtosecond,
    Attosecond,
}

impl TimeUnit {
    /// The unit code used inside `[...]`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "Y",
            Self::Month => "M",
            Self::Week => "W",
            Self::Day => "D",
            Self::Hour => "h",
            Self::Minute => "m",
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "us",
            Self::Nanosecond => "ns",
            Self::Picosecond => "ps",
            Self::Femtosecond => "fs",
            Self::Attosecond => "as",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Y" => Ok(Self::Year),
            "M" => Ok(Self::Month),
            "W" => Ok(Self::Week),
            "D" => Ok(Self::Day),
            "h" => Ok(Self::Hour),
            "m" => Ok(Self::Minute),
            "s" => Ok(Self::Second),
            "ms" => Ok(Self::Millisecond),
            "us" => Ok(Self::Microsecond),
            "ns" => Ok(Self::Nanosecond),
            "ps" => Ok(Self::Picosecond),
            "fs" => Ok(Self::Femtosecond),
            "as" => Ok(Self::Attosecond),
            other => Err(ConstructionError::UnknownDType(format!("[{other}]"))),
        }
    }
}

/// A concrete element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Complex64,
    Complex128,
    /// Fixed-width unicode string; width in characters.
    Str(usize),
    /// Fixed-width byte string; width in bytes.
    Bytes(usize),
    DateTime(Option<TimeUnit>),
    TimeDelta(Option<TimeUnit>),
    Object,
}

impl DType {
    /// The array-protocol type string, e.g. `<i4`.
    pub fn typestr(&self) -> String {
        match self {
            Self::Bool => "|b1".into(),
            Self::Int8 => "|i1".into(),
            Self::Int16 => "<i2".into(),
            Self::Int32 => "<i4".into(),
            Self::Int64 => "<i8".into(),
            Self::UInt8 => "|u1".into(),
            Self::UInt16 => "<u2".into(),
            Self::UInt32 => "<u4".into(),
            Self::UInt64 => "<u8".into(),
            Self::Float16 => "<f2".into(),
            Self::Float32 => "<f4".into(),
            Self::Float64 => "<f8".into(),
            Self::Complex64 => "<c8".into(),
            Self::Complex128 => "<c16".into(),
            Self::Str(width) => format!("<U{width}"),
            Self::Bytes(width) => format!("|S{width}"),
            Self::DateTime(unit) => with_unit("<M8", unit),
            Self::TimeDelta(unit) => with_unit("<m8", unit),
            Self::Object => "|O".into(),
        }
    }

    /// Whether `self` and `other` have the same scalar type. String width
    /// and time resolution do not take part.
    pub fn same_scalar_type(&self, other: &DType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Whether `self` belongs to `category`.
    pub fn is_in(&self, category: DTypeCategory) -> bool {
        use DTypeCategory as C;
        match category {
            C::Generic => true,
            C::Number => self.is_in(C::Integer) || self.is_in(C::Inexact),
            C::Integer => self.is_in(C::SignedInteger) || self.is_in(C::UnsignedInteger),
            C::SignedInteger => matches!(
                self,
                Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::TimeDelta(_)
            ),
            C::UnsignedInteger => {
                matches!(self, Self::UInt8 | Self::UInt16 | Self::UInt32 | Self::UInt64)
            }
            C::Inexact => self.is_in(C::Floating) || self.is_in(C::ComplexFloating),
            C::Floating => matches!(self, Self::Float16 | Self::Float32 | Self::Float64),
            C::ComplexFloating => matches!(self, Self::Complex64 | Self::Complex128),
            C::Flexible | C::Character => matches!(self, Self::Str(_) | Self::Bytes(_)),
        }
    }

    /// Whether `self` is a subtype of `spec`.
    pub fn is_subtype_of(&self, spec: &DTypeSpec) -> bool {
        match spec {
            DTypeSpec::Concrete(expected) => self.same_scalar_type(expected),
            DTypeSpec::Category(category) => self.is_in(*category),
        }
    }
}

fn with_unit(code: &str, unit: &Option<TimeUnit>) -> String {
    match unit {
        Some(u) => format!("{code}[{}]", u.as_str()),
        None => code.to_string(),
    }
}

/// Parse an optional `[unit]` suffix.
fn parse_unit(rest: &str, original: &str) -> Result<Option<TimeUnit>, ConstructionError> {
    if rest.is_empty() {
        return Ok(None);
    }
    let inner = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| ConstructionError::UnknownDType(original.to_string()))?;
    inner
        .parse()
        .map(Some)
        .map_err(|_| ConstructionError::UnknownDType(original.to_string()))
}

/// Parse a width suffix; an empty suffix means unsized.
fn parse_width(rest: &str, original: &str) -> Result<usize, ConstructionError> {
    if rest.is_empty() {
        return Ok(0);
    }
    rest.parse()
        .map_err(|_| ConstructionError::UnknownDType(original.to_string()))
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.typestr())
    }
}

impl FromStr for DType {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix(['<', '>', '=', '|']).unwrap_or(s);
        let dtype = match body {
            "?" | "b1" | "bool" => Self::Bool,
            "i1" | "int8" => Self::Int8,
            "i2" | "int16" => Self::Int16,
            "i4" | "int32" => Self::Int32,
            "i8" | "int64" | "int" => Self::Int64,
            "u1" | "uint8" => Self::UInt8,
            "u2" | "uint16" => Self::UInt16,
            "u4" | "uint32" => Self::UInt32,
            "u8" | "uint64" => Self::UInt64,
            "f2" | "float16" => Self::Float16,
            "f4" | "float32" => Self::Float32,
            "f8" | "float64" | "float" => Self::Float64,
            "c8" | "complex64" => Self::Complex64,
            "c16" | "complex128" | "complex" => Self::Complex128,
            "O" | "object" => Self::Object,
            "str" => Self::Str(0),
            "bytes" => Self::Bytes(0),
            _ => {
                if let Some(rest) = body.strip_prefix("datetime64").or(body.strip_prefix("M8")) {
                    Self::DateTime(parse_unit(rest, s)?)
                } else if let Some(rest) =
                    body.strip_prefix("timedelta64").or(body.strip_prefix("m8"))
                {
                    Self::TimeDelta(parse_unit(rest, s)?)
                } else if let Some(rest) = body.strip_prefix('U') {
                    Self::Str(parse_width(rest, s)?)
                } else if let Some(rest) = body.strip_prefix('S') {
                    Self::Bytes(parse_width(rest, s)?)
                } else {
                    return Err(ConstructionError::UnknownDType(s.to_string()));
                }
            }
        };
        Ok(dtype)
    }
}

impl Serialize for DType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.typestr())
    }
}

impl<'de> Deserialize<'de> for DType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// An abstract node of the scalar type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeCategory {
    Generic,
    Number,
    Integer,
    SignedInteger,
    UnsignedInteger,
    Inexact,
    Floating,
    ComplexFloating,
    Flexible,
    Character,
}

impl DTypeCategory {
    /// Returns all categories.
    pub fn all() -> &'static [DTypeCategory] {
        &[
            Self::Generic,
            Self::Number,
            Self::Integer,
            Self::SignedInteger,
            Self::UnsignedInteger,
            Self::Inexact,
            Self::Floating,
            Self::ComplexFloating,
            Self::Flexible,
            Self::Character,
        ]
    }

    /// The category name used in schema documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::SignedInteger => "signedinteger",
            Self::UnsignedInteger => "unsignedinteger",
            Self::Inexact => "inexact",
            Self::Floating => "floating",
            Self::ComplexFloating => "complexfloating",
            Self::Flexible => "flexible",
            Self::Character => "character",
        }
    }
}

impl fmt::Display for DTypeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DTypeCategory {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| ConstructionError::UnknownDType(s.to_string()))
    }
}

/// What a dtype schema expects: a concrete dtype or a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DTypeSpec {
    Concrete(DType),
    Category(DTypeCategory),
}

impl fmt::Display for DTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concrete(dtype) => dtype.fmt(f),
            Self::Category(category) => category.fmt(f),
        }
    }
}

impl FromStr for DTypeSpec {
    type Err = ConstructionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<DTypeCategory>() {
            Ok(category) => Ok(Self::Category(category)),
            Err(_) => s.parse().map(Self::Concrete),
        }
    }
}

impl From<DType> for DTypeSpec {
    fn from(dtype: DType) -> Self {
        Self::Concrete(dtype)
    }
}

impl From<DTypeCategory> for DTypeSpec {
    fn from(category: DTypeCategory) -> Self {
        Self::Category(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_and_names_agree() {
        let pairs = [
            ("i4", "int32"),
            ("<f8", "float64"),
            ("|b1", "bool"),
            ("u1", "uint8"),
            ("c16", "complex128"),
            ("M8[ns]", "datetime64[ns]"),
            ("m8[s]", "timedelta64[s]"),
        ];
        for (code, name) in pairs {
            let a: DType = code.parse().unwrap();
            let b: DType = name.parse().unwrap();
            assert_eq!(a, b, "{code} vs {name}");
        }
    }

    #[test]
    fn test_typestr_roundtrip() {
        let dtypes = [
            DType::Bool,
            DType::Int16,
            DType::UInt64,
            DType::Float32,
            DType::Complex64,
            DType::Str(5),
            DType::Bytes(3),
            DType::DateTime(Some(TimeUnit::Nanosecond)),
            DType::TimeDelta(None),
            DType::Object,
        ];
        for dtype in dtypes {
            let parsed: DType = dtype.typestr().parse().unwrap();
            assert_eq!(parsed, dtype);
        }
    }

    #[test]
    fn test_byte_order_prefix_ignored() {
        let big: DType = ">i4".parse().unwrap();
        let native: DType = "=i4".parse().unwrap();
        assert_eq!(big, DType::Int32);
        assert_eq!(native, DType::Int32);
    }

    #[test]
    fn test_unknown_dtype_rejected() {
        assert!("i3".parse::<DType>().is_err());
        assert!("M8[fortnight]".parse::<DType>().is_err());
        assert!("".parse::<DType>().is_err());
        assert!("Float32".parse::<DType>().is_err());
    }

    #[test]
    fn test_concrete_subtype_ignores_width_not_size() {
        let i4 = DTypeSpec::Concrete(DType::Int32);
        assert!(DType::Int32.is_subtype_of(&i4));
        assert!(!DType::Int64.is_subtype_of(&i4));
        assert!(DType::Str(5).is_subtype_of(&DTypeSpec::Concrete(DType::Str(3))));
        assert!(DType::DateTime(Some(TimeUnit::Second))
            .is_subtype_of(&DTypeSpec::Concrete(DType::DateTime(Some(TimeUnit::Nanosecond)))));
    }

    #[test]
    fn test_category_membership() {
        use DTypeCategory as C;
        assert!(DType::Float32.is_in(C::Floating));
        assert!(DType::Float32.is_in(C::Inexact));
        assert!(DType::Float32.is_in(C::Number));
        assert!(!DType::Float32.is_in(C::Integer));
        assert!(DType::UInt8.is_in(C::Integer));
        assert!(!DType::UInt8.is_in(C::SignedInteger));
        assert!(DType::TimeDelta(None).is_in(C::SignedInteger));
        assert!(!DType::DateTime(None).is_in(C::Number));
        assert!(!DType::Bool.is_in(C::Number));
        assert!(DType::Bytes(2).is_in(C::Character));
        for dtype in [DType::Bool, DType::Object, DType::Complex64] {
            assert!(dtype.is_in(C::Generic));
        }
    }

    #[test]
    fn test_parse_prefers_category() {
        let spec: DTypeSpec = "floating".parse().unwrap();
        assert_eq!(spec, DTypeSpec::Category(DTypeCategory::Floating));
        let spec: DTypeSpec = "f4".parse().unwrap();
        assert_eq!(spec, DTypeSpec::Concrete(DType::Float32));
        assert_eq!(spec.to_string(), "<f4");
    }

    #[test]
    fn test_serde_uses_typestr() {
        let json = serde_json::to_string(&DType::Int32).unwrap();
        assert_eq!(json, "\"<i4\"");
        let parsed: DType = serde_json::from_str("\"float64\"").unwrap();
        assert_eq!(parsed, DType::Float64);
        assert!(serde_json::from_str::<DType>("\"nope\"").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn any_unit() -> impl Strategy<Value = Option<TimeUnit>> {
        prop::sample::select(vec![
            None,
            Some(TimeUnit::Day),
            Some(TimeUnit::Second),
            Some(TimeUnit::Nanosecond),
        ])
    }

    fn any_dtype() -> impl Strategy<Value = DType> {
        prop_oneof![
            prop::sample::select(vec![
                DType::Bool,
                DType::Int8,
                DType::Int16,
                DType::Int32,
                DType::Int64,
                DType::UInt8,
                DType::UInt16,
                DType::UInt32,
                DType::UInt64,
                DType::Float16,
                DType::Float32,
                DType::Float64,
                DType::Complex64,
                DType::Complex128,
                DType::Object,
            ]),
            (0usize..64).prop_map(DType::Str),
            (0usize..64).prop_map(DType::Bytes),
            any_unit().prop_map(DType::DateTime),
            any_unit().prop_map(DType::TimeDelta),
        ]
    }

    proptest! {
        /// The type string parses back to the same dtype.
        #[test]
        fn typestr_round_trip(dtype in any_dtype()) {
            prop_assert_eq!(dtype.typestr().parse::<DType>().unwrap(), dtype);
        }

        /// Every dtype is a subtype of itself and of `generic`.
        #[test]
        fn subtype_is_reflexive(dtype in any_dtype()) {
            prop_assert!(dtype.is_subtype_of(&DTypeSpec::Concrete(dtype)));
            prop_assert!(dtype.is_in(DTypeCategory::Generic));
        }

        /// A dtype in a category is in every ancestor of that category.
        #[test]
        fn category_membership_is_upward_closed(dtype in any_dtype()) {
            use DTypeCategory as C;
            let parents = [
                (C::SignedInteger, C::Integer),
                (C::UnsignedInteger, C::Integer),
                (C::Integer, C::Number),
                (C::Floating, C::Inexact),
                (C::ComplexFloating, C::Inexact),
                (C::Inexact, C::Number),
                (C::Character, C::Flexible),
            ];
            for (child, parent) in parents {
                if dtype.is_in(child) {
                    prop_assert!(dtype.is_in(parent), "{} in {} but not {}", dtype, child, parent);
                }
            }
        }
    }
}
