//! Values produced by mapping rules.
//!
//! Numeric data keeps the element width it was produced with so a transform
//! such as an additive offset can be applied to `f32` and `i64` data alike
//! without widening the result.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Numeric element types a mapping value can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Float,
    Double,
    Int,
    Long,
    UInt,
    ULong,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Float => "float",
            DataType::Double => "double",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::UInt => "uint",
            DataType::ULong => "ulong",
        }
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "float" | "f32" => Ok(DataType::Float),
            "double" | "f64" => Ok(DataType::Double),
            "int" | "i32" => Ok(DataType::Int),
            "long" | "i64" => Ok(DataType::Long),
            "uint" | "u32" => Ok(DataType::UInt),
            "ulong" | "u64" => Ok(DataType::ULong),
            other => Err(format!("unknown data type '{other}'")),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element conversion used by width-preserving arithmetic.
///
/// Arithmetic is carried out in `f64` and converted back with `as`, so
/// integer elements truncate toward zero and saturate at their bounds.
pub trait Element: Copy + PartialEq + fmt::Debug {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_element {
    ($($element:ty),*) => {
        $(
            impl Element for $element {
                #[allow(clippy::unnecessary_cast)]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                #[allow(clippy::unnecessary_cast)]
                fn from_f64(value: f64) -> Self {
                    value as $element
                }
            }
        )*
    };
}

impl_element!(f32, f64, i32, i64, u32, u64);

/// Applies `$body` to the vector inside every `NumericArray` variant and
/// rewraps the result in the same variant.
macro_rules! map_array {
    ($array:expr, |$values:ident| $body:expr) => {
        match $array {
            NumericArray::F32($values) => NumericArray::F32($body),
            NumericArray::F64($values) => NumericArray::F64($body),
            NumericArray::I32($values) => NumericArray::I32($body),
            NumericArray::I64($values) => NumericArray::I64($body),
            NumericArray::U32($values) => NumericArray::U32($body),
            NumericArray::U64($values) => NumericArray::U64($body),
        }
    };
}

macro_rules! map_scalar {
    ($scalar:expr, |$value:ident| $body:expr) => {
        match $scalar {
            Scalar::F32($value) => Scalar::F32($body),
            Scalar::F64($value) => Scalar::F64($body),
            Scalar::I32($value) => Scalar::I32($body),
            Scalar::I64($value) => Scalar::I64($body),
            Scalar::U32($value) => Scalar::U32($body),
            Scalar::U64($value) => Scalar::U64($body),
        }
    };
}

fn shift<T: Element>(value: T, offset: f64) -> T {
    T::from_f64(value.to_f64() + offset)
}

/// A single numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    F32(f32),
    F64(f64),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
}

impl Scalar {
    pub fn data_type(&self) -> DataType {
        match self {
            Scalar::F32(_) => DataType::Float,
            Scalar::F64(_) => DataType::Double,
            Scalar::I32(_) => DataType::Int,
            Scalar::I64(_) => DataType::Long,
            Scalar::U32(_) => DataType::UInt,
            Scalar::U64(_) => DataType::ULong,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match *self {
            Scalar::F32(value) => value.to_f64(),
            Scalar::F64(value) => value,
            Scalar::I32(value) => value.to_f64(),
            Scalar::I64(value) => value.to_f64(),
            Scalar::U32(value) => value.to_f64(),
            Scalar::U64(value) => value.to_f64(),
        }
    }

    /// Adds `offset`, keeping the element type.
    pub fn offset(&self, offset: f64) -> Scalar {
        map_scalar!(*self, |value| shift(value, offset))
    }

    pub fn negated(&self) -> Scalar {
        map_scalar!(*self, |value| Element::from_f64(-value.to_f64()))
    }

    pub fn cast(&self, data_type: DataType) -> Scalar {
        let value = self.to_f64();
        match data_type {
            DataType::Float => Scalar::F32(Element::from_f64(value)),
            DataType::Double => Scalar::F64(value),
            DataType::Int => Scalar::I32(Element::from_f64(value)),
            DataType::Long => Scalar::I64(Element::from_f64(value)),
            DataType::UInt => Scalar::U32(Element::from_f64(value)),
            DataType::ULong => Scalar::U64(Element::from_f64(value)),
        }
    }
}

/// A one-dimensional numeric array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NumericArray {
    F32(Vec<f32>),
    F64(Vec<f64>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    U32(Vec<u32>),
    U64(Vec<u64>),
}

impl NumericArray {
    pub fn data_type(&self) -> DataType {
        match self {
            NumericArray::F32(_) => DataType::Float,
            NumericArray::F64(_) => DataType::Double,
            NumericArray::I32(_) => DataType::Int,
            NumericArray::I64(_) => DataType::Long,
            NumericArray::U32(_) => DataType::UInt,
            NumericArray::U64(_) => DataType::ULong,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NumericArray::F32(values) => values.len(),
            NumericArray::F64(values) => values.len(),
            NumericArray::I32(values) => values.len(),
            NumericArray::I64(values) => values.len(),
            NumericArray::U32(values) => values.len(),
            NumericArray::U64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Scalar> {
        match self {
            NumericArray::F32(values) => values.get(index).copied().map(Scalar::F32),
            NumericArray::F64(values) => values.get(index).copied().map(Scalar::F64),
            NumericArray::I32(values) => values.get(index).copied().map(Scalar::I32),
            NumericArray::I64(values) => values.get(index).copied().map(Scalar::I64),
            NumericArray::U32(values) => values.get(index).copied().map(Scalar::U32),
            NumericArray::U64(values) => values.get(index).copied().map(Scalar::U64),
        }
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            NumericArray::F32(values) => values.iter().map(|value| value.to_f64()).collect(),
            NumericArray::F64(values) => values.clone(),
            NumericArray::I32(values) => values.iter().map(|value| value.to_f64()).collect(),
            NumericArray::I64(values) => values.iter().map(|value| value.to_f64()).collect(),
            NumericArray::U32(values) => values.iter().map(|value| value.to_f64()).collect(),
            NumericArray::U64(values) => values.iter().map(|value| value.to_f64()).collect(),
        }
    }

    /// Adds `offset` to every element, keeping the element type.
    pub fn offset(&self, offset: f64) -> NumericArray {
        map_array!(self, |values| values.iter().map(|value| shift(*value, offset)).collect())
    }

    pub fn negated(&self) -> NumericArray {
        map_array!(self, |values| values.iter().map(|value| Element::from_f64(-value.to_f64())).collect())
    }

    pub fn reversed(&self) -> NumericArray {
        map_array!(self, |values| values.iter().rev().copied().collect())
    }

    /// Elements `start..stop` taking every `step`-th one.
    ///
    /// Bounds must already be clamped to the array length and `step` must be
    /// non-zero.
    pub fn strided(&self, start: usize, stop: usize, step: usize) -> NumericArray {
        let stop = stop.max(start);
        map_array!(self, |values| values[start..stop].iter().step_by(step).copied().collect())
    }

    pub fn cast(&self, data_type: DataType) -> NumericArray {
        let values = self.to_f64_vec();
        match data_type {
            DataType::Float => NumericArray::F32(values.into_iter().map(Element::from_f64).collect()),
            DataType::Double => NumericArray::F64(values),
            DataType::Int => NumericArray::I32(values.into_iter().map(Element::from_f64).collect()),
            DataType::Long => NumericArray::I64(values.into_iter().map(Element::from_f64).collect()),
            DataType::UInt => NumericArray::U32(values.into_iter().map(Element::from_f64).collect()),
            DataType::ULong => NumericArray::U64(values.into_iter().map(Element::from_f64).collect()),
        }
    }
}

/// Result of resolving a mapping entry.
///
/// `Empty` is the soft "nothing here" outcome: the rule ran but produced no
/// data, which callers treat as absent rather than as a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum MappingValue {
    Scalar(Scalar),
    Array(NumericArray),
    Text(String),
    #[default]
    Empty,
}

impl MappingValue {
    /// Converts a JSON document into a mapping value.
    ///
    /// Returns `None` for objects and nested arrays, which have no numeric
    /// representation.
    pub fn from_json(value: &Value) -> Option<MappingValue> {
        match value {
            Value::Null => Some(MappingValue::Empty),
            Value::Bool(flag) => Some(MappingValue::Scalar(Scalar::I32(i32::from(*flag)))),
            Value::Number(_) => scalar_from_json(value).map(MappingValue::Scalar),
            Value::String(text) => Some(MappingValue::Text(text.clone())),
            Value::Array(items) => array_from_json(items).map(MappingValue::Array),
            Value::Object(_) => None,
        }
    }

    pub fn from_f64_values(values: Vec<f64>) -> MappingValue {
        MappingValue::Array(NumericArray::F64(values))
    }

    /// `true` for `Empty`, empty arrays and empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            MappingValue::Empty => true,
            MappingValue::Array(array) => array.is_empty(),
            MappingValue::Text(text) => text.is_empty(),
            MappingValue::Scalar(_) => false,
        }
    }

    /// Number of data elements carried by the value.
    pub fn element_count(&self) -> usize {
        match self {
            MappingValue::Empty => 0,
            MappingValue::Array(array) => array.len(),
            MappingValue::Text(text) if text.is_empty() => 0,
            MappingValue::Text(_) | MappingValue::Scalar(_) => 1,
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self {
            MappingValue::Scalar(scalar) => Some(scalar.data_type()),
            MappingValue::Array(array) => Some(array.data_type()),
            MappingValue::Text(_) | MappingValue::Empty => None,
        }
    }

    /// Adds `offset` to every numeric element; `None` for non-numeric values.
    pub fn offset(&self, offset: f64) -> Option<MappingValue> {
        match self {
            MappingValue::Scalar(scalar) => Some(MappingValue::Scalar(scalar.offset(offset))),
            MappingValue::Array(array) => Some(MappingValue::Array(array.offset(offset))),
            MappingValue::Text(_) | MappingValue::Empty => None,
        }
    }

    /// Casts numeric data to `data_type`; `None` for non-numeric values.
    pub fn cast(&self, data_type: DataType) -> Option<MappingValue> {
        match self {
            MappingValue::Scalar(scalar) => Some(MappingValue::Scalar(scalar.cast(data_type))),
            MappingValue::Array(array) => Some(MappingValue::Array(array.cast(data_type))),
            MappingValue::Text(_) | MappingValue::Empty => None,
        }
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            MappingValue::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NumericArray> {
        match self {
            MappingValue::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MappingValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<f64> for MappingValue {
    fn from(value: f64) -> Self {
        MappingValue::Scalar(Scalar::F64(value))
    }
}

impl From<NumericArray> for MappingValue {
    fn from(value: NumericArray) -> Self {
        MappingValue::Array(value)
    }
}

fn scalar_from_json(value: &Value) -> Option<Scalar> {
    if let Some(integer) = value.as_i64() {
        return Some(Scalar::I64(integer));
    }
    if let Some(unsigned) = value.as_u64() {
        return Some(Scalar::U64(unsigned));
    }
    value.as_f64().map(Scalar::F64)
}

fn array_from_json(items: &[Value]) -> Option<NumericArray> {
    let mut scalars = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Bool(flag) => scalars.push(Scalar::I64(i64::from(*flag))),
            Value::Number(_) => scalars.push(scalar_from_json(item)?),
            _ => return None,
        }
    }
    if scalars.iter().all(|scalar| matches!(scalar, Scalar::I64(_))) {
        return Some(NumericArray::I64(
            scalars
                .iter()
                .filter_map(|scalar| match scalar {
                    Scalar::I64(value) => Some(*value),
                    _ => None,
                })
                .collect(),
        ));
    }
    Some(NumericArray::F64(scalars.iter().map(Scalar::to_f64).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_numbers_keep_integer_width() {
        assert_eq!(MappingValue::from_json(&json!(3)), Some(MappingValue::Scalar(Scalar::I64(3))));
        assert_eq!(MappingValue::from_json(&json!(2.5)), Some(MappingValue::Scalar(Scalar::F64(2.5))));
        assert_eq!(
            MappingValue::from_json(&json!(u64::MAX)),
            Some(MappingValue::Scalar(Scalar::U64(u64::MAX)))
        );
    }

    #[test]
    fn json_arrays_widen_to_double_when_mixed() {
        assert_eq!(
            MappingValue::from_json(&json!([1, 2, 3])),
            Some(MappingValue::Array(NumericArray::I64(vec![1, 2, 3])))
        );
        assert_eq!(
            MappingValue::from_json(&json!([1, 2.5])),
            Some(MappingValue::Array(NumericArray::F64(vec![1.0, 2.5])))
        );
        assert_eq!(MappingValue::from_json(&json!([[1], [2]])), None);
        assert_eq!(MappingValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn emptiness_covers_null_empty_arrays_and_text() {
        assert!(MappingValue::from_json(&json!(null)).is_some_and(|value| value.is_empty()));
        assert!(MappingValue::from_json(&json!([])).is_some_and(|value| value.is_empty()));
        assert!(MappingValue::Text(String::new()).is_empty());
        assert!(!MappingValue::from(0.0).is_empty());
    }

    #[test]
    fn offset_preserves_element_width() {
        let floats = NumericArray::F32(vec![1.0, 2.0]);
        assert_eq!(floats.offset(0.5), NumericArray::F32(vec![1.5, 2.5]));

        let integers = NumericArray::I32(vec![1, -4]);
        assert_eq!(integers.offset(2.7), NumericArray::I32(vec![3, -1]));

        let unsigned = Scalar::U64(10);
        assert_eq!(unsigned.offset(5.0), Scalar::U64(15));
    }

    #[test]
    fn offset_is_undefined_for_text() {
        assert_eq!(MappingValue::Text("abc".into()).offset(1.0), None);
        assert_eq!(MappingValue::Empty.offset(1.0), None);
    }

    #[test]
    fn strided_selection_respects_step() {
        let values = NumericArray::I64(vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(values.strided(1, 6, 2), NumericArray::I64(vec![1, 3, 5]));
        assert_eq!(values.strided(4, 2, 1), NumericArray::I64(vec![]));
    }

    #[test]
    fn data_type_parsing_accepts_aliases() {
        assert_eq!("FLOAT".parse::<DataType>(), Ok(DataType::Float));
        assert_eq!("f64".parse::<DataType>(), Ok(DataType::Double));
        assert_eq!("u32".parse::<DataType>(), Ok(DataType::UInt));
        assert!("complex".parse::<DataType>().is_err());
    }

    #[test]
    fn cast_converts_between_widths() {
        let value = MappingValue::from_f64_values(vec![1.9, 2.1]);
        assert_eq!(
            value.cast(DataType::Int),
            Some(MappingValue::Array(NumericArray::I32(vec![1, 2])))
        );
        assert_eq!(
            MappingValue::Scalar(Scalar::I64(3)).cast(DataType::Float),
            Some(MappingValue::Scalar(Scalar::F32(3.0)))
        );
    }

    #[test]
    fn serializes_untagged() {
        let array = MappingValue::Array(NumericArray::I32(vec![1, 2]));
        assert_eq!(serde_json::to_value(&array).expect("serialize"), json!([1, 2]));
        assert_eq!(serde_json::to_value(MappingValue::Empty).expect("serialize"), json!(null));
        assert_eq!(serde_json::to_value(MappingValue::from(12.5)).expect("serialize"), json!(12.5));
    }
}
