//! Shared data model for JSON mapping resolution.
//!
//! - `entry`: mapping rules and their kind-specific parameters
//! - `value`: numeric/text values produced by rules
//! - `globals`: schema-scoped global attributes
//! - `expression`: arithmetic expressions used by `EXPR` rules
//! - `error`: the error taxonomy shared by loading and resolution

pub mod entry;
pub mod error;
pub mod expression;
pub mod globals;
pub mod value;

pub use entry::{
    CustomRule, DimAxis, DimRule, EntryKind, ExprOperand, ExprRule, MappingEntry, MappingKind, OffsetRule, PluginRule, SliceBound,
    SliceRule, SliceSelector, ValueRule, ValueSource,
};
pub use error::{ErrorKind, MappingError};
pub use expression::{BinaryOperator, Expr, Expression, ExpressionError, Function};
pub use globals::GlobalAttributes;
pub use value::{DataType, Element, MappingValue, NumericArray, Scalar};
