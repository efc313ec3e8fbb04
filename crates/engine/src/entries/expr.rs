//! Element-wise arithmetic over resolved operands.
//!
//! Operands are scalars or arrays; scalars broadcast against arrays and
//! arrays must agree in length. Everything is computed in `f64`.

use std::collections::HashMap;

use jsonmap_types::{BinaryOperator, Expr, ExprOperand, ExprRule, MappingError, MappingValue};

use crate::resolver::Resolution;

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Scalar(f64),
    Array(Vec<f64>),
}

impl Operand {
    fn map(self, operation: impl Fn(f64) -> f64) -> Operand {
        match self {
            Operand::Scalar(value) => Operand::Scalar(operation(value)),
            Operand::Array(values) => Operand::Array(values.into_iter().map(operation).collect()),
        }
    }

    fn ensure_finite(self, description: &str) -> Result<Operand, String> {
        let finite = match &self {
            Operand::Scalar(value) => value.is_finite(),
            Operand::Array(values) => values.iter().all(|value| value.is_finite()),
        };
        if finite {
            Ok(self)
        } else {
            Err(format!("{description} produced a non-finite result"))
        }
    }
}

pub(crate) fn resolve(rule: &ExprRule, key: &str, resolution: &mut Resolution<'_, '_>) -> Result<MappingValue, MappingError> {
    let mut bindings = HashMap::with_capacity(rule.parameters.len());
    for (name, operand) in &rule.parameters {
        let bound = match operand {
            ExprOperand::Literal(value) => Operand::Scalar(*value),
            ExprOperand::Reference(reference) => {
                let value = resolution.reference(key, reference)?;
                operand_from(value).map_err(|message| {
                    MappingError::transform(key, format!("parameter '{name}' ('{reference}') {message}"))
                })?
            }
        };
        bindings.insert(name.as_str(), bound);
    }

    let result = evaluate(rule.expression.root(), &bindings)
        .map_err(|message| MappingError::transform(key, format!("{message} in '{}'", rule.expression.source())))?;
    match result {
        Operand::Scalar(value) => Ok(MappingValue::from(value)),
        Operand::Array(values) => Ok(MappingValue::from_f64_values(values)),
    }
}

fn operand_from(value: MappingValue) -> Result<Operand, &'static str> {
    match value {
        MappingValue::Scalar(scalar) => Ok(Operand::Scalar(scalar.to_f64())),
        MappingValue::Array(array) if !array.is_empty() => Ok(Operand::Array(array.to_f64_vec())),
        MappingValue::Array(_) | MappingValue::Empty => Err("produced no data"),
        MappingValue::Text(_) => Err("is not numeric"),
    }
}

fn evaluate(expr: &Expr, bindings: &HashMap<&str, Operand>) -> Result<Operand, String> {
    match expr {
        Expr::Number(value) => Ok(Operand::Scalar(*value)),
        Expr::Variable(name) => bindings
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| format!("parameter '{name}' is not bound")),
        Expr::Negate(inner) => Ok(evaluate(inner, bindings)?.map(|value| -value)),
        Expr::Binary { operator, left, right } => {
            let left = evaluate(left, bindings)?;
            let right = evaluate(right, bindings)?;
            combine(*operator, left, right)?.ensure_finite(&expr.to_string())
        }
        Expr::Call { function, argument } => evaluate(argument, bindings)?
            .map(|value| function.apply(value))
            .ensure_finite(&expr.to_string()),
    }
}

fn combine(operator: BinaryOperator, left: Operand, right: Operand) -> Result<Operand, String> {
    let apply = |lhs: f64, rhs: f64| -> Result<f64, String> {
        if operator == BinaryOperator::Divide && rhs == 0.0 {
            return Err("division by zero".to_string());
        }
        Ok(operator.apply(lhs, rhs))
    };
    match (left, right) {
        (Operand::Scalar(lhs), Operand::Scalar(rhs)) => apply(lhs, rhs).map(Operand::Scalar),
        (Operand::Scalar(lhs), Operand::Array(rhs)) => rhs
            .into_iter()
            .map(|value| apply(lhs, value))
            .collect::<Result<_, _>>()
            .map(Operand::Array),
        (Operand::Array(lhs), Operand::Scalar(rhs)) => lhs
            .into_iter()
            .map(|value| apply(value, rhs))
            .collect::<Result<_, _>>()
            .map(Operand::Array),
        (Operand::Array(lhs), Operand::Array(rhs)) => {
            if lhs.len() != rhs.len() {
                return Err(format!(
                    "operand lengths differ for '{}': {} vs {}",
                    operator.symbol(),
                    lhs.len(),
                    rhs.len()
                ));
            }
            lhs.into_iter()
                .zip(rhs)
                .map(|(left, right)| apply(left, right))
                .collect::<Result<_, _>>()
                .map(Operand::Array)
        }
    }
}
