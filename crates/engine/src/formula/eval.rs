// Expression evaluator - evaluates parsed lines against a variable scope and unit registry

use rustc_hash::FxHashMap;
use std::fmt;

use super::functions;
use super::parser::{Expr, Op, Statement};
use crate::units::{CompoundUnit, UnitRegistry};
use crate::value::Value;

/// Variables assigned by earlier lines of the same batch
pub type Scope = FxHashMap<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// Line could not be parsed
    Parse(String),
    /// Identifier is not a variable, constant, or unit
    UndefinedSymbol(String),
    /// Unknown function name
    UnknownFunction(String),
    /// Operands carry incompatible units
    UnitMismatch { left: String, right: String },
    /// Operation is not defined for the given operands
    InvalidOperation(String),
    /// Wrong number or kind of function arguments
    InvalidArguments { function: String, message: String },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Parse(msg) => write!(f, "Syntax error: {}", msg),
            EvalError::UndefinedSymbol(name) => write!(f, "Undefined symbol {}", name),
            EvalError::UnknownFunction(name) => write!(f, "Unknown function {}", name),
            EvalError::UnitMismatch { left, right } => {
                write!(f, "Units do not match ({} vs {})", left, right)
            }
            EvalError::InvalidOperation(msg) => write!(f, "{}", msg),
            EvalError::InvalidArguments { function, message } => {
                write!(f, "{}: {}", function, message)
            }
        }
    }
}

impl std::error::Error for EvalError {}

pub struct EvalContext<'a> {
    pub scope: &'a Scope,
    pub units: &'a UnitRegistry,
}

/// Evaluate one statement, writing assignments into `scope`
pub fn eval_statement(
    stmt: &Statement,
    scope: &mut Scope,
    units: &UnitRegistry,
) -> Result<Value, EvalError> {
    match stmt {
        Statement::Empty => Ok(Value::Empty),
        Statement::Expr(expr) => eval_expr(expr, &EvalContext { scope, units }),
        Statement::Assign { name, value } => {
            let result = eval_expr(value, &EvalContext { scope, units })?;
            scope.insert(name.clone(), result.clone());
            Ok(result)
        }
    }
}

pub fn eval_expr(expr: &Expr, ctx: &EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Ident(name) => resolve_ident(name, ctx),
        Expr::Function { name, args } => {
            let values = args
                .iter()
                .map(|arg| eval_expr(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(name, &values)
        }
        Expr::Neg(inner) => match eval_expr(inner, ctx)? {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Quantity { value, unit } => Ok(Value::Quantity { value: -value, unit }),
            other => Err(invalid("negate", &other)),
        },
        Expr::Percent(inner) => match eval_expr(inner, ctx)? {
            Value::Number(n) => Ok(Value::Number(n / 100.0)),
            Value::Quantity { value, unit } => Ok(Value::Quantity { value: value / 100.0, unit }),
            other => Err(invalid("take a percentage of", &other)),
        },
        Expr::Factorial(inner) => match eval_expr(inner, ctx)? {
            Value::Number(n) => factorial(n).map(Value::Number),
            other => Err(invalid("take the factorial of", &other)),
        },
        Expr::BinaryOp { op, left, right } => {
            let l = eval_expr(left, ctx)?;
            let r = eval_expr(right, ctx)?;
            binary(*op, l, r)
        }
        Expr::Convert { value, target } => {
            let v = eval_expr(value, ctx)?;
            let t = eval_expr(target, ctx)?;
            convert(v, t)
        }
    }
}

/// Resolution order: variables, then constants, then units
fn resolve_ident(name: &str, ctx: &EvalContext) -> Result<Value, EvalError> {
    if let Some(v) = ctx.scope.get(name) {
        return Ok(v.clone());
    }
    match name {
        "pi" | "PI" => return Ok(Value::Number(std::f64::consts::PI)),
        "e" | "E" => return Ok(Value::Number(std::f64::consts::E)),
        "tau" => return Ok(Value::Number(std::f64::consts::TAU)),
        _ => {}
    }
    if let Some(def) = ctx.units.get(name) {
        return Ok(Value::Unit(CompoundUnit::named(name, def)));
    }
    Err(EvalError::UndefinedSymbol(name.to_string()))
}

fn binary(op: Op, l: Value, r: Value) -> Result<Value, EvalError> {
    use Value::*;

    match op {
        Op::Add | Op::Sub => {
            let sign = if op == Op::Add { 1.0 } else { -1.0 };
            match (l, r) {
                (Number(a), Number(b)) => Ok(Number(a + sign * b)),
                (Quantity { value: a, unit: ua }, Quantity { value: b, unit: ub }) => {
                    if ua.dimension() != ub.dimension() {
                        return Err(EvalError::UnitMismatch { left: ua.label(), right: ub.label() });
                    }
                    // Result is expressed in the left operand's unit
                    let b_in_a = b * ub.scale() / ua.scale();
                    Ok(Quantity { value: a + sign * b_in_a, unit: ua })
                }
                (Number(_), Quantity { unit, .. }) | (Quantity { unit, .. }, Number(_)) => {
                    Err(EvalError::UnitMismatch { left: "number".into(), right: unit.label() })
                }
                (a, b) => Err(invalid_pair(if op == Op::Add { "add" } else { "subtract" }, &a, &b)),
            }
        }
        Op::Mul => match (l, r) {
            (Number(a), Number(b)) => Ok(Number(a * b)),
            (Number(n), Quantity { value, unit }) | (Quantity { value, unit }, Number(n)) => {
                Ok(Quantity { value: n * value, unit })
            }
            (Number(n), Unit(unit)) | (Unit(unit), Number(n)) => Ok(Value::quantity(n, unit)),
            (Quantity { value: a, unit: ua }, Quantity { value: b, unit: ub }) => {
                Ok(Value::quantity(a * b, ua.mul(&ub)))
            }
            (Quantity { value, unit: uq }, Unit(u)) | (Unit(u), Quantity { value, unit: uq }) => {
                Ok(Value::quantity(value, uq.mul(&u)))
            }
            (Unit(a), Unit(b)) => Ok(Unit(a.mul(&b))),
            (a, b) => Err(invalid_pair("multiply", &a, &b)),
        },
        Op::Div => match (l, r) {
            (Number(a), Number(b)) => Ok(Number(a / b)),
            (Quantity { value, unit }, Number(n)) => Ok(Quantity { value: value / n, unit }),
            (Number(n), Quantity { value, unit }) => Ok(Value::quantity(n / value, unit.powi(-1))),
            (Number(n), Unit(unit)) => Ok(Value::quantity(n, unit.powi(-1))),
            (Quantity { value: a, unit: ua }, Quantity { value: b, unit: ub }) => {
                Ok(Value::quantity(a / b, ua.div(&ub)))
            }
            (Quantity { value, unit: uq }, Unit(u)) => Ok(Value::quantity(value, uq.div(&u))),
            (Unit(a), Unit(b)) => Ok(Unit(a.div(&b))),
            (a, b) => Err(invalid_pair("divide", &a, &b)),
        },
        Op::Mod => match (l, r) {
            (Number(a), Number(b)) => Ok(Number(a - b * (a / b).floor())),
            (a, b) => Err(invalid_pair("take the modulus of", &a, &b)),
        },
        Op::Pow => match (l, r) {
            (Number(a), Number(b)) => Ok(Number(a.powf(b))),
            (Quantity { value, unit }, Number(b)) => {
                let exp = integer_exponent(b)?;
                Ok(Value::quantity(value.powi(exp), unit.powi(exp)))
            }
            (Unit(unit), Number(b)) => {
                let exp = integer_exponent(b)?;
                Ok(Unit(unit.powi(exp)))
            }
            (a, b) => Err(invalid_pair("raise", &a, &b)),
        },
    }
}

fn integer_exponent(b: f64) -> Result<i32, EvalError> {
    if b.fract() != 0.0 || b.abs() > i32::MAX as f64 {
        return Err(EvalError::InvalidOperation(format!(
            "Units can only be raised to an integer power, not {}",
            b
        )));
    }
    Ok(b as i32)
}

fn convert(value: Value, target: Value) -> Result<Value, EvalError> {
    let Value::Unit(target) = target else {
        return Err(EvalError::InvalidOperation(format!(
            "Cannot convert to {}: not a unit",
            target
        )));
    };

    match value {
        Value::Quantity { value, unit } => {
            if unit.dimension() != target.dimension() {
                return Err(EvalError::UnitMismatch { left: unit.label(), right: target.label() });
            }
            Ok(Value::Quantity {
                value: value * unit.scale() / target.scale(),
                unit: target,
            })
        }
        Value::Unit(unit) if unit.dimension() == target.dimension() => Ok(Value::Quantity {
            value: unit.scale() / target.scale(),
            unit: target,
        }),
        other => Err(EvalError::InvalidOperation(format!(
            "Cannot convert {} to {}",
            describe(&other),
            target
        ))),
    }
}

fn factorial(n: f64) -> Result<f64, EvalError> {
    if n < 0.0 || n.fract() != 0.0 {
        return Err(EvalError::InvalidOperation(format!(
            "Factorial is only defined for non-negative integers, not {}",
            n
        )));
    }
    if n > 170.0 {
        return Ok(f64::INFINITY);
    }
    Ok((1..=n as u64).fold(1.0, |acc, k| acc * k as f64))
}

fn describe(v: &Value) -> String {
    match v {
        Value::Empty => "nothing".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Quantity { .. } => format!("quantity {}", v),
        Value::Unit(u) => format!("unit {}", u),
    }
}

fn invalid(what: &str, v: &Value) -> EvalError {
    EvalError::InvalidOperation(format!("Cannot {} {}", what, describe(v)))
}

fn invalid_pair(what: &str, a: &Value, b: &Value) -> EvalError {
    EvalError::InvalidOperation(format!("Cannot {} {} and {}", what, describe(a), describe(b)))
}
