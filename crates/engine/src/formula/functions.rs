// Built-in calculator functions

use super::eval::EvalError;
use crate::value::Value;

/// Check if a function name is a known built-in function.
/// Names are case-sensitive and lower-case.
pub fn is_known_function(name: &str) -> bool {
    matches!(name,
        // Rounding / sign (unit-preserving)
        "abs" | "round" | "floor" | "ceil" |
        // Powers and logs
        "sqrt" | "cbrt" | "exp" | "ln" | "log" | "log10" | "log2" |
        // Trig
        "sin" | "cos" | "tan" | "asin" | "acos" | "atan" |
        // Aggregates
        "min" | "max" | "sum" | "avg" | "mean"
    )
}

pub fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "abs" | "round" | "floor" | "ceil" => {
            let [arg] = args else {
                return Err(arity(name, "exactly one argument"));
            };
            let f: fn(f64) -> f64 = match name {
                "abs" => f64::abs,
                "round" => f64::round,
                "floor" => f64::floor,
                _ => f64::ceil,
            };
            match arg {
                Value::Number(n) => Ok(Value::Number(f(*n))),
                Value::Quantity { value, unit } => Ok(Value::Quantity {
                    value: f(*value),
                    unit: unit.clone(),
                }),
                other => Err(not_a_number(name, other)),
            }
        }
        "log" if args.len() == 2 => {
            let x = number_arg(name, &args[0])?;
            let base = number_arg(name, &args[1])?;
            Ok(Value::Number(x.ln() / base.ln()))
        }
        "sqrt" | "cbrt" | "exp" | "ln" | "log" | "log10" | "log2" | "sin" | "cos" | "tan"
        | "asin" | "acos" | "atan" => {
            let [arg] = args else {
                return Err(arity(name, "exactly one argument"));
            };
            let x = number_arg(name, arg)?;
            let result = match name {
                "sqrt" => x.sqrt(),
                "cbrt" => x.cbrt(),
                "exp" => x.exp(),
                "ln" | "log" => x.ln(),
                "log10" => x.log10(),
                "log2" => x.log2(),
                "sin" => x.sin(),
                "cos" => x.cos(),
                "tan" => x.tan(),
                "asin" => x.asin(),
                "acos" => x.acos(),
                _ => x.atan(),
            };
            Ok(Value::Number(result))
        }
        "min" | "max" | "sum" | "avg" | "mean" => {
            if args.is_empty() {
                return Err(arity(name, "at least one argument"));
            }
            let values = args
                .iter()
                .map(|a| number_arg(name, a))
                .collect::<Result<Vec<f64>, _>>()?;
            let result = match name {
                "min" => values.iter().cloned().fold(f64::INFINITY, f64::min),
                "max" => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                "sum" => values.iter().sum(),
                _ => values.iter().sum::<f64>() / values.len() as f64,
            };
            Ok(Value::Number(result))
        }
        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}

fn number_arg(function: &str, v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(not_a_number(function, other)),
    }
}

fn not_a_number(function: &str, v: &Value) -> EvalError {
    EvalError::InvalidArguments {
        function: function.to_string(),
        message: format!("expected a number, got {}", v),
    }
}

fn arity(function: &str, expected: &str) -> EvalError {
    EvalError::InvalidArguments {
        function: function.to_string(),
        message: format!("expects {}", expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Value {
        Value::Number(x)
    }

    #[test]
    fn test_known_functions_are_callable() {
        for name in ["abs", "sqrt", "sin", "min", "avg", "log10"] {
            assert!(is_known_function(name));
            assert!(call(name, &[n(1.0)]).is_ok(), "{} should accept one number", name);
        }
        assert!(!is_known_function("SUM"));
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(call("sum", &[n(1.0), n(2.0), n(3.5)]), Ok(n(6.5)));
        assert_eq!(call("avg", &[n(2.0), n(4.0)]), Ok(n(3.0)));
        assert_eq!(call("min", &[n(2.0), n(-4.0)]), Ok(n(-4.0)));
        assert_eq!(call("max", &[n(2.0), n(-4.0)]), Ok(n(2.0)));
        assert!(call("sum", &[]).is_err());
    }

    #[test]
    fn test_log_with_base() {
        let Ok(Value::Number(v)) = call("log", &[n(8.0), n(2.0)]) else {
            panic!("log(8, 2) should be a number");
        };
        assert!((v - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_arity_and_unknown() {
        assert!(matches!(call("sqrt", &[n(1.0), n(2.0)]), Err(EvalError::InvalidArguments { .. })));
        assert_eq!(call("frobnicate", &[]), Err(EvalError::UnknownFunction("frobnicate".into())));
    }
}
