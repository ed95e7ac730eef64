// Evaluation values - plain numbers, unit-tagged quantities, bare units

use serde::Serialize;
use std::fmt;

use crate::units::CompoundUnit;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Blank line or comment: nothing was evaluated
    Empty,
    Number(f64),
    /// A magnitude expressed in `unit` (e.g. 3 miles)
    Quantity { value: f64, unit: CompoundUnit },
    /// A unit without a magnitude (e.g. the `km` in `3 miles to km`)
    Unit(CompoundUnit),
}

impl Value {
    /// Numeric projection: the number itself, or a quantity's magnitude in
    /// its own unit. Fails for values that carry no magnitude.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Quantity { value, .. } => Some(*value),
            Value::Empty | Value::Unit(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Build a quantity, collapsing to a plain number when the unit cancels out
    pub(crate) fn quantity(value: f64, unit: CompoundUnit) -> Value {
        if unit.is_dimensionless() {
            Value::Number(value * unit.scale())
        } else {
            Value::Quantity { value, unit }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Number(n) => write!(f, "{}", n),
            Value::Quantity { value, unit } => write!(f, "{} {}", value, unit),
            Value::Unit(unit) => write!(f, "{}", unit),
        }
    }
}
