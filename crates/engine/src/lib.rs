pub mod formula;
pub mod units;
pub mod value;

mod evaluator;

pub use evaluator::{BatchError, Engine, MathEvaluator};
pub use formula::eval::EvalError;
pub use units::{UnitDefinition, UnitError, UnitRegistry};
pub use value::Value;
