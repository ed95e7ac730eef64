//! Unit registry - named units, their scale factors and dimensions
//!
//! Every unit is stored as a scale factor relative to the base unit of its
//! dimension (metre, kilogram, second, bit, or a dynamically created base such
//! as a home currency). Compound units (`km/h`, `m^2`) are built on the fly by
//! combining registry entries.

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Exponents over base dimensions, keyed by dimension name.
/// Zero exponents are never stored, so equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Dimension(BTreeMap<String, i32>);

impl Dimension {
    pub fn none() -> Self {
        Self(BTreeMap::new())
    }

    pub fn base(name: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), 1);
        Self(map)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    pub fn mul(&self, other: &Dimension) -> Dimension {
        let mut map = self.0.clone();
        for (name, exp) in &other.0 {
            let entry = map.entry(name.clone()).or_insert(0);
            *entry += exp;
            if *entry == 0 {
                map.remove(name);
            }
        }
        Dimension(map)
    }

    pub fn div(&self, other: &Dimension) -> Dimension {
        self.mul(&other.powi(-1))
    }

    pub fn powi(&self, n: i32) -> Dimension {
        if n == 0 {
            return Dimension::none();
        }
        Dimension(self.0.iter().map(|(k, v)| (k.clone(), v * n)).collect())
    }
}

/// A registered unit: scale relative to the base of its dimension
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDef {
    pub scale: f64,
    pub dimension: Dimension,
}

/// How a new unit is defined when registered at runtime
#[derive(Debug, Clone, PartialEq)]
pub enum UnitDefinition {
    /// A new, independent base unit with its own dimension
    Base,
    /// `factor` times an existing unit
    Scaled { factor: f64, unit: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Name is already taken by another unit
    AlreadyDefined(String),
    /// Name is not a valid identifier (or is a reserved keyword)
    InvalidName(String),
    /// Definition refers to a unit that does not exist
    UnknownUnit(String),
    /// Scale factor is zero, negative, or not finite
    InvalidFactor(f64),
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitError::AlreadyDefined(name) => write!(f, "Unit \"{}\" already exists", name),
            UnitError::InvalidName(name) => write!(f, "Invalid unit name \"{}\"", name),
            UnitError::UnknownUnit(name) => write!(f, "Unknown unit \"{}\"", name),
            UnitError::InvalidFactor(v) => write!(f, "Invalid unit scale factor {}", v),
        }
    }
}

impl std::error::Error for UnitError {}

/// Words the parser treats as conversion keywords; never valid unit names
pub const RESERVED_WORDS: &[&str] = &["to", "in"];

pub struct UnitRegistry {
    units: FxHashMap<String, UnitDef>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl UnitRegistry {
    /// An empty registry (no built-in units)
    pub fn empty() -> Self {
        Self { units: FxHashMap::default() }
    }

    /// Registry preloaded with length, area, volume, mass, time and data units
    pub fn with_builtin() -> Self {
        let mut reg = Self::empty();
        let length = Dimension::base("length");
        let area = length.powi(2);
        let volume = length.powi(3);
        let mass = Dimension::base("mass");
        let time = Dimension::base("time");
        let data = Dimension::base("data");

        // Length
        reg.builtin(&["m", "meter", "meters", "metre", "metres"], 1.0, &length);
        reg.builtin(&["km", "kilometer", "kilometers", "kilometre", "kilometres"], 1000.0, &length);
        reg.builtin(&["cm", "centimeter", "centimeters"], 0.01, &length);
        reg.builtin(&["mm", "millimeter", "millimeters"], 0.001, &length);
        reg.builtin(&["mi", "mile", "miles"], 1609.344, &length);
        reg.builtin(&["yd", "yard", "yards"], 0.9144, &length);
        reg.builtin(&["ft", "foot", "feet"], 0.3048, &length);
        reg.builtin(&["inch", "inches"], 0.0254, &length);

        // Area
        reg.builtin(&["sqm"], 1.0, &area);
        reg.builtin(&["sqft"], 0.09290304, &area);
        reg.builtin(&["sqin"], 0.00064516, &area);
        reg.builtin(&["sqyd"], 0.83612736, &area);
        reg.builtin(&["sqmi"], 2_589_988.110336, &area);
        reg.builtin(&["acre", "acres"], 4046.86, &area);
        reg.builtin(&["hectare", "hectares", "ha"], 10_000.0, &area);

        // Volume
        reg.builtin(&["l", "L", "liter", "liters", "litre", "litres"], 0.001, &volume);
        reg.builtin(&["ml", "milliliter", "milliliters"], 1e-6, &volume);
        reg.builtin(&["cc"], 1e-6, &volume);
        reg.builtin(&["gal", "gallon", "gallons"], 0.003785411784, &volume);
        reg.builtin(&["cup", "cups"], 0.0002365882365, &volume);

        // Mass
        reg.builtin(&["kg", "kilogram", "kilograms"], 1.0, &mass);
        reg.builtin(&["g", "gram", "grams"], 0.001, &mass);
        reg.builtin(&["mg", "milligram", "milligrams"], 1e-6, &mass);
        reg.builtin(&["t", "tonne", "tonnes"], 1000.0, &mass);
        reg.builtin(&["ton", "tons"], 907.18474, &mass);
        reg.builtin(&["lb", "lbs", "pound", "pounds"], 0.45359237, &mass);
        reg.builtin(&["oz", "ounce", "ounces"], 0.028349523125, &mass);

        // Time
        reg.builtin(&["s", "sec", "second", "seconds"], 1.0, &time);
        reg.builtin(&["ms", "millisecond", "milliseconds"], 0.001, &time);
        reg.builtin(&["min", "minute", "minutes"], 60.0, &time);
        reg.builtin(&["h", "hr", "hour", "hours"], 3600.0, &time);
        reg.builtin(&["day", "days"], 86_400.0, &time);
        reg.builtin(&["week", "weeks"], 604_800.0, &time);
        reg.builtin(&["year", "years"], 31_557_600.0, &time);

        // Data
        reg.builtin(&["b", "bit", "bits"], 1.0, &data);
        reg.builtin(&["byte", "bytes"], 8.0, &data);
        reg.builtin(&["kB", "KB"], 8e3, &data);
        reg.builtin(&["MB"], 8e6, &data);
        reg.builtin(&["GB"], 8e9, &data);

        reg
    }

    fn builtin(&mut self, names: &[&str], scale: f64, dimension: &Dimension) {
        for name in names {
            self.units.insert(
                (*name).to_string(),
                UnitDef { scale, dimension: dimension.clone() },
            );
        }
    }

    pub fn get(&self, name: &str) -> Option<&UnitDef> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Register a new unit. A name can be registered at most once.
    pub fn define(&mut self, name: &str, definition: UnitDefinition) -> Result<(), UnitError> {
        if !is_valid_unit_name(name) {
            return Err(UnitError::InvalidName(name.to_string()));
        }
        if self.units.contains_key(name) {
            return Err(UnitError::AlreadyDefined(name.to_string()));
        }

        let def = match definition {
            UnitDefinition::Base => UnitDef {
                scale: 1.0,
                dimension: Dimension::base(&format!("unit:{}", name)),
            },
            UnitDefinition::Scaled { factor, unit } => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(UnitError::InvalidFactor(factor));
                }
                let base = self
                    .units
                    .get(&unit)
                    .ok_or_else(|| UnitError::UnknownUnit(unit.clone()))?;
                UnitDef {
                    scale: factor * base.scale,
                    dimension: base.dimension.clone(),
                }
            }
        };

        self.units.insert(name.to_string(), def);
        Ok(())
    }
}

fn is_valid_unit_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    first_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

/// A product of named units with integer exponents, e.g. `km h^-1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompoundUnit {
    factors: Vec<(String, i32)>,
    scale: f64,
    dimension: Dimension,
}

impl CompoundUnit {
    pub fn named(name: &str, def: &UnitDef) -> Self {
        Self {
            factors: vec![(name.to_string(), 1)],
            scale: def.scale,
            dimension: def.dimension.clone(),
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn dimension(&self) -> &Dimension {
        &self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    pub fn mul(&self, other: &CompoundUnit) -> CompoundUnit {
        let mut factors = self.factors.clone();
        for (name, exp) in &other.factors {
            match factors.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 += exp,
                None => factors.push((name.clone(), *exp)),
            }
        }
        factors.retain(|(_, e)| *e != 0);
        CompoundUnit {
            factors,
            scale: self.scale * other.scale,
            dimension: self.dimension.mul(&other.dimension),
        }
    }

    pub fn div(&self, other: &CompoundUnit) -> CompoundUnit {
        self.mul(&other.powi(-1))
    }

    pub fn powi(&self, n: i32) -> CompoundUnit {
        CompoundUnit {
            factors: self
                .factors
                .iter()
                .filter(|_| n != 0)
                .map(|(name, e)| (name.clone(), e * n))
                .collect(),
            scale: self.scale.powi(n),
            dimension: self.dimension.powi(n),
        }
    }

    /// Human-readable label: `km`, `m^2`, `km / h`
    pub fn label(&self) -> String {
        let render = |name: &str, exp: i32| {
            if exp == 1 {
                name.to_string()
            } else {
                format!("{}^{}", name, exp)
            }
        };
        let num: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, e)| *e > 0)
            .map(|(n, e)| render(n, *e))
            .collect();
        let den: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, e)| *e < 0)
            .map(|(n, e)| render(n, -e))
            .collect();

        match (num.is_empty(), den.is_empty()) {
            (_, true) => num.join(" "),
            (true, false) => format!("1 / {}", den.join(" ")),
            (false, false) => format!("{} / {}", num.join(" "), den.join(" ")),
        }
    }
}

impl fmt::Display for CompoundUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_units_share_dimensions() {
        let reg = UnitRegistry::with_builtin();
        let km = reg.get("km").unwrap();
        let mile = reg.get("miles").unwrap();
        assert_eq!(km.dimension, mile.dimension);
        assert_ne!(km.dimension, reg.get("kg").unwrap().dimension);
    }

    #[test]
    fn test_define_base_and_scaled() {
        let mut reg = UnitRegistry::empty();
        reg.define("inr", UnitDefinition::Base).unwrap();
        reg.define("usd", UnitDefinition::Scaled { factor: 83.0, unit: "inr".into() })
            .unwrap();

        let usd = reg.get("usd").unwrap();
        assert_eq!(usd.scale, 83.0);
        assert_eq!(usd.dimension, reg.get("inr").unwrap().dimension);
    }

    #[test]
    fn test_define_rejects_duplicates() {
        let mut reg = UnitRegistry::with_builtin();
        let err = reg.define("cup", UnitDefinition::Base).unwrap_err();
        assert_eq!(err, UnitError::AlreadyDefined("cup".into()));
        // Upper-case variant is free
        assert!(reg.define("CUP", UnitDefinition::Base).is_ok());
    }

    #[test]
    fn test_define_rejects_bad_input() {
        let mut reg = UnitRegistry::with_builtin();
        assert!(matches!(reg.define("to", UnitDefinition::Base), Err(UnitError::InvalidName(_))));
        assert!(matches!(reg.define("2x", UnitDefinition::Base), Err(UnitError::InvalidName(_))));
        assert!(matches!(
            reg.define("zzz", UnitDefinition::Scaled { factor: 1.0, unit: "nope".into() }),
            Err(UnitError::UnknownUnit(_))
        ));
        assert!(matches!(
            reg.define("zzz", UnitDefinition::Scaled { factor: f64::NAN, unit: "m".into() }),
            Err(UnitError::InvalidFactor(_))
        ));
    }

    #[test]
    fn test_compound_unit_algebra() {
        let reg = UnitRegistry::with_builtin();
        let km = CompoundUnit::named("km", reg.get("km").unwrap());
        let h = CompoundUnit::named("h", reg.get("h").unwrap());

        let speed = km.div(&h);
        assert_eq!(speed.label(), "km / h");
        assert!((speed.scale() - 1000.0 / 3600.0).abs() < 1e-12);

        let back = speed.mul(&h);
        assert_eq!(back.label(), "km");
        assert_eq!(back.dimension(), km.dimension());

        let m = CompoundUnit::named("m", reg.get("m").unwrap());
        assert_eq!(m.powi(2).label(), "m^2");
        assert!(m.div(&m).is_dimensionless());
    }
}
