//! Quantity domain model.
//!
//! # Responsibility
//! - Define units, unit families and fixed-point amounts for sample material.
//! - Provide exact arithmetic for splitting, adding and subtracting amounts.
//!
//! # Invariants
//! - Amounts are non-negative and carry exactly three fractional digits.
//! - Quantities from different unit families never combine.
//! - `Quantity::split` conserves the total: `sum(parts) == original`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const FRACTION_DIGITS: usize = 3;
const SCALE: u64 = 1_000;

static QUANTITY_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(\S.*?)\s*$").expect("valid quantity text regex")
});

pub type QuantityResult<T> = Result<T, QuantityError>;

/// Errors from quantity parsing and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Unit text does not match any supported unit.
    UnknownUnit(String),
    /// Split count must be at least one.
    InvalidSplit(usize),
    /// Operands belong to different unit families.
    IncompatibleUnits { left: UnitKind, right: UnitKind },
    /// Subtraction would drop below zero.
    NegativeQuantity,
    /// Amount text is malformed or too precise.
    InvalidAmount(String),
    /// Conversion would lose digits below the fixed precision.
    InexactConversion { from: UnitKind, to: UnitKind },
    /// Result does not fit the amount range.
    Overflow,
}

impl Display for QuantityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUnit(value) => write!(f, "unknown unit `{value}`"),
            Self::InvalidSplit(count) => {
                write!(f, "split count must be at least 1, got {count}")
            }
            Self::IncompatibleUnits { left, right } => write!(
                f,
                "incompatible units: {} ({:?}) and {} ({:?})",
                left.symbol(),
                left.family(),
                right.symbol(),
                right.family()
            ),
            Self::NegativeQuantity => write!(f, "quantity must not become negative"),
            Self::InvalidAmount(value) => write!(f, "invalid amount `{value}`"),
            Self::InexactConversion { from, to } => write!(
                f,
                "converting {} to {} would lose precision",
                from.symbol(),
                to.symbol()
            ),
            Self::Overflow => write!(f, "quantity amount overflow"),
        }
    }
}

impl Error for QuantityError {}

/// Unit family. Only units of one family can be combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitFamily {
    Volume,
    Mass,
    Count,
}

/// Closed set of supported units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Microliter,
    Milliliter,
    Liter,
    Microgram,
    Milligram,
    Gram,
    Kilogram,
    Items,
}

impl UnitKind {
    pub const ALL: [UnitKind; 8] = [
        UnitKind::Microliter,
        UnitKind::Milliliter,
        UnitKind::Liter,
        UnitKind::Microgram,
        UnitKind::Milligram,
        UnitKind::Gram,
        UnitKind::Kilogram,
        UnitKind::Items,
    ];

    pub fn family(self) -> UnitFamily {
        match self {
            Self::Microliter | Self::Milliliter | Self::Liter => UnitFamily::Volume,
            Self::Microgram | Self::Milligram | Self::Gram | Self::Kilogram => UnitFamily::Mass,
            Self::Items => UnitFamily::Count,
        }
    }

    /// Multiplier from this unit to its family base (`µl`, `µg`, `items`).
    pub fn base_factor(self) -> u64 {
        match self {
            Self::Microliter | Self::Microgram | Self::Items => 1,
            Self::Milliliter | Self::Milligram => 1_000,
            Self::Liter | Self::Gram => 1_000_000,
            Self::Kilogram => 1_000_000_000,
        }
    }

    /// Canonical display symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Microliter => "µl",
            Self::Milliliter => "ml",
            Self::Liter => "l",
            Self::Microgram => "µg",
            Self::Milligram => "mg",
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Items => "items",
        }
    }

    pub fn is_compatible_with(self, other: UnitKind) -> bool {
        self.family() == other.family()
    }
}

impl Display for UnitKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for UnitKind {
    type Err = QuantityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_unit(value)
    }
}

/// Parses unit text case-insensitively.
///
/// Accepts symbols (`ml`, `µl`, `ul`, `kg`) and spelled-out names in both
/// `-er` and `-re` spellings, singular or plural.
pub fn parse_unit(value: &str) -> QuantityResult<UnitKind> {
    // Greek small mu and the micro sign are visually identical.
    let normalized = value.trim().to_lowercase().replace('\u{3bc}', "\u{b5}");
    let unit = match normalized.as_str() {
        "µl" | "ul" | "microliter" | "microliters" | "microlitre" | "microlitres" => {
            UnitKind::Microliter
        }
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => UnitKind::Milliliter,
        "l" | "liter" | "liters" | "litre" | "litres" => UnitKind::Liter,
        "µg" | "ug" | "microgram" | "micrograms" => UnitKind::Microgram,
        "mg" | "milligram" | "milligrams" => UnitKind::Milligram,
        "g" | "gram" | "grams" => UnitKind::Gram,
        "kg" | "kilogram" | "kilograms" => UnitKind::Kilogram,
        "item" | "items" | "count" | "pcs" | "unit" | "units" => UnitKind::Items,
        _ => return Err(QuantityError::UnknownUnit(value.trim().to_string())),
    };
    Ok(unit)
}

/// Non-negative fixed-point amount with three fractional digits.
///
/// Stored as a count of thousandths; `Amount::from_thousandths(1500)` is `1.5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(u64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_thousandths(raw: u64) -> Self {
        Self(raw)
    }

    /// Whole units, e.g. `Amount::from_units(10)` is `10.000`.
    pub fn from_units(units: u64) -> QuantityResult<Self> {
        units
            .checked_mul(SCALE)
            .map(Self)
            .ok_or(QuantityError::Overflow)
    }

    pub fn thousandths(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Amount {
    type Err = QuantityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let invalid = || QuantityError::InvalidAmount(trimmed.to_string());
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if trimmed.contains('.') && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > FRACTION_DIGITS || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let mut fraction_raw: u64 = 0;
        for (index, digit) in fraction.bytes().enumerate() {
            let weight = 10_u64.pow((FRACTION_DIGITS - 1 - index) as u32);
            fraction_raw += u64::from(digit - b'0') * weight;
        }

        whole
            .checked_mul(SCALE)
            .and_then(|value| value.checked_add(fraction_raw))
            .map(Self)
            .ok_or(QuantityError::Overflow)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 / SCALE;
        let fraction = self.0 % SCALE;
        if fraction == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{fraction:03}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl TryFrom<String> for Amount {
    type Error = QuantityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Amount> for String {
    fn from(value: Amount) -> Self {
        value.to_string()
    }
}

/// Physical amount of material in a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity {
    pub value: Amount,
    pub unit: UnitKind,
}

impl Quantity {
    pub fn new(value: Amount, unit: UnitKind) -> Self {
        Self { value, unit }
    }

    pub fn zero(unit: UnitKind) -> Self {
        Self::new(Amount::ZERO, unit)
    }

    /// Parses text like `10 ml`, `2.5g` or `3 items`.
    pub fn parse(text: &str) -> QuantityResult<Self> {
        parse_quantity(text)
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Splits this quantity into `parts` quantities of the same unit.
    ///
    /// Each part receives `value / parts` (in thousandths). The remainder of
    /// the division goes to the first part so the parts sum exactly to the
    /// original value.
    ///
    /// # Errors
    /// - `InvalidSplit` when `parts` is zero.
    pub fn split(&self, parts: usize) -> QuantityResult<Vec<Quantity>> {
        if parts == 0 {
            return Err(QuantityError::InvalidSplit(parts));
        }
        let divisor = parts as u64;
        let share = self.value.0 / divisor;
        let remainder = self.value.0 % divisor;

        let mut result = vec![Quantity::new(Amount(share), self.unit); parts];
        result[0].value = Amount(share + remainder);
        Ok(result)
    }

    /// Adds two quantities of one family; the result uses the finer unit.
    pub fn add(&self, other: &Quantity) -> QuantityResult<Quantity> {
        let (left, right, unit) = self.common_terms(other)?;
        left.checked_add(right)
            .map(|raw| Quantity::new(Amount(raw), unit))
            .ok_or(QuantityError::Overflow)
    }

    /// Subtracts `other`; the result uses the finer unit.
    ///
    /// # Errors
    /// - `NegativeQuantity` when `other` exceeds `self`.
    pub fn subtract(&self, other: &Quantity) -> QuantityResult<Quantity> {
        let (left, right, unit) = self.common_terms(other)?;
        left.checked_sub(right)
            .map(|raw| Quantity::new(Amount(raw), unit))
            .ok_or(QuantityError::NegativeQuantity)
    }

    pub fn multiply(&self, factor: u64) -> QuantityResult<Quantity> {
        self.value
            .0
            .checked_mul(factor)
            .map(|raw| Quantity::new(Amount(raw), self.unit))
            .ok_or(QuantityError::Overflow)
    }

    /// Re-expresses this quantity in `unit` without losing precision.
    pub fn convert_to(&self, unit: UnitKind) -> QuantityResult<Quantity> {
        if !self.unit.is_compatible_with(unit) {
            return Err(QuantityError::IncompatibleUnits {
                left: self.unit,
                right: unit,
            });
        }
        let base = u128::from(self.value.0) * u128::from(self.unit.base_factor());
        let target_factor = u128::from(unit.base_factor());
        if base % target_factor != 0 {
            return Err(QuantityError::InexactConversion {
                from: self.unit,
                to: unit,
            });
        }
        let raw = u64::try_from(base / target_factor).map_err(|_| QuantityError::Overflow)?;
        Ok(Quantity::new(Amount(raw), unit))
    }

    /// Compares amounts across units of one family.
    pub fn same_amount(&self, other: &Quantity) -> QuantityResult<bool> {
        let (left, right, _) = self.common_terms(other)?;
        Ok(left == right)
    }

    fn common_terms(&self, other: &Quantity) -> QuantityResult<(u64, u64, UnitKind)> {
        if !self.unit.is_compatible_with(other.unit) {
            return Err(QuantityError::IncompatibleUnits {
                left: self.unit,
                right: other.unit,
            });
        }
        let unit = if self.unit.base_factor() <= other.unit.base_factor() {
            self.unit
        } else {
            other.unit
        };
        let left = self.convert_to(unit)?.value.0;
        let right = other.convert_to(unit)?.value.0;
        Ok((left, right, unit))
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit.symbol())
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_quantity(value)
    }
}

/// Parses `<amount> <unit>` text, whitespace between the parts optional.
pub fn parse_quantity(text: &str) -> QuantityResult<Quantity> {
    let captures = QUANTITY_TEXT_RE
        .captures(text)
        .ok_or_else(|| QuantityError::InvalidAmount(text.trim().to_string()))?;
    let value: Amount = captures[1].parse()?;
    let unit = parse_unit(&captures[2])?;
    Ok(Quantity::new(value, unit))
}
