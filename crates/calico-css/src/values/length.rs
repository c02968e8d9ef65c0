//! Length values.

use std::fmt;

use crate::error::Result;
use crate::printer::{Printer, ToCss};

/// A dimension with a length unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Length {
    pub value: f32,
    pub unit: LengthUnit,
}

impl Length {
    /// Create a length from a raw value and unit text.
    pub fn new(value: f32, unit: &str) -> Self {
        Self {
            value,
            unit: LengthUnit::from_unit(unit),
        }
    }
}

/// Length units. Unknown units are carried verbatim so the parser never has
/// to reject a dimension it does not model.
#[derive(Debug, Clone, PartialEq)]
pub enum LengthUnit {
    Px,
    Em,
    Rem,
    Ex,
    Ch,
    Vw,
    Vh,
    Vmin,
    Vmax,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Q,
    Other(String),
}

impl LengthUnit {
    /// Parse a unit suffix (case-insensitive).
    pub fn from_unit(unit: &str) -> Self {
        match unit.to_ascii_lowercase().as_str() {
            "px" => LengthUnit::Px,
            "em" => LengthUnit::Em,
            "rem" => LengthUnit::Rem,
            "ex" => LengthUnit::Ex,
            "ch" => LengthUnit::Ch,
            "vw" => LengthUnit::Vw,
            "vh" => LengthUnit::Vh,
            "vmin" => LengthUnit::Vmin,
            "vmax" => LengthUnit::Vmax,
            "pt" => LengthUnit::Pt,
            "pc" => LengthUnit::Pc,
            "in" => LengthUnit::In,
            "cm" => LengthUnit::Cm,
            "mm" => LengthUnit::Mm,
            "q" => LengthUnit::Q,
            _ => LengthUnit::Other(unit.to_string()),
        }
    }

    /// The canonical unit text.
    pub fn as_str(&self) -> &str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::Em => "em",
            LengthUnit::Rem => "rem",
            LengthUnit::Ex => "ex",
            LengthUnit::Ch => "ch",
            LengthUnit::Vw => "vw",
            LengthUnit::Vh => "vh",
            LengthUnit::Vmin => "vmin",
            LengthUnit::Vmax => "vmax",
            LengthUnit::Pt => "pt",
            LengthUnit::Pc => "pc",
            LengthUnit::In => "in",
            LengthUnit::Cm => "cm",
            LengthUnit::Mm => "mm",
            LengthUnit::Q => "q",
            LengthUnit::Other(unit) => unit.as_str(),
        }
    }
}

impl ToCss for Length {
    fn to_css<W: fmt::Write>(&self, dest: &mut Printer<'_, W>) -> Result<()> {
        // A zero length needs no unit.
        if self.value == 0.0 && dest.minify && !matches!(self.unit, LengthUnit::Other(_)) {
            return dest.write_char('0');
        }
        dest.write_number(self.value)?;
        dest.write_str(self.unit.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::ToCss;

    #[test]
    fn unit_round_trip() {
        let length = Length::new(12.5, "px");
        assert_eq!(length.to_css_string(), "12.5px");
    }

    #[test]
    fn unknown_unit_is_preserved() {
        let length = Length::new(3.0, "fr");
        assert_eq!(length.unit, LengthUnit::Other("fr".into()));
        assert_eq!(length.to_css_string(), "3fr");
    }
}
