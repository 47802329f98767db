//! Cell formatting: percentage text and red-to-green backgrounds.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::data::Table;

/// Input accepted by [`color_gradient`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Number(f64),
    Text(&'a str),
    Missing,
}

impl RawValue<'_> {
    /// The value as a ratio in [0,1], if it is one.
    pub fn ratio(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(v) => *v,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Missing => return None,
        };
        (v.is_finite() && (0.0..=1.0).contains(&v)).then_some(v)
    }
}

impl From<f64> for RawValue<'_> {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<Option<f64>> for RawValue<'_> {
    fn from(v: Option<f64>) -> Self {
        v.map_or(RawValue::Missing, RawValue::Number)
    }
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(s: &'a str) -> Self {
        RawValue::Text(s)
    }
}

impl<'a> From<Option<&'a str>> for RawValue<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(RawValue::Missing, RawValue::Text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Rgb(u8, u8, u8),
    White,
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Background::Rgb(r, g, b) => write!(f, "rgb({}, {}, {})", r, g, b),
            Background::White => f.write_str("white"),
        }
    }
}

impl Serialize for Background {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Linear red (0) to green (1) gradient; channels are truncated, not rounded.
/// Anything that is not a ratio in [0,1] gets a white background.
pub fn color_gradient<'a>(value: impl Into<RawValue<'a>>) -> Background {
    match value.into().ratio() {
        Some(v) => {
            let r = (255.0 * (1.0 - v)) as u8;
            let g = (255.0 * v) as u8;
            Background::Rgb(r, g, 0)
        }
        None => Background::White,
    }
}

/// Ratio as a percentage with two decimals; blank for missing or
/// non-finite values.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v * 100.0),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Background>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
}

impl CellStyle {
    pub fn emphasized() -> Self {
        Self {
            font_weight: Some("bold"),
            background_color: None,
            color: None,
        }
    }

    pub fn background(background: Background) -> Self {
        Self {
            font_weight: None,
            background_color: Some(background),
            color: Some("black"),
        }
    }

    /// Inline CSS declarations.
    pub fn css(&self) -> String {
        let mut parts = Vec::new();
        if let Some(w) = self.font_weight {
            parts.push(format!("font-weight: {}", w));
        }
        if let Some(bg) = self.background_color {
            parts.push(format!("background-color: {}", bg));
        }
        if let Some(c) = self.color {
            parts.push(format!("color: {}", c));
        }
        parts.join("; ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayCell {
    pub column: String,
    pub text: String,
    pub raw: Option<f64>,
    pub style: CellStyle,
}

impl DisplayCell {
    pub fn label(column: &str, label: &str) -> Self {
        Self {
            column: column.to_string(),
            text: label.to_string(),
            raw: None,
            style: CellStyle::emphasized(),
        }
    }

    pub fn score(column: &str, raw: Option<f64>) -> Self {
        // Colour comes from the 0-1 ratio, before the x100 text formatting.
        let background = color_gradient(raw);
        Self {
            column: column.to_string(),
            text: format_percent(raw),
            raw,
            style: CellStyle::background(background),
        }
    }
}

/// One row of cells per table row: the bold label first, then one coloured
/// cell per score column.
pub fn format_table(table: &Table) -> Vec<Vec<DisplayCell>> {
    table
        .rows()
        .iter()
        .map(|row| {
            let mut cells = Vec::with_capacity(row.values.len() + 1);
            cells.push(DisplayCell::label(table.label_header(), &row.label));
            for (column, raw) in table.columns().iter().zip(&row.values) {
                cells.push(DisplayCell::score(column, *raw));
            }
            cells
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Row, Table};

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(color_gradient(0.0).to_string(), "rgb(255, 0, 0)");
        assert_eq!(color_gradient(1.0).to_string(), "rgb(0, 255, 0)");
        assert_eq!(color_gradient(0.5).to_string(), "rgb(127, 127, 0)");
    }

    #[test]
    fn test_gradient_truncates() {
        // 255 * 0.7 = 178.5, 255 * 0.3 = 76.5
        assert_eq!(color_gradient(0.3), Background::Rgb(178, 76, 0));
    }

    #[test]
    fn test_gradient_fallbacks() {
        assert_eq!(color_gradient("not-a-number").to_string(), "white");
        assert_eq!(color_gradient(None::<f64>).to_string(), "white");
        assert_eq!(color_gradient(None::<&str>), Background::White);
        assert_eq!(color_gradient(f64::NAN), Background::White);
        assert_eq!(color_gradient(1.5), Background::White);
        assert_eq!(color_gradient(-0.1), Background::White);
    }

    #[test]
    fn test_gradient_parses_text() {
        assert_eq!(color_gradient(" 0.5 "), Background::Rgb(127, 127, 0));
        assert_eq!(color_gradient(Some("1")), Background::Rgb(0, 255, 0));
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(Some(0.5)), "50.00");
        assert_eq!(format_percent(Some(0.875)), "87.50");
        assert_eq!(format_percent(Some(1.0)), "100.00");
        assert_eq!(format_percent(None), "");
        assert_eq!(format_percent(Some(f64::NAN)), "");
    }

    #[test]
    fn test_style_serializes_like_css_map() {
        let bold = serde_json::to_value(CellStyle::emphasized()).unwrap();
        assert_eq!(bold, serde_json::json!({"fontWeight": "bold"}));
        let colored = serde_json::to_value(CellStyle::background(Background::Rgb(255, 0, 0))).unwrap();
        assert_eq!(
            colored,
            serde_json::json!({"backgroundColor": "rgb(255, 0, 0)", "color": "black"})
        );
        assert_eq!(
            CellStyle::background(Background::White).css(),
            "background-color: white; color: black"
        );
    }

    #[test]
    fn test_format_table_label_then_scores() {
        let table = Table::new(
            "Test",
            vec!["m1".into(), "m2".into()],
            vec![Row::new("a", vec![Some(1.0), None])],
        )
        .unwrap();
        let cells = format_table(&table);
        assert_eq!(cells.len(), 1);
        let row = &cells[0];
        assert_eq!(row[0], DisplayCell::label("Test", "a"));
        assert_eq!(row[1].text, "100.00");
        assert_eq!(row[1].style.background_color, Some(Background::Rgb(0, 255, 0)));
        assert_eq!(row[2].text, "");
        assert_eq!(row[2].style.background_color, Some(Background::White));
    }
}
