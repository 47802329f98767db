//! Table orientation state and rendering.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::borrow::Cow;
use std::sync::Arc;

use crate::data::Table;
use crate::format::{format_table, DisplayCell};
use crate::logging::{log, obj, v_str, Domain, Level, ProfileScope};

/// Label column header used when models become the rows.
pub const TRANSPOSED_LABEL_HEADER: &str = "Model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutMode {
    /// Rows are the input rows (test cases).
    #[default]
    #[serde(rename = "default")]
    Normal,
    /// Rows are the input score columns (models).
    #[serde(rename = "transpose")]
    Transposed,
}

impl LayoutMode {
    /// Selector options as `(label, value)`.
    pub const OPTIONS: [(&'static str, LayoutMode); 2] = [
        ("Tests as Rows", LayoutMode::Normal),
        ("Models as Rows", LayoutMode::Transposed),
    ];

    /// Selector value; anything other than `transpose` means `default`.
    pub fn from_value(value: &str) -> Self {
        match value {
            "transpose" => LayoutMode::Transposed,
            _ => LayoutMode::Normal,
        }
    }

    pub fn as_value(&self) -> &'static str {
        match self {
            LayoutMode::Normal => "default",
            LayoutMode::Transposed => "transpose",
        }
    }
}

/// Everything needed to draw one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub layout: LayoutMode,
    pub label_column: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<DisplayCell>>,
}

/// Orients `table` for `mode` and formats every cell. The transpose is
/// computed on each call.
pub fn render(table: &Table, mode: LayoutMode) -> ViewModel {
    let _scope = ProfileScope::with_context("render", &[("layout", v_str(mode.as_value()))]);
    let oriented: Cow<'_, Table> = match mode {
        LayoutMode::Normal => Cow::Borrowed(table),
        LayoutMode::Transposed => Cow::Owned(table.transposed(TRANSPOSED_LABEL_HEADER)),
    };
    ViewModel {
        layout: mode,
        label_column: oriented.label_header().to_string(),
        columns: oriented.columns().to_vec(),
        rows: format_table(&oriented),
    }
}

/// Holds the shared table and the currently selected layout.
#[derive(Debug, Clone)]
pub struct View {
    table: Arc<Table>,
    title: String,
    layout: LayoutMode,
}

impl View {
    pub fn new(table: Arc<Table>, title: impl Into<String>) -> Self {
        Self {
            table,
            title: title.into(),
            layout: LayoutMode::Normal,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Switches to `layout` and renders it.
    pub fn select(&mut self, layout: LayoutMode) -> ViewModel {
        if layout != self.layout {
            log(
                Level::Debug,
                Domain::Render,
                "layout_changed",
                obj(&[
                    ("from", v_str(self.layout.as_value())),
                    ("to", v_str(layout.as_value())),
                    ("rows", json!(self.table.rows().len())),
                ]),
            );
            self.layout = layout;
        }
        self.current()
    }

    pub fn current(&self) -> ViewModel {
        render(&self.table, self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Row;

    fn sample() -> Arc<Table> {
        let table = Table::new(
            "Test",
            vec!["m1".into(), "m2".into()],
            vec![
                Row::new("t1", vec![Some(0.2), Some(1.0)]),
                Row::new("t2", vec![Some(0.8), Some(0.0)]),
            ],
        )
        .unwrap()
        .with_average();
        Arc::new(table)
    }

    #[test]
    fn test_layout_values() {
        assert_eq!(LayoutMode::from_value("transpose"), LayoutMode::Transposed);
        assert_eq!(LayoutMode::from_value("default"), LayoutMode::Normal);
        assert_eq!(LayoutMode::from_value("sideways"), LayoutMode::Normal);
        assert_eq!(LayoutMode::Transposed.as_value(), "transpose");
        assert_eq!(LayoutMode::default().as_value(), "default");
        assert_eq!(serde_json::to_value(LayoutMode::Transposed).unwrap(), "transpose");
    }

    #[test]
    fn test_render_transposed_headers() {
        let vm = render(&sample(), LayoutMode::Transposed);
        assert_eq!(vm.label_column, TRANSPOSED_LABEL_HEADER);
        assert_eq!(vm.columns, ["t1", "t2", "Average"]);
        assert_eq!(vm.rows.len(), 2);
        assert_eq!(vm.rows[0][0].text, "m1");
        assert_eq!(vm.rows[0][3].text, "50.00");
    }

    #[test]
    fn test_view_starts_normal_and_round_trips() {
        let mut view = View::new(sample(), "Scores");
        assert_eq!(view.layout(), LayoutMode::Normal);
        let initial = view.current();
        let flipped = view.select(LayoutMode::Transposed);
        assert_eq!(flipped.layout, LayoutMode::Transposed);
        assert_ne!(flipped, initial);
        let back = view.select(LayoutMode::Normal);
        assert_eq!(back, initial);
    }
}
