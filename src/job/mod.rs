//! Row-to-job translation: one plan per data row, no platform access.

use crate::Result;
use crate::sheet::{ColumnRole, DataRow, SheetLayout};
use crate::value::ConfigValue;

use anyhow::bail;
use serde::Serialize;
use std::collections::BTreeMap;

/// A gear input before it is resolved against the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedInput {
    /// File name to look up in the project's files.
    ProjectFile(String),
    /// Value taken from the sheet defaults.
    Value(ConfigValue),
}

/// Everything needed to submit one row, minus the platform ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowPlan {
    /// 1-based sheet line, for messages.
    pub line: usize,
    pub session_path: String,
    pub analysis_label: String,
    pub config: BTreeMap<String, ConfigValue>,
    pub inputs: BTreeMap<String, PlannedInput>,
}

/// Translate every data row of the sheet.
pub fn build_plans(layout: &SheetLayout) -> Result<Vec<RowPlan>> {
    layout.rows.iter().map(|row| build_plan(layout, row)).collect()
}

/// Translate one row. Defaults win over the row's own cells; empty cells are left out.
pub fn build_plan(layout: &SheetLayout, row: &DataRow) -> Result<RowPlan> {
    let mut config = BTreeMap::new();
    let mut inputs = BTreeMap::new();
    let mut analysis_label = None;

    for column in &layout.columns {
        let default = layout.defaults.get(&column.key);
        let literal = row.cell(column.index);

        match column.role {
            ColumnRole::ProjectInput => {
                let input = match default {
                    Some(v) => PlannedInput::Value(v.clone()),
                    None if literal.is_empty() => continue,
                    None => PlannedInput::ProjectFile(literal.to_string()),
                };
                inputs.insert(column.key.clone(), input);
            }
            ColumnRole::Config => {
                let value = match default {
                    Some(v) => v.clone(),
                    None if literal.is_empty() => continue,
                    None => ConfigValue::from_cell(literal),
                };
                config.insert(column.key.clone(), value);
            }
            ColumnRole::Label => {
                if !literal.is_empty() {
                    analysis_label = Some(literal.to_string());
                }
            }
        }
    }

    let Some(analysis_label) = analysis_label else {
        match layout.label_column() {
            Some(col) => bail!(
                "malformed sheet: row {} ({}) has an empty analysis label in column {}",
                row.row + 1,
                row.session_path,
                col.index
            ),
            None => bail!(
                "malformed sheet: row {} ({}) has no analysis label column",
                row.row + 1,
                row.session_path
            ),
        }
    };

    Ok(RowPlan {
        line: row.row + 1,
        session_path: row.session_path.clone(),
        analysis_label,
        config,
        inputs,
    })
}
