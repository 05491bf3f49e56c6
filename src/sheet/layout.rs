//! Fixed-position layout of a batch job sheet.
//!
//! Cell coordinates are 0-based (row, column):
//!
//! ```text
//! (0,1)  project label        (0,4)  gear name
//! (0,8)  default keys  {'a','b'}      (0,10) default values  {1,true}
//! row 1  key name per column (column 1 onward)
//! row 4  role per column: project | config | anything else = analysis label
//! row 7+ data rows; column 0 = session path ("subject/session")
//! ```

use crate::Result;
use crate::sheet::Grid;
use crate::value::ConfigValue;

use anyhow::bail;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

const HEADER_ROW: usize = 0;
const PROJECT_COL: usize = 1;
const GEAR_COL: usize = 4;
const DEFAULT_KEYS_COL: usize = 8;
const DEFAULT_VALUES_COL: usize = 10;
const KEY_ROW: usize = 1;
const ROLE_ROW: usize = 4;
const FIRST_DATA_ROW: usize = 7;
const SESSION_COL: usize = 0;

/// What a sheet column feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    /// Gear input resolved from the project's files.
    ProjectInput,
    /// Gear config option.
    Config,
    /// Analysis label for the row.
    Label,
}

impl ColumnRole {
    fn from_cell(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "project" => ColumnRole::ProjectInput,
            "config" => ColumnRole::Config,
            _ => ColumnRole::Label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSpec {
    pub index: usize,
    pub key: String,
    pub role: ColumnRole,
}

/// One subject/session row.
#[derive(Debug, Clone)]
pub struct DataRow {
    /// 0-based row in the sheet.
    pub row: usize,
    pub session_path: String,
    cells: Vec<String>,
}

impl DataRow {
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }
}

/// Header metadata, column roles and data rows, validated once per sheet.
#[derive(Debug, Clone)]
pub struct SheetLayout {
    pub project_label: String,
    pub gear_name: String,
    pub defaults: BTreeMap<String, ConfigValue>,
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<DataRow>,
}

impl SheetLayout {
    pub fn from_path(path: &str) -> Result<Self> {
        Self::from_grid(&Grid::from_path(path)?)
    }

    pub fn from_grid(grid: &Grid) -> Result<Self> {
        let project_label = required_cell(grid, HEADER_ROW, PROJECT_COL, "project label")?;
        let gear_name = required_cell(grid, HEADER_ROW, GEAR_COL, "gear name")?;
        let defaults = parse_defaults(
            grid.cell(HEADER_ROW, DEFAULT_KEYS_COL),
            grid.cell(HEADER_ROW, DEFAULT_VALUES_COL),
        )?;

        let columns = parse_columns(grid)?;

        let mut rows = Vec::new();
        for row in FIRST_DATA_ROW..grid.row_count() {
            let session_path = grid.cell(row, SESSION_COL);
            if session_path.is_empty() {
                log::debug!("skipping row {}: no session", row + 1);
                continue;
            }
            rows.push(DataRow {
                row,
                session_path: session_path.to_string(),
                cells: (0..grid.width(row))
                    .map(|c| grid.cell(row, c).to_string())
                    .collect(),
            });
        }

        Ok(Self {
            project_label,
            gear_name,
            defaults,
            columns,
            rows,
        })
    }

    pub fn label_column(&self) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.role == ColumnRole::Label)
    }
}

fn required_cell(grid: &Grid, row: usize, col: usize, what: &str) -> Result<String> {
    let text = grid.cell(row, col);
    if text.is_empty() {
        bail!("malformed sheet: missing {} at cell ({}, {})", what, row, col);
    }
    Ok(text.to_string())
}

fn parse_columns(grid: &Grid) -> Result<Vec<ColumnSpec>> {
    let mut columns = Vec::new();
    for index in 1..grid.width(KEY_ROW) {
        let key = grid.cell(KEY_ROW, index);
        if key.is_empty() {
            continue;
        }
        columns.push(ColumnSpec {
            index,
            key: key.to_string(),
            role: ColumnRole::from_cell(grid.cell(ROLE_ROW, index)),
        });
    }

    let labels: Vec<&ColumnSpec> = columns
        .iter()
        .filter(|c| c.role == ColumnRole::Label)
        .collect();
    match labels.as_slice() {
        [] => bail!(
            "malformed sheet: no analysis label column (row {} has no column outside project/config)",
            ROLE_ROW
        ),
        [_] => {}
        many => bail!(
            "malformed sheet: multiple analysis label columns: {}",
            many.iter()
                .map(|c| format!("{} (column {})", c.key, c.index))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }

    Ok(columns)
}

/// Build the default config map from the two brace-delimited header cells.
pub fn parse_defaults(keys_cell: &str, values_cell: &str) -> Result<BTreeMap<String, ConfigValue>> {
    if keys_cell.is_empty() && values_cell.is_empty() {
        return Ok(BTreeMap::new());
    }

    let keys = brace_list(keys_cell, DEFAULT_KEYS_COL)?;
    let values = brace_list(values_cell, DEFAULT_VALUES_COL)?;
    if keys.len() != values.len() {
        bail!(
            "malformed sheet: {} default keys but {} default values",
            keys.len(),
            values.len()
        );
    }

    Ok(keys
        .into_iter()
        .map(|k| k.trim_matches(|c| c == '\'' || c == '"').to_string())
        .zip(values.into_iter().map(|v| ConfigValue::from_cell(&v)))
        .collect())
}

/// "{a, b}" -> ["a", "b"]. Only the text between the first '{' and the next '}' counts.
fn brace_list(cell: &str, col: usize) -> Result<Vec<String>> {
    let re = Regex::new(r"\{([^}]*)\}")?;
    let Some(caps) = re.captures(cell) else {
        bail!(
            "malformed sheet: cell ({}, {}) must be a brace-delimited list, got {:?}",
            HEADER_ROW,
            col,
            cell
        );
    };
    let inner = caps[1].trim();
    if inner.is_empty() {
        return Ok(vec![]);
    }
    Ok(inner.split(',').map(|s| s.trim().to_string()).collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A small fmriprep-style sheet: two inputs, two configs, a label column, two sessions.
    pub(crate) const SAMPLE: &str = "\
project,flicker,,gear,fmriprep-hpc,,,keys,\"{'fs_license','skip_bids_validation'}\",values,\"{license.txt,True}\"
,fs_license,freesurfer_license,output_spaces,skip_bids_validation,label
,,,,,
,,,,,
,config,project,config,config,tag
,,,,,
,,,,,
sub-01/ses-01,,license.txt,MNI152NLin2009cAsym,,fmriprep sub-01
sub-02/ses-01,,license2.txt,T1w,,fmriprep sub-02
";

    fn sample() -> SheetLayout {
        SheetLayout::from_grid(&Grid::from_reader(SAMPLE.as_bytes()).unwrap()).unwrap()
    }

    #[test]
    fn defaults_round_trip_from_header_cells() {
        let d = parse_defaults("{a,b}", "{1,true}").unwrap();
        let expected: BTreeMap<String, ConfigValue> = [
            ("a".to_string(), ConfigValue::Str("1".into())),
            ("b".to_string(), ConfigValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        assert_eq!(d, expected);
    }

    #[test]
    fn default_keys_lose_quotes_and_spaces() {
        let d = parse_defaults("{'x', \"y\"}", "{ FALSE , abc }").unwrap();
        assert_eq!(d.get("x"), Some(&ConfigValue::Bool(false)));
        assert_eq!(d.get("y"), Some(&ConfigValue::Str("abc".into())));
    }

    #[test]
    fn empty_defaults() {
        assert!(parse_defaults("", "").unwrap().is_empty());
        assert!(parse_defaults("{}", "{}").unwrap().is_empty());
    }

    #[test]
    fn mismatched_defaults_are_rejected() {
        assert!(parse_defaults("{a,b}", "{1}").is_err());
        assert!(parse_defaults("{a}", "").is_err());
        assert!(parse_defaults("a,b", "1,2").is_err());
    }

    #[test]
    fn parses_header_and_columns() {
        let layout = sample();
        assert_eq!(layout.project_label, "flicker");
        assert_eq!(layout.gear_name, "fmriprep-hpc");
        assert_eq!(
            layout.defaults.get("skip_bids_validation"),
            Some(&ConfigValue::Bool(true))
        );
        assert_eq!(
            layout.columns.iter().map(|c| c.role).collect::<Vec<_>>(),
            vec![
                ColumnRole::Config,
                ColumnRole::ProjectInput,
                ColumnRole::Config,
                ColumnRole::Config,
                ColumnRole::Label,
            ]
        );
        let label = layout.label_column().unwrap();
        assert_eq!(label.key, "label");
        assert_eq!(label.index, 5);
    }

    #[test]
    fn collects_data_rows_and_skips_blank_sessions() {
        let text = format!("{}\n,,,,,\nsub-03/ses-02,,a.txt,T1w,,late\n", SAMPLE.trim_end());
        let layout = SheetLayout::from_grid(&Grid::from_reader(text.as_bytes()).unwrap()).unwrap();
        let sessions: Vec<&str> = layout.rows.iter().map(|r| r.session_path.as_str()).collect();
        assert_eq!(sessions, vec!["sub-01/ses-01", "sub-02/ses-01", "sub-03/ses-02"]);
        assert_eq!(layout.rows[0].row, 7);
        assert_eq!(layout.rows[1].cell(3), "T1w");
    }

    #[test]
    fn missing_gear_name_is_fatal() {
        let text = SAMPLE.replacen("fmriprep-hpc", "", 1);
        let err = SheetLayout::from_grid(&Grid::from_reader(text.as_bytes()).unwrap()).unwrap_err();
        assert!(err.to_string().contains("gear name"), "{err}");
    }

    #[test]
    fn label_column_count_is_validated() {
        let none = SAMPLE.replacen(",config,project,config,config,tag", ",config,project,config,config,config", 1);
        let err = SheetLayout::from_grid(&Grid::from_reader(none.as_bytes()).unwrap()).unwrap_err();
        assert!(err.to_string().contains("no analysis label column"), "{err}");

        let two = SAMPLE.replacen(",config,project,config,config,tag", ",config,project,,config,tag", 1);
        let err = SheetLayout::from_grid(&Grid::from_reader(two.as_bytes()).unwrap()).unwrap_err();
        assert!(err.to_string().contains("multiple analysis label columns"), "{err}");
    }
}
