//! Diffusivity CSV ingest.
//!
//! Two readers share one header-resolution path:
//!
//! - [`read_arrhenius_points`]: `T` plus a chosen diffusivity column, with its
//!   uncertainty / quality / validity companions when present
//! - [`read_diffusivity_curve`]: `T` plus `D`, `D_bulk` or `D_interdiff`,
//!   normalized to a canonical `D` for the DSA sweep
//!
//! Headers are trimmed (and a UTF-8 BOM stripped) but otherwise matched
//! case-sensitively. Unparseable numeric cells become NaN; dropping them is the
//! consumer's job.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use clap::ValueEnum;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{ArrheniusPoint, CurvePoint, Species};
use crate::error::EngineError;

/// Canonical diffusivity column names, in `auto` preference order.
const AUTO_COLUMNS: [&str; 3] = ["D", "D_bulk", "D_interdiff"];

/// Which diffusivity column of a table to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DiffusivityColumn {
    /// First of `D`, `D_bulk`, `D_interdiff`.
    Auto,
    Mg,
    Al,
    Interdiff,
}

/// Resolved column set for one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    pub value: String,
    pub error: Option<String>,
    pub quality: Option<String>,
    pub valid: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DiffusivityInput {
    /// Name of the diffusivity column that was read.
    pub column: String,
    pub points: Vec<ArrheniusPoint>,
    pub rows_read: usize,
    /// Rows excluded by an explicit `valid_*` = false flag.
    pub rows_flagged_invalid: usize,
}

/// Read `(T, D[, D_err, R2])` points from a diffusivity CSV.
pub fn read_arrhenius_points(path: &Path, column: DiffusivityColumn) -> Result<DiffusivityInput, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let header_map = build_header_map(&headers);

    let t_idx = *header_map.get("T").ok_or_else(|| EngineError::Format {
        path: path.to_path_buf(),
        message: "missing required column 'T'".to_string(),
    })?;
    let selection = resolve_columns(column, &header_map).ok_or_else(|| EngineError::Format {
        path: path.to_path_buf(),
        message: format!("no diffusivity column for selection '{column:?}'"),
    })?;
    debug!(path = %path.display(), ?selection, "resolved diffusivity columns");

    let idx = |name: &Option<String>| name.as_ref().and_then(|n| header_map.get(n).copied());
    let Some(d_idx) = header_map.get(&selection.value).copied() else {
        return Err(EngineError::Format {
            path: path.to_path_buf(),
            message: format!("missing column '{}'", selection.value),
        });
    };
    let err_idx = idx(&selection.error);
    let q_idx = idx(&selection.quality);
    let valid_idx = idx(&selection.valid);

    let mut points = Vec::new();
    let mut rows_read = 0;
    let mut rows_flagged_invalid = 0;

    for result in reader.records() {
        let record = result?;
        rows_read += 1;

        if let Some(i) = valid_idx
            && is_false(record.get(i))
        {
            rows_flagged_invalid += 1;
            continue;
        }

        points.push(ArrheniusPoint {
            temperature: cell(&record, Some(t_idx)),
            d: cell(&record, Some(d_idx)),
            d_err: err_idx.map(|i| cell(&record, Some(i))).filter(|v| v.is_finite()),
            quality: q_idx.map(|i| cell(&record, Some(i))).filter(|v| v.is_finite()),
        });
    }

    info!(
        path = %path.display(),
        column = %selection.value,
        rows = rows_read,
        flagged_invalid = rows_flagged_invalid,
        "read diffusivity table"
    );

    Ok(DiffusivityInput {
        column: selection.value,
        points,
        rows_read,
        rows_flagged_invalid,
    })
}

/// Read a `T` + `D`/`D_bulk`/`D_interdiff` curve for the DSA sweep.
///
/// Rows with missing values are kept as NaN; the sweep drops them.
pub fn read_diffusivity_curve(path: &Path) -> Result<Vec<CurvePoint>, EngineError> {
    let input = read_arrhenius_points(path, DiffusivityColumn::Auto)?;
    Ok(input
        .points
        .into_iter()
        .map(|p| CurvePoint {
            temperature: p.temperature,
            d: p.d,
        })
        .collect())
}

/// Pick the value column and its companions for `column`.
pub fn resolve_columns(column: DiffusivityColumn, header_map: &HashMap<String, usize>) -> Option<ColumnSelection> {
    let present = |name: String| header_map.contains_key(&name).then_some(name);

    let value = match column {
        DiffusivityColumn::Auto => AUTO_COLUMNS
            .iter()
            .find(|c| header_map.contains_key(**c))
            .map(|c| c.to_string())?,
        DiffusivityColumn::Mg => present(format!("D_{}", Species::Mg.label()))?,
        DiffusivityColumn::Al => present(format!("D_{}", Species::Al.label()))?,
        DiffusivityColumn::Interdiff => present("D_interdiff".to_string())?,
    };

    // "D_Mg" -> "Mg"; plain "D" has no suffix.
    let suffix = value.strip_prefix("D_");
    let quality = match column {
        DiffusivityColumn::Mg | DiffusivityColumn::Al => suffix.and_then(|s| present(format!("R2_{s}"))),
        _ => None,
    };
    let valid = match suffix {
        Some(s) => present(format!("valid_{s}")),
        None => present("valid".to_string()),
    };

    Some(ColumnSelection {
        error: present(format!("{value}_err")),
        quality,
        valid,
        value,
    })
}

pub(crate) fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), idx))
        .collect()
}

fn cell(record: &StringRecord, idx: Option<usize>) -> f64 {
    idx.and_then(|i| record.get(i))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

fn is_false(value: Option<&str>) -> bool {
    matches!(
        value.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("false" | "0" | "no")
    )
}
