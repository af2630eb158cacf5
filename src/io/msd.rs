//! MSD time-series loader.
//!
//! The simulator writes one whitespace-delimited table per temperature. Two
//! layouts exist:
//!
//! ```text
//! 5 columns:  step  Mg_x Mg_y Mg_z Mg_total                        (single species)
//! 9+ columns: step  Mg_x Mg_y Mg_z Mg_total  Al_x Al_y Al_z Al_total  (two species)
//! ```
//!
//! The layout is resolved once, from the first data row, into an [`MsdSchema`].
//! Unparseable or missing cells become NaN so that downstream fits can judge
//! each column's sufficiency independently.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::MsdConfig;
use crate::domain::{Axis, Species};
use crate::error::EngineError;

const SINGLE_SPECIES_COLUMNS: usize = 5;
const TWO_SPECIES_COLUMNS: usize = 9;

/// Column layout of an MSD file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsdSchema {
    /// `step` + x/y/z/total for the solute only.
    SingleSpecies,
    /// `step` + x/y/z/total for the solute, then for the solvent.
    TwoSpecies,
}

impl MsdSchema {
    pub fn from_column_count(columns: usize) -> Option<Self> {
        match columns {
            SINGLE_SPECIES_COLUMNS => Some(MsdSchema::SingleSpecies),
            n if n >= TWO_SPECIES_COLUMNS => Some(MsdSchema::TwoSpecies),
            _ => None,
        }
    }

    /// Number of columns this schema reads (extra columns are ignored).
    pub fn columns(self) -> usize {
        match self {
            MsdSchema::SingleSpecies => SINGLE_SPECIES_COLUMNS,
            MsdSchema::TwoSpecies => TWO_SPECIES_COLUMNS,
        }
    }

    pub fn species(self) -> &'static [Species] {
        match self {
            MsdSchema::SingleSpecies => &[Species::Mg],
            MsdSchema::TwoSpecies => &Species::ALL,
        }
    }

    pub fn has_species(self, species: Species) -> bool {
        self.species().contains(&species)
    }

    /// File column holding `(species, axis)`, if this schema carries it.
    pub fn column_index(self, species: Species, axis: Axis) -> Option<usize> {
        if !self.has_species(species) {
            return None;
        }
        Some(1 + 4 * species.index() + axis.index())
    }
}

/// One row of an MSD file.
///
/// MSD values are in Å²; absent species/cells are NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesSample {
    /// Simulation step as written (NaN when unparseable).
    pub step: f64,
    msd: [[f64; 4]; 2],
}

impl TimeSeriesSample {
    pub fn new(step: f64, msd: [[f64; 4]; 2]) -> Self {
        Self { step, msd }
    }

    pub fn msd(&self, species: Species, axis: Axis) -> f64 {
        self.msd[species.index()][axis.index()]
    }
}

/// Parsed MSD file.
#[derive(Debug, Clone)]
pub struct MsdSeries {
    pub source: PathBuf,
    pub schema: MsdSchema,
    pub samples: Vec<TimeSeriesSample>,
}

impl MsdSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn steps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.step).collect()
    }

    /// MSD column in Å². A species the schema lacks yields all-NaN.
    pub fn column(&self, species: Species, axis: Axis) -> Vec<f64> {
        self.samples.iter().map(|s| s.msd(species, axis)).collect()
    }
}

/// Load an MSD file from disk.
///
/// `expected`, when set, must match the detected schema.
pub fn load_msd_series(
    path: &Path,
    opts: &MsdConfig,
    expected: Option<MsdSchema>,
) -> Result<MsdSeries, EngineError> {
    let text = fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
    parse_msd_series(&text, path, opts, expected)
}

/// Parse MSD text; `source` is only used for error messages.
pub fn parse_msd_series(
    text: &str,
    source: &Path,
    opts: &MsdConfig,
    expected: Option<MsdSchema>,
) -> Result<MsdSeries, EngineError> {
    let mut schema: Option<MsdSchema> = None;
    let mut samples = Vec::new();

    for line in text.lines().skip(opts.header_lines) {
        let line = line.trim();
        if line.is_empty() || line.starts_with(opts.comment_marker) {
            continue;
        }
        let cells: Vec<&str> = line.split_whitespace().collect();

        let schema = match schema {
            Some(s) => s,
            None => {
                let detected = MsdSchema::from_column_count(cells.len()).ok_or_else(|| {
                    EngineError::Format {
                        path: source.to_path_buf(),
                        message: format!(
                            "unexpected number of columns ({}); expected {SINGLE_SPECIES_COLUMNS} or >= {TWO_SPECIES_COLUMNS}",
                            cells.len()
                        ),
                    }
                })?;
                if let Some(want) = expected {
                    if want != detected {
                        return Err(EngineError::Format {
                            path: source.to_path_buf(),
                            message: format!("expected {want:?} layout, found {detected:?}"),
                        });
                    }
                }
                schema = Some(detected);
                detected
            }
        };

        samples.push(parse_row(&cells, schema));
    }

    let Some(schema) = schema else {
        return Err(EngineError::Format {
            path: source.to_path_buf(),
            message: "no data rows".to_string(),
        });
    };

    debug!(
        path = %source.display(),
        ?schema,
        rows = samples.len(),
        "parsed MSD series"
    );

    Ok(MsdSeries {
        source: source.to_path_buf(),
        schema,
        samples,
    })
}

fn parse_row(cells: &[&str], schema: MsdSchema) -> TimeSeriesSample {
    let cell = |i: usize| -> f64 { cells.get(i).map_or(f64::NAN, |s| parse_f64(s)) };

    let mut msd = [[f64::NAN; 4]; 2];
    for &species in schema.species() {
        for axis in Axis::ALL {
            if let Some(idx) = schema.column_index(species, axis) {
                msd[species.index()][axis.index()] = cell(idx);
            }
        }
    }
    TimeSeriesSample::new(cell(0), msd)
}

fn parse_f64(s: &str) -> f64 {
    s.parse::<f64>().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "# Time-averaged data for fix msd_out\n# TimeStep c_msd[1] ...\n# more\n";

    fn opts() -> MsdConfig {
        MsdConfig::default()
    }

    fn parse(text: &str) -> Result<MsdSeries, EngineError> {
        parse_msd_series(text, Path::new("test.dat"), &opts(), None)
    }

    #[test]
    fn single_species_schema() {
        let text = format!("{HEADER}0 0 0 0 0\n100 0.1 0.2 0.3 0.6\n200 0.2 0.4 0.6 1.2\n");
        let series = parse(&text).unwrap();
        assert_eq!(series.schema, MsdSchema::SingleSpecies);
        assert_eq!(series.len(), 3);
        assert_eq!(series.steps(), vec![0.0, 100.0, 200.0]);
        assert_eq!(series.column(Species::Mg, Axis::Total), vec![0.0, 0.6, 1.2]);
        assert_eq!(series.column(Species::Mg, Axis::Y), vec![0.0, 0.2, 0.4]);
        assert!(series.column(Species::Al, Axis::Total).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn two_species_schema_ignores_extra_columns() {
        let text = format!("{HEADER}0 1 2 3 4 5 6 7 8 99 99\n10 1 2 3 4 5 6 7 8 99 99\n");
        let series = parse(&text).unwrap();
        assert_eq!(series.schema, MsdSchema::TwoSpecies);
        assert_eq!(series.column(Species::Mg, Axis::X), vec![1.0, 1.0]);
        assert_eq!(series.column(Species::Al, Axis::X), vec![5.0, 5.0]);
        assert_eq!(series.column(Species::Al, Axis::Total), vec![8.0, 8.0]);
    }

    #[test]
    fn wrong_column_count_is_format_error() {
        let text = format!("{HEADER}0 1 2 3\n");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, EngineError::Format { .. }));

        let text = format!("{HEADER}0 1 2 3 4 5 6\n");
        assert!(matches!(parse(&text).unwrap_err(), EngineError::Format { .. }));
    }

    #[test]
    fn expected_schema_mismatch_is_format_error() {
        let text = format!("{HEADER}0 1 2 3 4\n");
        let err = parse_msd_series(&text, Path::new("x"), &opts(), Some(MsdSchema::TwoSpecies))
            .unwrap_err();
        assert!(matches!(err, EngineError::Format { .. }));
    }

    #[test]
    fn bad_cells_become_nan() {
        let text = format!("{HEADER}0 0 0 0 0\n100 0.1 abc 0.3\n# interleaved comment\n\n200 0.2 0.4 0.6 1.2\n");
        let series = parse(&text).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.samples[1].msd(Species::Mg, Axis::Y).is_nan());
        assert!(series.samples[1].msd(Species::Mg, Axis::Total).is_nan());
        assert_eq!(series.samples[1].msd(Species::Mg, Axis::Z), 0.3);
    }

    #[test]
    fn header_lines_are_skipped_even_without_comment_marker() {
        let text = "title line\n3 columns here\nanother\n0 0 0 0 0\n";
        let series = parse(text).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn empty_file_is_format_error() {
        assert!(matches!(parse(HEADER).unwrap_err(), EngineError::Format { .. }));
    }

    #[test]
    fn load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{HEADER}0 0 0 0 0\n100 1 1 1 3\n").unwrap();
        let series = load_msd_series(file.path(), &opts(), Some(MsdSchema::SingleSpecies)).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.source, file.path());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_msd_series(Path::new("/nonexistent/msd_T1.dat"), &opts(), None).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
