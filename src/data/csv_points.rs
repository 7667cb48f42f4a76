//! Point lists stored as CSV.
//!
//! A point file is just numbers separated by commas and newlines. The numbers
//! are grouped into points of `dimension` components in reading order, so the
//! line layout does not matter:
//!
//! ```text
//! 1,2,3
//! 4,5,6,
//! ```
//!
//! is the same as `1,2,3,4,5,6`. Two-component points get `z = 0`.

use crate::error::{GrblError, Result};
use crate::geometry::Point;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

fn check_dimension(dimension: usize) -> Result<()> {
    if dimension == 2 || dimension == 3 {
        Ok(())
    } else {
        Err(GrblError::CsvFormat(format!(
            "unsupported point dimension {}, expected 2 or 3",
            dimension
        )))
    }
}

/// Load points from a CSV file.
pub fn load_points(path: impl AsRef<Path>, dimension: usize) -> Result<Vec<Point>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let points = read_points(file, dimension)?;
    info!("Loaded {} points from '{}'", points.len(), path.display());
    Ok(points)
}

/// Parse points from any CSV source.
pub fn read_points<R: Read>(reader: R, dimension: usize) -> Result<Vec<Point>> {
    check_dimension(dimension)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| GrblError::CsvFormat(e.to_string()))?;
        for field in record.iter().filter(|f| !f.is_empty()) {
            let value = field
                .parse::<f64>()
                .map_err(|_| GrblError::CsvFormat(format!("'{}' is not a number", field)))?;
            values.push(value);
        }
    }

    if values.len() % dimension != 0 {
        return Err(GrblError::CsvFormat(format!(
            "{} values cannot be split into points of {} components",
            values.len(),
            dimension
        )));
    }

    Ok(values
        .chunks_exact(dimension)
        .map(|c| Point::new(c[0], c[1], c.get(2).copied().unwrap_or(0.0)))
        .collect())
}

/// Write points one per line with `dimension` components.
pub fn write_points<W: Write>(writer: W, points: &[Point], dimension: usize) -> Result<()> {
    check_dimension(dimension)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    for point in points {
        let record = if dimension == 2 {
            vec![point.x.to_string(), point.y.to_string()]
        } else {
            vec![point.x.to_string(), point.y.to_string(), point.z.to_string()]
        };
        csv_writer
            .write_record(&record)
            .map_err(|e| GrblError::CsvFormat(e.to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write points to a CSV file.
pub fn save_points(path: impl AsRef<Path>, points: &[Point], dimension: usize) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_points(file, points, dimension)
}
