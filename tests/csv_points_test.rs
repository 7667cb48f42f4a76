//! Point files on disk.

use grbl_stage::data::{load_points, save_points};
use grbl_stage::{GrblError, Point};
use tempfile::NamedTempFile;

fn create_temp_csv(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), content).unwrap();
    file
}

#[test]
fn test_load_three_dimensional_file() {
    let file = create_temp_csv("1,2,3,4,5,6");
    let points = load_points(file.path(), 3).unwrap();
    assert_eq!(
        points,
        vec![Point::new(1.0, 2.0, 3.0), Point::new(4.0, 5.0, 6.0)]
    );
}

#[test]
fn test_load_uneven_file_fails() {
    let file = create_temp_csv("1,2,3,\n4,5\n");
    let result = load_points(file.path(), 2);
    assert!(matches!(result, Err(GrblError::CsvFormat(_))));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let result = load_points("/nonexistent/points.csv", 2);
    assert!(matches!(result, Err(GrblError::Io(_))));
}

#[test]
fn test_saved_points_load_back() {
    let file = NamedTempFile::new().unwrap();
    let points = vec![Point::planar(12.5, -3.25), Point::planar(0.0, 7.0)];

    save_points(file.path(), &points, 2).unwrap();
    assert_eq!(load_points(file.path(), 2).unwrap(), points);
}
