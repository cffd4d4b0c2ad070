use super::*;
use std::io::Write;

const SCAN: &str = "\
X,Y,Intensity,Wavenumber,Shift
0.0,0.0,10,520.1,0.1
1.0,0.0,11,520.2,0.2
2.0,0.0,12,520.3,0.3
0.0,1.5,20,521.1,1.1
1.0,1.5,21,521.2,1.2
2.0,1.5,22,521.3,1.3
";

fn table(text: &str) -> ScanTable {
    ScanTable::from_str_with_delimiter(text, b',', Path::new("scan.csv")).unwrap()
}

#[test]
fn test_pivot_places_values_by_coordinate_rank() {
    let grid = table(SCAN)
        .pivot("X", "Y", &["Intensity", "Wavenumber"])
        .unwrap();

    assert_eq!(grid.shape(), (2, 3));
    assert_eq!(grid.x_values, vec![0.0, 1.0, 2.0]);
    assert_eq!(grid.y_values, vec![0.0, 1.5]);

    let intensity = grid.layer("Intensity").unwrap();
    assert_eq!(intensity.shape(), (2, 3));
    assert_eq!(intensity.get(0, 0), 10.0);
    assert_eq!(intensity.get(2, 0), 12.0);
    assert_eq!(intensity.get(1, 1), 21.0);

    let wavenumber = grid.layer("Wavenumber").unwrap();
    assert_eq!(wavenumber.get(2, 1), 521.3);
    assert!(grid.layer("Shift").is_none());
}

#[test]
fn test_pivot_is_independent_of_record_order() {
    let shuffled = "\
X,Y,Intensity
2.0,1.5,22
0.0,0.0,10
1.0,1.5,21
2.0,0.0,12
0.0,1.5,20
1.0,0.0,11
";
    let a = table(SCAN).pivot("X", "Y", &["Intensity"]).unwrap();
    let b = table(shuffled).pivot("X", "Y", &["Intensity"]).unwrap();
    assert_eq!(a.layers[0].raster, b.layers[0].raster);
}

#[test]
fn test_missing_cells_are_nan() {
    let sparse = "X,Y,I\n0,0,1\n1,0,2\n0,1,3\n";
    let grid = table(sparse).pivot("X", "Y", &["I"]).unwrap();
    let raster = grid.layer("I").unwrap();
    assert_eq!(raster.get(0, 1), 3.0);
    assert!(raster.get(1, 1).is_nan());
}

#[test]
fn test_non_numeric_records_are_skipped() {
    let text = "X,Y,I\n0,0,1\n1,0,n/a\n1,0,2\n";
    let grid = table(text).pivot("X", "Y", &["I"]).unwrap();
    assert_eq!(grid.layer("I").unwrap().samples(), &[1.0, 2.0]);
}

#[test]
fn test_unknown_column_is_schema_error() {
    let err = table(SCAN).pivot("X", "Y", &["Raman"]).unwrap_err();
    match err {
        Error::Schema { reason, .. } => assert!(reason.contains("Raman")),
        other => panic!("expected Schema, got {other:?}"),
    }
}

#[test]
fn test_read_tsv_from_file() {
    let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
    file.write_all(SCAN.replace(',', "\t").as_bytes()).unwrap();
    file.flush().unwrap();

    let table = ScanTable::read(file.path()).unwrap();
    assert_eq!(table.len(), 6);
    assert_eq!(table.headers()[4], "Shift");
    let grid = table.pivot("X", "Y", &["Shift"]).unwrap();
    assert_eq!(grid.layer("Shift").unwrap().get(0, 1), 1.1);
}

#[test]
fn test_read_missing_file() {
    let err = ScanTable::read(Path::new("/no/such/scan.csv")).unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}
