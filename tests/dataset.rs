use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use photo_grab::config::Columns;
use photo_grab::dataset::{load_rows, read_rows};
use photo_grab::error::GrabError;

const HEADER: &str = "photo_url,participant_code,diary_date,meal_consume_time\n";

#[test]
fn rows_without_url_are_dropped_in_order() {
    let csv = format!(
        "{HEADER}\
         http://example.test/1.jpg,P01,05/01/2024,08:30:00\n\
         ,P02,05/01/2024,09:00:00\n\
         http://example.test/3.jpg,P03,06/01/2024,12:00:00\n\
         \"  \",P04,06/01/2024,13:00:00\n\
         http://example.test/5.jpg,P05,07/01/2024,19:15:00\n"
    );

    let rows = read_rows(csv.as_bytes(), &Columns::default()).unwrap();
    let ids: Vec<_> = rows
        .iter()
        .map(|row| row.participant.as_deref().unwrap())
        .collect();
    assert_eq!(ids, vec!["P01", "P03", "P05"]);
    let lines: Vec<_> = rows.iter().map(|row| row.line).collect();
    assert_eq!(lines, vec![1, 3, 5]);
}

#[test]
fn custom_column_names_are_honoured() {
    let columns = Columns {
        url: "url".to_string(),
        id: "who".to_string(),
        date: "day".to_string(),
        time: "at".to_string(),
    };
    let csv = "at,day,who,url\n08:30:00,05/01/2024,P01,http://example.test/a.jpg\n";

    let rows = read_rows(csv.as_bytes(), &columns).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].url, "http://example.test/a.jpg");
    assert_eq!(rows[0].participant.as_deref(), Some("P01"));
    assert_eq!(rows[0].date.as_deref(), Some("05/01/2024"));
    assert_eq!(rows[0].time.as_deref(), Some("08:30:00"));
}

#[test]
fn absent_id_column_leaves_rows_without_participant() {
    let csv = "photo_url,diary_date,meal_consume_time\nhttp://example.test/a.jpg,05/01/2024,08:30:00\n";
    let rows = read_rows(csv.as_bytes(), &Columns::default()).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].participant, None);
    assert_eq!(rows[0].display_id(), "??");
}

#[test]
fn missing_file_is_a_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("absent.csv")).unwrap();
    let err = load_rows(&path, &Columns::default()).unwrap_err();
    assert_matches!(err, GrabError::DatasetRead { .. });
}

#[test]
fn invalid_utf8_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("photos.csv")).unwrap();
    let mut bytes = HEADER.as_bytes().to_vec();
    bytes.extend_from_slice(b"http://example.test/a.jpg,P\xff\xfe,05/01/2024,08:30:00\n");
    fs::write(path.as_std_path(), bytes).unwrap();

    let err = load_rows(&path, &Columns::default()).unwrap_err();
    assert_matches!(err, GrabError::DatasetParse(_));
}
