use litefetch::format_csv::{write_csv, write_csv_to_writer};
use litefetch::shaper::{CellValue, QueryResult};

fn make_result(columns: &[&str], rows: Vec<Vec<CellValue>>) -> QueryResult {
    QueryResult {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows,
        limit_applied: None,
    }
}

fn render(result: &QueryResult) -> String {
    let mut buf = Vec::new();
    write_csv_to_writer(result, &mut buf).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn basic_output_header_and_data_rows() {
    let result = make_result(
        &["id", "name", "score"],
        vec![
            vec![CellValue::Integer(1), CellValue::from("Alice"), CellValue::Real(9.5)],
            vec![CellValue::Integer(2), CellValue::from("Bob"), CellValue::Real(7.0)],
        ],
    );

    assert_eq!(render(&result), "id,name,score\r\n1,Alice,9.5\r\n2,Bob,7\r\n");
}

#[test]
fn null_values_produce_empty_fields() {
    let result = make_result(
        &["a", "b", "c"],
        vec![
            vec![CellValue::from("x"), CellValue::Null, CellValue::from("z")],
            vec![CellValue::Null, CellValue::Null, CellValue::Null],
        ],
    );

    assert_eq!(render(&result), "a,b,c\r\nx,,z\r\n,,\r\n");
}

#[test]
fn blobs_are_base64() {
    let result = make_result(
        &["k", "payload"],
        vec![vec![CellValue::Integer(1), CellValue::Blob(vec![0xde, 0xad, 0xbe, 0xef])]],
    );

    assert_eq!(render(&result), "k,payload\r\n1,3q2+7w==\r\n");
}

#[test]
fn rfc4180_escaping_commas_quotes_newlines() {
    let result = make_result(
        &["val"],
        vec![
            vec![CellValue::from("hello, world")],
            vec![CellValue::from("say \"hi\"")],
            vec![CellValue::from("line1\nline2")],
        ],
    );

    let expected = "val\r\n\
                    \"hello, world\"\r\n\
                    \"say \"\"hi\"\"\"\r\n\
                    \"line1\nline2\"\r\n";
    assert_eq!(render(&result), expected);
}

#[test]
fn empty_result_set_produces_header_only() {
    let result = make_result(&["col1", "col2"], vec![]);
    assert_eq!(render(&result), "col1,col2\r\n");
}

#[test]
fn write_csv_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let result = make_result(&["n"], vec![vec![CellValue::Integer(42)]]);

    write_csv(&result, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "n\r\n42\r\n");
}

#[test]
fn write_csv_missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("out.csv");
    let result = make_result(&["n"], vec![]);

    let err = write_csv(&result, &path).unwrap_err();
    assert!(err.to_string().starts_with("io:"), "Got: {err}");
}
