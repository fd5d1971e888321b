use sheetgrid_core::reader::{DEFAULT_WORKSHEET_PATH, SHARED_STRINGS_PATH};
use sheetgrid_core::{DecodeConfig, ErrorKind, GridError, GridReader, read_grid};
use std::fs;
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const WORKSHEET_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<dimension ref="A1:B2"/><sheetData>"#;

const WORKSHEET_FOOTER: &str = "</sheetData></worksheet>";

fn worksheet(rows: &str) -> String {
    format!("{}{}{}", WORKSHEET_HEADER, rows, WORKSHEET_FOOTER)
}

fn shared_strings(items: &[&str]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        items.len()
    );
    for item in items {
        xml.push_str(&format!("<si><t>{}</t></si>", item));
    }
    xml.push_str("</sst>");
    xml
}

// Helper to create a minimal XLSX package in memory
fn create_mock_xlsx(
    parts: &[(&str, String)],
    method: zip::CompressionMethod,
) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(method);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#,
    )?;

    zip.start_file("xl/workbook.xml", options)?;
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Movimientos" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
    )?;

    for (name, content) in parts {
        zip.start_file(*name, options)?;
        zip.write_all(content.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn scenario_rows() -> String {
    r#"<row r="1"><c r="A1" t="str"><v>Fecha</v></c><c r="B1" t="str"><v>Importe</v></c></row>
<row r="2"><c r="A2" t="str"><v>2025-01-01</v></c><c r="B2" t="str"><v>100,00</v></c></row>"#
        .to_string()
}

fn expected() -> Vec<Vec<String>> {
    vec![
        vec!["Fecha".to_string(), "Importe".to_string()],
        vec!["2025-01-01".to_string(), "100,00".to_string()],
    ]
}

#[test]
fn test_xlsx_without_shared_strings() -> anyhow::Result<()> {
    let data = create_mock_xlsx(
        &[(DEFAULT_WORKSHEET_PATH, worksheet(&scenario_rows()))],
        zip::CompressionMethod::Deflated,
    )?;

    assert_eq!(read_grid("movimientos.xlsx", &data)?, expected());
    Ok(())
}

#[test]
fn test_xlsx_with_shared_string_header() -> anyhow::Result<()> {
    let rows = r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="str"><v>Importe</v></c></row>
<row r="2"><c r="A2" t="str"><v>2025-01-01</v></c><c r="B2" t="str"><v>100,00</v></c></row>"#;
    let data = create_mock_xlsx(
        &[
            (SHARED_STRINGS_PATH, shared_strings(&["Fecha"])),
            (DEFAULT_WORKSHEET_PATH, worksheet(rows)),
        ],
        zip::CompressionMethod::Deflated,
    )?;

    assert_eq!(read_grid("movimientos.xlsx", &data)?, expected());
    Ok(())
}

#[test]
fn test_stored_and_deflated_packages_decode_identically() -> anyhow::Result<()> {
    let parts = [
        (SHARED_STRINGS_PATH, shared_strings(&["Fecha", "Importe", "Concepto"])),
        (
            DEFAULT_WORKSHEET_PATH,
            worksheet(
                r#"<row r="1"><c t="s"><v>0</v></c><c t="s"><v>1</v></c><c t="s"><v>2</v></c></row>
<row r="2"><c><v>45658</v></c><c><v>-12.5</v></c><c t="s"><v>7</v></c></row>"#,
            ),
        ),
    ];
    let stored = create_mock_xlsx(&parts, zip::CompressionMethod::Stored)?;
    let deflated = create_mock_xlsx(&parts, zip::CompressionMethod::Deflated)?;
    assert_ne!(stored, deflated);

    let grid = read_grid("a.xlsx", &stored)?;
    assert_eq!(grid, read_grid("a.xlsx", &deflated)?);
    assert_eq!(
        grid,
        vec![vec!["Fecha", "Importe", "Concepto"], vec!["45658", "-12.5", ""]]
    );
    Ok(())
}

#[test]
fn test_sheet1_preferred_regardless_of_order() -> anyhow::Result<()> {
    let data = create_mock_xlsx(
        &[
            (
                "xl/worksheets/sheet2.xml",
                worksheet(r#"<row><c><v>second</v></c></row>"#),
            ),
            (
                "xl/worksheets/sheet1.xml",
                worksheet(r#"<row><c><v>first</v></c></row>"#),
            ),
        ],
        zip::CompressionMethod::Deflated,
    )?;

    assert_eq!(read_grid("a.xlsx", &data)?, vec![vec!["first"]]);
    Ok(())
}

#[test]
fn test_missing_worksheet() -> anyhow::Result<()> {
    let data = create_mock_xlsx(&[], zip::CompressionMethod::Deflated)?;
    let err = read_grid("a.xlsx", &data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingEntry);
    Ok(())
}

#[test]
fn test_corrupted_buffer_without_eocd() {
    let data: Vec<u8> = (0..4096u32).map(|i| (i * 31 % 251) as u8).collect();
    let err = read_grid("broken.xlsx", &data).unwrap_err();
    assert!(matches!(err, GridError::ContainerFormat(_)));
    assert_eq!(err.kind(), ErrorKind::Container);
}

#[test]
fn test_truncated_upload() -> anyhow::Result<()> {
    let data = create_mock_xlsx(
        &[(DEFAULT_WORKSHEET_PATH, worksheet(&scenario_rows()))],
        zip::CompressionMethod::Deflated,
    )?;
    let err = read_grid("a.xlsx", &data[..data.len() / 2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Container);
    Ok(())
}

#[test]
fn test_strict_directory_accepts_well_formed_package() -> anyhow::Result<()> {
    let data = create_mock_xlsx(
        &[(DEFAULT_WORKSHEET_PATH, worksheet(&scenario_rows()))],
        zip::CompressionMethod::Deflated,
    )?;
    let config = DecodeConfig::from_toml_str("[container]\nstrict_directory = true\n")?;
    let reader = GridReader::with_config(config)?;
    assert_eq!(reader.read("a.xlsx", &data)?, expected());
    Ok(())
}

#[test]
fn test_legacy_html_xls() -> anyhow::Result<()> {
    let html = b"<html><body><table><tr><td>A</td><td>B</td></tr></table></body></html>";
    assert_eq!(read_grid("extracto.xls", html)?, vec![vec!["A", "B"]]);
    Ok(())
}

#[test]
fn test_legacy_binary_xls_rejected() {
    // BIFF8 compound file signature followed by padding
    let mut data = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    data.extend(std::iter::repeat_n(0u8, 512));
    let err = read_grid("extracto.xls", &data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Legacy);
}

#[test]
fn test_unknown_extension() {
    let err = read_grid("movimientos.csv", b"Fecha;Importe").unwrap_err();
    assert!(matches!(err, GridError::UnsupportedExtension(_)));
}

#[test]
fn test_read_path() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;

    let xlsx_path = dir.path().join("Movimientos.XLSX");
    fs::write(
        &xlsx_path,
        create_mock_xlsx(
            &[(DEFAULT_WORKSHEET_PATH, worksheet(&scenario_rows()))],
            zip::CompressionMethod::Stored,
        )?,
    )?;

    let xls_path = dir.path().join("extracto.xls");
    fs::write(
        &xls_path,
        "<table><tr><th>Fecha</th><th>Importe</th></tr><tr><td>2025-01-01</td><td>100,00</td></tr></table>",
    )?;

    let reader = GridReader::new();
    assert_eq!(reader.read_path(&xlsx_path)?, expected());
    assert_eq!(reader.read_path(&xls_path)?, expected());

    let err = reader.read_path(dir.path().join("missing.xlsx")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    Ok(())
}
