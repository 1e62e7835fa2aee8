use crate::internal::error::{Error, Result};
use crate::internal::tablerow;
use msi::{Package, Value};
use std::fs;
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use uuid::Uuid;

// ========================================================================= //

/// Opens an installer (`.msi`), patch (`.msp`) or transform package
/// read-only.
pub fn open_package<P: AsRef<Path>>(path: P) -> Result<Package<fs::File>> {
    let path = path.as_ref();
    fs::File::open(path)
        .and_then(Package::open)
        .map_err(|source| Error::OpenPackage { path: path.to_path_buf(), source })
}

// ========================================================================= //

/// Writes a table as comma-separated values: a header line of column names
/// followed by one line per row.
pub fn write_table_csv<F, W>(
    package: &mut Package<F>,
    table_name: &str,
    writer: &mut W,
) -> io::Result<()>
where
    F: Read + Seek,
    W: Write,
{
    if !package.has_table(table_name) {
        not_found!("Table {:?} does not exist in the package", table_name);
    }
    let rows = tablerow::read_rows(package, table_name)?;
    let columns: Vec<String> = match package.get_table(table_name) {
        Some(table) => {
            table.columns().iter().map(|col| col.name().to_string()).collect()
        }
        None => Vec::new(),
    };
    write_csv_line(writer, columns.iter().map(String::as_str))?;
    for row in rows.iter() {
        let cells: Vec<String> = row.values().iter().map(csv_cell).collect();
        write_csv_line(writer, cells.iter().map(String::as_str))?;
    }
    writer.flush()
}

/// Stands in for the contents of a stream column.
const BINARY_CELL: &str = "[Binary Data]";

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Int(number) => number.to_string(),
        Value::Str(string) => string.clone(),
        Value::Binary => BINARY_CELL.to_string(),
    }
}

fn write_csv_line<'a, W, I>(writer: &mut W, cells: I) -> io::Result<()>
where
    W: Write,
    I: Iterator<Item = &'a str>,
{
    for (index, cell) in cells.enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        if cell.contains(&[',', '"', '\n', '\r'][..]) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            writer.write_all(cell.as_bytes())?;
        }
    }
    writer.write_all(b"\n")
}

// ========================================================================= //

/// Returns the `ProductVersion` property, if the package defines one.
pub fn product_version<F: Read + Seek>(
    package: &mut Package<F>,
) -> io::Result<Option<String>> {
    let rows = tablerow::read_rows(package, "Property")?;
    Ok(rows
        .iter()
        .find(|row| {
            row.get_str("Property")
                .map_or(false, |name| name.eq_ignore_ascii_case("ProductVersion"))
        })
        .map(|row| row.get_string("Value")))
}

/// Returns the summary information properties that are set, as
/// `(label, value)` pairs in a fixed order.  The creation time is left to
/// the caller, which knows how it wants timestamps shown.
pub fn summary_properties<F: Read + Seek>(
    package: &Package<F>,
) -> Vec<(&'static str, String)> {
    let summary = package.summary_info();
    let mut properties = Vec::new();
    properties.push(("Package type", format!("{:?}", package.package_type())));
    let codepage = summary.codepage();
    properties
        .push(("Codepage", format!("{} ({})", codepage.name(), codepage.id())));
    let strings = [
        ("Title", summary.title()),
        ("Subject", summary.subject()),
        ("Author", summary.author()),
        ("Comments", summary.comments()),
        ("Architecture", summary.arch()),
        ("Creating application", summary.creating_application()),
    ];
    for (label, value) in strings {
        if let Some(value) = value {
            properties.push((label, value.to_string()));
        }
    }
    let languages = summary.languages();
    if !languages.is_empty() {
        let tags: Vec<&str> =
            languages.iter().map(|language| language.tag()).collect();
        properties.push(("Languages", tags.join(",")));
    }
    if let Some(uuid) = summary.uuid() {
        properties.push(("Package code", package_code(uuid)));
    }
    if let Some(word_count) = summary.word_count() {
        properties.push(("Word count", word_count.to_string()));
    }
    properties
}

/// Formats a package code the way the Windows Installer writes GUIDs.
fn package_code(uuid: Uuid) -> String {
    format!("{:X}", uuid.braced())
}

// ========================================================================= //


// ========================================================================= //
