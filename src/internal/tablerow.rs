use log::info;
use msi::{Package, Select, Value};
use std::io::{self, Read, Seek};
use std::rc::Rc;

// ========================================================================= //

/// One row of an arbitrary database table, as an ordered mapping from column
/// name to value.
#[derive(Clone, Debug)]
pub struct TableRow {
    columns: Rc<[String]>,
    values: Vec<Value>,
}

impl TableRow {
    /// Builds a row from `(column name, value)` pairs, in column order.
    pub fn from_pairs<I, S>(pairs: I) -> TableRow
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(name, value)| (name.into(), value)).unzip();
        TableRow { columns: columns.into(), values }
    }

    /// Returns the number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the column names, in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the values, in table order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the value of the named column, if the row has such a column.
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|name| name == column_name)
            .map(|index| &self.values[index])
    }

    /// Returns the named column's value if it is a non-null string.
    pub fn get_str(&self, column_name: &str) -> Option<&str> {
        self.get(column_name).and_then(Value::as_str)
    }

    /// Returns the named column's value converted to a string.  Null values,
    /// stream values and missing columns become the empty string.
    pub fn get_string(&self, column_name: &str) -> String {
        match self.get(column_name) {
            Some(Value::Str(string)) => string.clone(),
            Some(Value::Int(number)) => number.to_string(),
            Some(Value::Null) | Some(Value::Binary) | None => String::new(),
        }
    }

    /// Returns the named column's value if it is an integer.
    pub fn get_int(&self, column_name: &str) -> Option<i32> {
        self.get(column_name).and_then(Value::as_int)
    }
}

// ========================================================================= //

/// Reads every row of the named table.  A table that doesn't exist in the
/// package reads as zero rows.
pub fn read_rows<F: Read + Seek>(
    package: &mut Package<F>,
    table_name: &str,
) -> io::Result<Vec<TableRow>> {
    if !package.has_table(table_name) {
        info!("Table {table_name:?} does not exist in the package");
        return Ok(Vec::new());
    }
    let rows = package.select_rows(Select::table(table_name))?;
    let columns: Rc<[String]> =
        rows.columns().iter().map(|column| column.name().to_string()).collect();
    let table_rows = rows
        .map(|row| {
            let values = (0..row.len()).map(|index| row[index].clone()).collect();
            TableRow { columns: columns.clone(), values }
        })
        .collect();
    Ok(table_rows)
}

// ========================================================================= //


// ========================================================================= //
