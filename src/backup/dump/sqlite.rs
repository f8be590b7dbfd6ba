use crate::backup::dump::DatabaseDumper;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::validate::{validate_file_exist, validate_file_name};
use bon::Builder;
use function_name::named;
use getset::Getters;
use itertools::Itertools;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, MAIN_DB};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, IntoInnerError, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use validator::Validate;

/// Writes a SQL text dump of a SQLite database file.
///
/// The database is opened read-only. The dump holds the schema and one
/// `INSERT` per row inside a single transaction, so it can be replayed with
/// `sqlite3 new.db < app.sql`.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, Builder, PartialEq, Eq, Getters)]
#[serde(deny_unknown_fields)]
#[getset(get = "pub")]
pub struct SqliteDumper {
    #[validate(custom(function = validate_file_name))]
    #[builder(into)]
    name: String,
    #[validate(custom(function = validate_file_exist))]
    #[builder(into)]
    path: PathBuf,
}

impl DatabaseDumper for SqliteDumper {
    fn database_name(&self) -> &str {
        &self.name
    }

    #[named]
    fn dump_to_file(&self, out: &Path) -> Result<()> {
        tracing::info!("Dumping sqlite database {:?} to {:?}", self.path, out);
        let (_snapshot_file, snapshot) = self.snapshot().add_fn_name(function_path!())?;

        let mut writer = BufWriter::new(File::create(out)?);
        write_dump(&snapshot, &mut writer).add_fn_name(function_path!())?;
        writer
            .into_inner()
            .map_err(IntoInnerError::into_error)?
            .sync_all()?;
        Ok(())
    }
}

impl SqliteDumper {
    /// Copies the database with the online backup API and opens the copy.
    ///
    /// The dump reads table by table, so it runs against this copy to see a
    /// single point in time. The copy is deleted when the returned file is
    /// dropped.
    fn snapshot(&self) -> Result<(NamedTempFile, Connection)> {
        let source = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(Error::from)
        .add_msg(format!("Opening {:?} failed", self.path))?;

        let snapshot_file = tempfile::Builder::new().prefix("sqlite-snapshot").tempfile()?;
        source
            .backup(MAIN_DB, snapshot_file.path(), None)
            .map_err(Error::from)
            .add_msg(format!("Snapshot of {:?} failed", self.path))?;
        tracing::debug!("Snapshot of {:?} taken at {:?}", self.path, snapshot_file.path());

        let snapshot = Connection::open_with_flags(
            snapshot_file.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok((snapshot_file, snapshot))
    }
}

fn write_dump<W: Write>(conn: &Connection, w: &mut W) -> Result<()> {
    writeln!(w, "PRAGMA foreign_keys=OFF;")?;
    writeln!(w, "BEGIN TRANSACTION;")?;

    let tables: Vec<(String, String)> = conn
        .prepare(
            "SELECT name, sql FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND sql IS NOT NULL \
             ORDER BY rowid",
        )?
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;

    for (name, sql) in &tables {
        writeln!(w, "{sql};")?;
        let row_count = write_rows(conn, name, w)?;
        tracing::debug!("Dumped table {name:?} with {row_count} rows");
    }

    let others: Vec<String> = conn
        .prepare(
            "SELECT sql FROM sqlite_master \
             WHERE type IN ('index', 'trigger', 'view') AND sql IS NOT NULL \
             ORDER BY rowid",
        )?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    for sql in &others {
        writeln!(w, "{sql};")?;
    }

    writeln!(w, "COMMIT;")?;
    Ok(())
}

fn write_rows<W: Write>(conn: &Connection, table: &str, w: &mut W) -> Result<usize> {
    let table = quote_identifier(table);
    let mut stmt = conn.prepare(&format!("SELECT * FROM {table}"))?;
    let column_count = stmt.column_count();
    let mut rows = stmt.query([])?;

    let mut count = 0;
    while let Some(row) = rows.next()? {
        let values = (0..column_count)
            .map(|i| row.get_ref(i).map(sql_literal))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        writeln!(w, "INSERT INTO {table} VALUES({});", values.join(","))?;
        count += 1;
    }
    Ok(count)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_literal(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) if f.is_nan() => "NULL".to_string(),
        ValueRef::Real(f) if f.is_infinite() => {
            (if f > 0.0 { "1e999" } else { "-1e999" }).to_string()
        }
        ValueRef::Real(f) => format!("{f:?}"),
        ValueRef::Text(t) => format!("'{}'", String::from_utf8_lossy(t).replace('\'', "''")),
        ValueRef::Blob(b) => format!("X'{}'", b.iter().map(|byte| format!("{byte:02X}")).join("")),
    }
}
