//! SQL text dump and restore for SQLite
//!
//! A dump is a plain SQL script: every user table's `CREATE` statement
//! followed by its rows, then `sqlite_sequence` counters, then indexes,
//! triggers and views in creation order. Triggers come after the data so
//! replaying rows never fires them.
//!
//! Rows are written with an explicit column list that leaves out generated
//! and hidden columns. Shadow tables belong to their virtual table: they are
//! recreated by its `CREATE VIRTUAL TABLE` and filled through it, so they are
//! neither dumped nor dropped on their own.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Result};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Internal objects are named `sqlite_*`; `_` must not act as a wildcard
const USER_OBJECTS: &str = "name NOT LIKE 'sqlite\\_%' ESCAPE '\\'";

/// Serialize the full schema and data of `conn`'s main database
pub fn dump_sql(conn: &Connection) -> Result<String> {
    let objects = schema_objects(conn)?;
    let mut out = String::new();

    let user_version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if user_version != 0 {
        let _ = writeln!(out, "PRAGMA user_version = {};", user_version);
    }

    for object in objects.iter().filter(|o| o.kind == "table") {
        let _ = writeln!(out, "{};", object.sql);
        dump_rows(conn, &object.name, &mut out)?;
    }

    if has_sqlite_sequence(conn)? {
        out.push_str("DELETE FROM sqlite_sequence;\n");
        dump_rows(conn, "sqlite_sequence", &mut out)?;
    }

    for object in objects.iter().filter(|o| o.kind != "table") {
        let _ = writeln!(out, "{};", object.sql);
    }

    Ok(out)
}

/// Replace everything in `conn` with the contents of `script`
///
/// Runs in one transaction: on failure the previous state is kept. Foreign
/// key enforcement is suspended for the load and then put back.
pub fn load_sql(conn: &mut Connection, script: &str) -> Result<()> {
    without_foreign_keys(conn, |conn| reset_and_load(conn, script))
}

/// Run `f` with foreign key enforcement off, then restore the previous setting
///
/// The pragma is a no-op inside a transaction, so `f` must open its own.
pub fn without_foreign_keys<T>(
    conn: &mut Connection,
    f: impl FnOnce(&mut Connection) -> Result<T>,
) -> Result<T> {
    let foreign_keys: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))?;
    conn.execute_batch("PRAGMA foreign_keys = OFF")?;

    let result = f(conn);

    conn.execute_batch(&format!("PRAGMA foreign_keys = {}", foreign_keys))?;
    result
}

fn reset_and_load(conn: &mut Connection, script: &str) -> Result<()> {
    let tx = conn.transaction()?;
    drop_all_objects(&tx)?;
    tx.execute_batch("PRAGMA user_version = 0")?;
    tx.execute_batch(script)?;
    tx.commit()
}

/// Drop every user view, trigger and table (indexes go with their tables)
pub fn drop_all_objects(conn: &Connection) -> Result<()> {
    let shadows = shadow_tables(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT type, name FROM sqlite_master
         WHERE type IN ('view', 'trigger', 'table') AND {}
         ORDER BY CASE type WHEN 'view' THEN 0 WHEN 'trigger' THEN 1 ELSE 2 END",
        USER_OBJECTS
    ))?;
    let objects = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|(_, name)| !shadows.contains(name))
        .collect::<Vec<_>>();
    drop(stmt);

    for (kind, name) in &objects {
        let keyword = match kind.as_str() {
            "view" => "VIEW",
            "trigger" => "TRIGGER",
            _ => "TABLE",
        };
        conn.execute_batch(&format!("DROP {} IF EXISTS {}", keyword, quote_ident(name)))?;
    }

    if has_sqlite_sequence(conn)? {
        conn.execute_batch("DELETE FROM sqlite_sequence")?;
    }

    tracing::debug!(dropped = objects.len(), "schema reset");
    Ok(())
}

struct SchemaObject {
    kind: String,
    name: String,
    sql: String,
}

fn schema_objects(conn: &Connection) -> Result<Vec<SchemaObject>> {
    let shadows = shadow_tables(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT type, name, sql, tbl_name FROM sqlite_master
         WHERE sql IS NOT NULL AND {}
         ORDER BY CASE type WHEN 'table' THEN 0 WHEN 'index' THEN 1 WHEN 'trigger' THEN 2 ELSE 3 END,
                  rowid",
        USER_OBJECTS
    ))?;
    let objects = stmt
        .query_map([], |row| {
            Ok((
                SchemaObject {
                    kind: row.get(0)?,
                    name: row.get(1)?,
                    sql: row.get(2)?,
                },
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>>>()?;
    Ok(objects
        .into_iter()
        .filter(|(_, table)| !shadows.contains(table))
        .map(|(object, _)| object)
        .collect())
}

/// Tables owned by a virtual table in the main schema
fn shadow_tables(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt =
        conn.prepare("SELECT name FROM pragma_table_list WHERE schema = 'main' AND type = 'shadow'")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>>>()?;
    Ok(names)
}

/// Columns that accept values on insert, in declaration order
fn insertable_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    // hidden: 1 virtual-table hidden column, 2/3 generated column
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_xinfo(?1) WHERE hidden = 0")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>>>()?;
    Ok(columns)
}

fn has_sqlite_sequence(conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'sqlite_sequence'",
        [],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n > 0)
}

fn dump_rows(conn: &Connection, table: &str, out: &mut String) -> Result<()> {
    let quoted = quote_ident(table);
    let columns = insertable_columns(conn, table)?;
    if columns.is_empty() {
        return Ok(());
    }
    let column_list = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(",");

    let mut stmt = conn.prepare(&format!("SELECT {} FROM {}", column_list, quoted))?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(sql_literal(row.get_ref(idx)?));
        }
        let _ = writeln!(
            out,
            "INSERT INTO {}({}) VALUES({});",
            quoted,
            column_list,
            values.join(",")
        );
    }
    Ok(())
}

fn sql_literal(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) if f.is_nan() => "NULL".to_string(),
        ValueRef::Real(f) if f.is_infinite() => {
            let literal = if f > 0.0 { "9e999" } else { "-9e999" };
            literal.to_string()
        }
        // {:?} is the shortest representation that parses back to the same f64
        ValueRef::Real(f) => format!("{:?}", f),
        ValueRef::Text(bytes) => format!("'{}'", String::from_utf8_lossy(bytes).replace('\'', "''")),
        ValueRef::Blob(bytes) => format!("X'{}'", hex::encode(bytes)),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn test_literals() {
        assert_eq!(sql_literal(ValueRef::Null), "NULL");
        assert_eq!(sql_literal(ValueRef::Integer(-7)), "-7");
        assert_eq!(sql_literal(ValueRef::Real(1.0)), "1.0");
        assert_eq!(sql_literal(ValueRef::Real(f64::INFINITY)), "9e999");
        assert_eq!(sql_literal(ValueRef::Text(b"it's")), "'it''s'");
        assert_eq!(sql_literal(ValueRef::Blob(&[0xde, 0xad])), "X'dead'");
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_dump_orders_tables_before_indexes_and_triggers() {
        let conn = db();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT);
             CREATE INDEX users_email ON users(email);
             CREATE TRIGGER users_ai AFTER INSERT ON users BEGIN SELECT 1; END;
             INSERT INTO users (email) VALUES ('a@example.com');",
        )
        .unwrap();

        let script = dump_sql(&conn).unwrap();

        let create = script.find("CREATE TABLE users").unwrap();
        let insert = script.find("INSERT INTO \"users\"(\"id\",\"email\")").unwrap();
        let index = script.find("CREATE INDEX users_email").unwrap();
        let trigger = script.find("CREATE TRIGGER users_ai").unwrap();
        assert!(create < insert && insert < index && index < trigger);
    }

    #[test]
    fn test_drop_all_objects_leaves_empty_schema() {
        let conn = db();
        conn.execute_batch(
            "CREATE TABLE a (id INTEGER PRIMARY KEY AUTOINCREMENT);
             CREATE VIEW v AS SELECT * FROM a;
             INSERT INTO a DEFAULT VALUES;",
        )
        .unwrap();

        drop_all_objects(&conn).unwrap();

        let remaining: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_shadow_tables_are_left_to_their_virtual_table() {
        let conn = db();
        conn.execute_batch(
            "CREATE VIRTUAL TABLE docs USING fts5(body);
             INSERT INTO docs (body) VALUES ('hello');",
        )
        .unwrap();

        let script = dump_sql(&conn).unwrap();

        assert!(script.contains("CREATE VIRTUAL TABLE docs USING fts5(body);"));
        assert!(script.contains("INSERT INTO \"docs\"(\"body\") VALUES('hello');"));
        assert!(!script.contains("docs_data"));
        assert!(!script.contains("docs_config"));
    }

    #[test]
    fn test_generated_columns_are_not_inserted() {
        let conn = db();
        conn.execute_batch(
            "CREATE TABLE t (a INTEGER, b INTEGER GENERATED ALWAYS AS (a * 2) VIRTUAL);
             INSERT INTO t (a) VALUES (4);",
        )
        .unwrap();

        let script = dump_sql(&conn).unwrap();

        assert!(script.contains("INSERT INTO \"t\"(\"a\") VALUES(4);"));
    }

    #[test]
    fn test_drop_all_objects_includes_sqlite_prefixed_user_tables() {
        let conn = db();
        conn.execute_batch("CREATE TABLE sqlitex (v); CREATE VIRTUAL TABLE docs USING fts5(body);")
            .unwrap();

        drop_all_objects(&conn).unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_failed_load_keeps_previous_state() {
        let mut conn = db();
        conn.execute_batch("CREATE TABLE keep (x); INSERT INTO keep VALUES (1);")
            .unwrap();

        assert!(load_sql(&mut conn, "CREATE TABLE broken (;").is_err());

        let kept: i64 = conn
            .query_row("SELECT x FROM keep", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kept, 1);
    }
}
