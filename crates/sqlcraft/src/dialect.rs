//! SQL dialect implementations for MySQL, `SQLite` and Postgres.
//!
//! A dialect is pure configuration: it decides how identifiers and literals are
//! delimited and how an upsert clause is spelled. Everything else in the
//! statement builder is dialect-agnostic.
//!
//! # Example
//!
//! ```ignore
//! use sqlcraft::dialect;
//!
//! let d = dialect::from_descriptor("Server=db;Provider=MySql")?;
//! assert_eq!(d.name(), "mysql");
//! ```

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::sync::Arc;

/// SQL dialect trait for database-specific syntax.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short lowercase name (`mysql`, `sqlite`, `postgres`).
    fn name(&self) -> &'static str;

    /// Text placed between two commands of a batch.
    fn separator(&self) -> &'static str {
        ";\n"
    }

    /// Opening and closing identifier delimiters.
    fn ident_quotes(&self) -> (char, char);

    /// Wrap `ident` in the identifier delimiters.
    ///
    /// The identifier is written as-is; delimiters are assumed never to
    /// appear inside identifiers.
    fn write_ident(&self, out: &mut String, ident: &str) {
        let (open, close) = self.ident_quotes();
        out.push(open);
        out.push_str(ident);
        out.push(close);
    }

    /// Write a string literal, doubling the quote character.
    fn write_string(&self, out: &mut String, s: &str) {
        out.reserve(s.len() + 2);
        out.push('\'');
        for ch in s.chars() {
            if ch == '\'' {
                out.push('\'');
            }
            out.push(ch);
        }
        out.push('\'');
    }

    /// Whether `\` escapes the next character inside string literals.
    fn backslash_escapes(&self) -> bool {
        false
    }

    /// Write a binary literal (`x'<hex>'` unless overridden).
    fn write_binary(&self, out: &mut String, bytes: &[u8]) {
        out.push_str("x'");
        out.push_str(&hex::encode(bytes));
        out.push('\'');
    }

    /// Format a boolean literal.
    fn bool_lit(&self, val: bool) -> &'static str {
        if val { "1" } else { "0" }
    }

    /// Expression yielding the identity generated by the last insert.
    fn last_insert_id(&self) -> &'static str;

    /// Keyword sequence opening an insert that skips conflicting rows.
    ///
    /// `None` means the dialect has no such form.
    fn insert_ignore(&self) -> Option<&'static str>;

    /// Append the upsert clause for an insert whose conflict target is `keys`
    /// and whose `updates` columns take the incoming values.
    fn write_upsert(&self, out: &mut String, keys: &[String], updates: &[String]);
}

/// Render an `ON CONFLICT(...) DO UPDATE SET c=EXCLUDED.c` clause.
fn write_on_conflict<D: Dialect + ?Sized>(
    dialect: &D,
    out: &mut String,
    keys: &[String],
    updates: &[String],
) {
    out.push_str(" ON CONFLICT(");
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        dialect.write_ident(out, key);
    }
    out.push(')');
    if updates.is_empty() {
        out.push_str(" DO NOTHING");
        return;
    }
    out.push_str(" DO UPDATE SET ");
    for (i, col) in updates.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        dialect.write_ident(out, col);
        out.push_str("=EXCLUDED.");
        dialect.write_ident(out, col);
    }
}

/// MySQL / MariaDB dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn ident_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn backslash_escapes(&self) -> bool {
        true
    }

    fn write_string(&self, out: &mut String, s: &str) {
        // Backslash is an escape character unless NO_BACKSLASH_ESCAPES is set.
        out.reserve(s.len() + 2);
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                _ => out.push(ch),
            }
        }
        out.push('\'');
    }

    fn last_insert_id(&self) -> &'static str {
        "LAST_INSERT_ID()"
    }

    fn insert_ignore(&self) -> Option<&'static str> {
        Some("INSERT IGNORE INTO ")
    }

    fn write_upsert(&self, out: &mut String, keys: &[String], updates: &[String]) {
        out.push_str(" ON DUPLICATE KEY UPDATE ");
        if updates.is_empty() {
            if let Some(key) = keys.first() {
                self.write_ident(out, key);
                out.push('=');
                self.write_ident(out, key);
            }
            return;
        }
        for (i, col) in updates.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.write_ident(out, col);
            out.push_str("=VALUES(");
            self.write_ident(out, col);
            out.push(')');
        }
    }
}

/// `SQLite` dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn ident_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn last_insert_id(&self) -> &'static str {
        "last_insert_rowid()"
    }

    fn insert_ignore(&self) -> Option<&'static str> {
        Some("INSERT OR IGNORE INTO ")
    }

    fn write_upsert(&self, out: &mut String, keys: &[String], updates: &[String]) {
        write_on_conflict(self, out, keys, updates);
    }
}

/// Postgres dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn ident_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    fn write_binary(&self, out: &mut String, bytes: &[u8]) {
        out.push_str("'\\x");
        out.push_str(&hex::encode(bytes));
        out.push_str("'::bytea");
    }

    fn bool_lit(&self, val: bool) -> &'static str {
        if val { "TRUE" } else { "FALSE" }
    }

    fn last_insert_id(&self) -> &'static str {
        "lastval()"
    }

    fn insert_ignore(&self) -> Option<&'static str> {
        None
    }

    fn write_upsert(&self, out: &mut String, keys: &[String], updates: &[String]) {
        write_on_conflict(self, out, keys, updates);
    }
}

/// Select a dialect from a free-form data-source descriptor.
///
/// The descriptor (a provider name, a connection URL, ...) is matched
/// case-insensitively by substring against the known dialect names.
pub fn from_descriptor(descriptor: &str) -> OrmResult<Arc<dyn Dialect>> {
    let lower = descriptor.to_ascii_lowercase();
    if lower.contains("mysql") || lower.contains("mariadb") {
        Ok(Arc::new(MySql))
    } else if lower.contains("sqlite") {
        Ok(Arc::new(Sqlite))
    } else if lower.contains("postgres") || lower.contains("pgsql") {
        Ok(Arc::new(Postgres))
    } else {
        Err(OrmError::UnsupportedDialect(descriptor.to_string()))
    }
}
