//! Identifier quoting, literal rendering and safe interpolation.
//!
//! All functions here are stateless and write into a caller-owned buffer.
//!
//! - [`quote_ident`] wraps a raw identifier in the dialect's delimiters.
//! - [`quote_expr`] quotes every identifier inside a free-form expression,
//!   leaving function names (`COUNT(`), numbers and string literals alone.
//! - [`write_literal`] renders a [`Value`] as a dialect literal.
//! - [`interpolate`] splices rendered literals into a `{0}`, `{1}` template.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::statement::State;
use crate::value::Value;
use std::fmt::Write;

/// Wrap a raw identifier in the dialect's delimiters.
pub fn quote_ident(out: &mut String, dialect: &dyn Dialect, ident: &str) {
    dialect.write_ident(out, ident);
}

/// Quote the identifiers found in a free-form expression.
///
/// A maximal run of letters, digits and `_` that starts with a letter or `_`
/// is an identifier; it is quoted unless immediately followed by `(`, in
/// which case it is a function name. Runs starting with a digit are numbers.
/// Single-quoted strings and already-delimited identifiers are copied
/// unchanged, as is every other character.
pub fn quote_expr(out: &mut String, dialect: &dyn Dialect, expr: &str) {
    let (open, close) = dialect.ident_quotes();
    out.reserve(expr.len() + 8);

    let mut chars = expr.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        if ch == '\'' || ch == open {
            let end_ch = if ch == '\'' { '\'' } else { close };
            let escapes = ch == '\'' && dialect.backslash_escapes();
            out.push(ch);
            while let Some((_, c)) = chars.next() {
                out.push(c);
                if escapes && c == '\\' {
                    if let Some((_, escaped)) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == end_ch {
                    break;
                }
            }
            continue;
        }

        if !is_word(ch) {
            out.push(ch);
            continue;
        }

        let mut end = start + ch.len_utf8();
        while let Some(&(i, c)) = chars.peek() {
            if !is_word(c) {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let word = &expr[start..end];

        let is_number = ch.is_ascii_digit();
        let is_call = matches!(chars.peek(), Some(&(_, '(')));
        if is_number || is_call {
            out.push_str(word);
        } else {
            dialect.write_ident(out, word);
        }
    }
}

fn is_word(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Render `value` as a SQL literal.
pub fn write_literal(out: &mut String, dialect: &dyn Dialect, value: &Value) -> OrmResult<()> {
    match value {
        Value::Null => out.push_str("NULL"),
        Value::Bool(b) => out.push_str(dialect.bool_lit(*b)),
        Value::Int(n) => {
            let _ = write!(out, "{n}");
        }
        Value::UInt(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(OrmError::unrenderable(format!(
                    "non-finite float {f} has no SQL literal"
                )));
            }
            let _ = write!(out, "{f}");
        }
        #[cfg(feature = "rust_decimal")]
        Value::Decimal(d) => {
            let _ = write!(out, "{d}");
        }
        Value::Text(s) => dialect.write_string(out, s),
        Value::Bytes(b) => dialect.write_binary(out, b),
        Value::DateTime(dt) => {
            dialect.write_string(out, &dt.format("%Y-%m-%d %H:%M:%S").to_string());
        }
        Value::Date(d) => dialect.write_string(out, &d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => dialect.write_string(out, &t.format("%H:%M:%S").to_string()),
        Value::Table(name) => dialect.write_ident(out, name),
    }
    Ok(())
}

/// Render a comma-separated list of literals.
pub fn write_literal_list(
    out: &mut String,
    dialect: &dyn Dialect,
    values: &[Value],
) -> OrmResult<()> {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_literal(out, dialect, v)?;
    }
    Ok(())
}

/// Splice `args` into `template`, rendering each one as a literal.
///
/// Placeholders are `{0}`, `{1}`, ... and may repeat; `{{` and `}}` produce
/// literal braces. The template text itself is copied verbatim, so only
/// trusted text belongs there. A placeholder that does not parse or points
/// past the end of `args` is rejected.
pub fn interpolate(
    out: &mut String,
    dialect: &dyn Dialect,
    template: &str,
    args: &[Value],
) -> OrmResult<()> {
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut index: Option<usize> = None;
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    let digit = c.to_digit(10).ok_or_else(bad_placeholder)? as usize;
                    let next = index
                        .unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(digit))
                        .ok_or_else(bad_placeholder)?;
                    index = Some(next);
                }
                let arg = match (closed, index) {
                    (true, Some(i)) => args.get(i).ok_or_else(bad_placeholder)?,
                    _ => return Err(bad_placeholder()),
                };
                write_literal(out, dialect, arg)?;
            }
            '}' => return Err(bad_placeholder()),
            _ => out.push(ch),
        }
    }
    Ok(())
}

fn bad_placeholder() -> OrmError {
    OrmError::protocol("interpolate", State::Start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySql, Postgres, Sqlite};
    use chrono::NaiveDate;

    fn expr(d: &dyn Dialect, s: &str) -> String {
        let mut out = String::new();
        quote_expr(&mut out, d, s);
        out
    }

    fn lit(d: &dyn Dialect, v: Value) -> OrmResult<String> {
        let mut out = String::new();
        write_literal(&mut out, d, &v)?;
        Ok(out)
    }

    fn unquote(s: &str) -> String {
        let inner = &s[1..s.len() - 1];
        inner.replace("''", "'")
    }

    #[test]
    fn ident_roundtrips_through_delimiters() {
        for ident in ["users", "user_id", "Order2"] {
            let mut out = String::new();
            quote_ident(&mut out, &MySql, ident);
            assert_eq!(out.trim_matches('`'), ident);
        }
    }

    #[test]
    fn expr_quotes_bare_identifiers() {
        assert_eq!(expr(&MySql, "a+b"), "`a`+`b`");
        assert_eq!(expr(&Sqlite, "t.user_id"), "\"t\".\"user_id\"");
        assert_eq!(expr(&MySql, "t.*"), "`t`.*");
    }

    #[test]
    fn expr_leaves_function_names_unquoted() {
        assert_eq!(expr(&MySql, "COUNT(id)"), "COUNT(`id`)");
        assert_eq!(expr(&MySql, "MAX(a)-MIN(b)"), "MAX(`a`)-MIN(`b`)");
        // a space breaks the call heuristic
        assert_eq!(expr(&MySql, "COUNT (id)"), "`COUNT` (`id`)");
    }

    #[test]
    fn expr_skips_numbers_and_strings() {
        assert_eq!(expr(&MySql, "price*1.5e3"), "`price`*1.5e3");
        assert_eq!(expr(&MySql, "CONCAT(name,'a b')"), "CONCAT(`name`,'a b')");
        assert_eq!(expr(&MySql, "`done`+x"), "`done`+`x`");
    }

    #[test]
    fn expr_honours_backslash_escapes_in_mysql_strings() {
        assert_eq!(
            expr(&MySql, r"CONCAT(a,'it\'s x')"),
            r"CONCAT(`a`,'it\'s x')"
        );
        assert_eq!(expr(&MySql, r"CONCAT(a,'c:\\',b)"), r"CONCAT(`a`,'c:\\',`b`)");
        // backslash is an ordinary character elsewhere
        assert_eq!(expr(&Sqlite, r"a||'x\'||b"), r#""a"||'x\'||"b""#);
    }

    #[test]
    fn literal_scalars() {
        assert_eq!(lit(&MySql, Value::Null).unwrap(), "NULL");
        assert_eq!(lit(&MySql, Value::Bool(true)).unwrap(), "1");
        assert_eq!(lit(&Postgres, Value::Bool(false)).unwrap(), "FALSE");
        assert_eq!(lit(&MySql, Value::Int(-42)).unwrap(), "-42");
        assert_eq!(lit(&MySql, Value::Float(0.25)).unwrap(), "0.25");
        assert_eq!(lit(&MySql, Value::UInt(7)).unwrap(), "7");
    }

    #[test]
    fn literal_non_finite_float_is_unrenderable() {
        let err = lit(&MySql, Value::Float(f64::NAN)).unwrap_err();
        assert!(matches!(err, OrmError::UnrenderableValue(_)));
    }

    #[test]
    fn literal_temporal() {
        let dt = NaiveDate::from_ymd_opt(2023, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 58, 999)
            .unwrap();
        assert_eq!(
            lit(&Sqlite, Value::DateTime(dt)).unwrap(),
            "'2023-12-31 23:59:58'"
        );
        assert_eq!(lit(&Sqlite, Value::Date(dt.date())).unwrap(), "'2023-12-31'");
    }

    #[test]
    fn literal_table_reference_is_quoted_name() {
        assert_eq!(lit(&MySql, Value::Table("users".into())).unwrap(), "`users`");
    }

    #[test]
    fn text_literal_roundtrips() {
        for s in ["plain", "it's", "''", "a'b'c", "ünïcode'"] {
            let out = lit(&Sqlite, Value::Text(s.to_string())).unwrap();
            assert!(out.starts_with('\'') && out.ends_with('\''));
            assert_eq!(unquote(&out), s);
            // every inner quote is doubled
            let inner = &out[1..out.len() - 1];
            assert_eq!(inner.matches('\'').count() % 2, 0);
        }
    }

    #[test]
    fn interpolate_escapes_every_argument() {
        let mut out = String::new();
        interpolate(
            &mut out,
            &MySql,
            "name = {0} OR id IN ({1},{1})",
            &[Value::Text("x' OR '1'='1".into()), Value::Int(3)],
        )
        .unwrap();
        assert_eq!(out, "name = 'x'' OR ''1''=''1' OR id IN (3,3)");
    }

    #[test]
    fn interpolate_without_arguments() {
        let mut out = String::new();
        interpolate(&mut out, &MySql, "a = {{b}}", &[]).unwrap();
        assert_eq!(out, "a = {b}");
    }

    #[test]
    fn interpolate_rejects_bad_placeholders() {
        let mut out = String::new();
        assert!(interpolate(&mut out, &MySql, "{1}", &[Value::Null]).is_err());
        assert!(interpolate(&mut out, &MySql, "{x}", &[Value::Null]).is_err());
        assert!(interpolate(&mut out, &MySql, "{0", &[Value::Null]).is_err());
        assert!(interpolate(&mut out, &MySql, "{}", &[Value::Null]).is_err());
    }

    #[test]
    fn interpolate_rejects_oversized_index() {
        let mut out = String::new();
        let err = interpolate(&mut out, &MySql, "{99999999999999999999999}", &[Value::Null]);
        assert!(err.unwrap_err().is_protocol_violation());
        assert!(out.is_empty());
    }
}
