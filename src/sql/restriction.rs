//! WHERE-clause predicates
//!
//! A restriction is compiled once into a postfix token stream and applied
//! per row. Compilation is a shunting pass that treats `and` and `or` at the
//! same precedence level (so connectives group right-to-left); parentheses
//! are honored. Evaluation consumes comparison triples `<lhs> <op> <rhs>`
//! and Boolean connectives off the postfix stream.

use crate::error::{Error, Result};
use crate::strings;
use crate::types::column::{parse_date, parse_float, parse_int, parse_time};
use crate::types::{ColumnType, Row, NULL_SENTINEL};
use regex::Regex;

/// A compiled predicate over a row. The empty restriction accepts all rows.
#[derive(Debug, Clone, Default)]
pub struct Restriction {
    postfix: Vec<String>,
}

impl Restriction {
    /// Compiles a WHERE-clause body whose tokens are space-separated (the
    /// form the parser's normalization produces).
    pub fn new(restriction: &str) -> Result<Restriction> {
        if restriction.is_empty() {
            return Ok(Restriction::default());
        }
        let mut operators: Vec<String> = Vec::new();
        let mut postfix = Vec::new();
        for part in strings::split(restriction, ' ', true) {
            let lowered = part.to_lowercase();
            if lowered == "and" || lowered == "or" || part == "(" {
                operators.push(if part == "(" { part } else { lowered });
            } else if part == ")" {
                loop {
                    let op = operators.pop().ok_or_else(|| {
                        Error::invalid("Unbalanced parentheses or quotes")
                    })?;
                    if op == "(" {
                        break;
                    }
                    postfix.push(op);
                }
            } else {
                postfix.push(part);
            }
        }
        while let Some(op) = operators.pop() {
            postfix.push(op);
        }
        Ok(Restriction { postfix })
    }

    pub fn is_empty(&self) -> bool {
        self.postfix.is_empty()
    }

    /// Evaluates the predicate against one row.
    pub fn apply(&self, row: &Row) -> Result<bool> {
        if self.postfix.is_empty() {
            return Ok(true);
        }
        let parts = &self.postfix;
        let mut results: Vec<bool> = Vec::new();
        let mut index = 0;
        while index < parts.len() {
            if parts[index] != "and" && parts[index] != "or" {
                let (op, rhs) = match (parts.get(index + 1), parts.get(index + 2)) {
                    (Some(op), Some(rhs)) => (op, rhs),
                    _ => return Err(Error::invalid("Malformed query")),
                };
                results.push(evaluate_comparison(&parts[index], op, rhs, row)?);
                index += 3;
            }
            if index < parts.len() && (parts[index] == "and" || parts[index] == "or") {
                let first = results.pop();
                let second = results.pop();
                match (first, second) {
                    (Some(a), Some(b)) => {
                        results.push(if parts[index] == "and" { a && b } else { a || b });
                    }
                    _ => return Err(Error::invalid("Malformed query")),
                }
                index += 1;
            }
        }
        results
            .pop()
            .ok_or_else(|| Error::invalid("Malformed query"))
    }
}

/// Resolves one operand token against the row: the `null` literal becomes
/// the NULL sentinel, a column name becomes its cell value, a quoted
/// literal becomes the unquoted string, and anything else must be numeric.
fn column_value(token: &str, row: &Row) -> Result<String> {
    if token.to_lowercase() == "null" {
        return Ok(NULL_SENTINEL.to_string());
    }
    if let Ok(col) = row.get_column(token) {
        return Ok(col.raw_value().to_string());
    }
    if !matches!(token.chars().next(), Some('"') | Some('\''))
        && !strings::looks_numeric(token)
    {
        return Err(Error::invalid(format!(
            "Invalid value/column name: {}",
            token
        )));
    }
    Ok(strings::extract_quoted(token).to_string())
}

/// Evaluates one comparison triple `first op second`.
fn evaluate_comparison(first: &str, op: &str, second: &str, row: &Row) -> Result<bool> {
    let first_value = column_value(first, row)?;
    let second_value = column_value(second, row)?;

    // A side resolves to a column handle only when its value came out of the
    // row and is not NULL; the handle supplies the declared type.
    let col1 = if first_value != first && first_value != NULL_SENTINEL {
        row.get_column(first).ok()
    } else {
        None
    };
    let col2 = if second_value != second && second_value != NULL_SENTINEL {
        row.get_column(second).ok()
    } else {
        None
    };

    let column_type = match (col1, col2) {
        (Some(c1), Some(c2)) => {
            let t1 = &c1.metadata().column_type;
            let t2 = &c2.metadata().column_type;
            if !t1.compatible_with(t2) {
                return Err(Error::invalid(format!(
                    "{} and {} do not have the same types",
                    first, second
                )));
            }
            Some(t1.clone())
        }
        (Some(col), None) | (None, Some(col)) => Some(col.metadata().column_type.clone()),
        (None, None) => None,
    };

    // NULL sentinels and the blank cells produced by outer-join padding are
    // never parsed; they fall through to the string branch.
    let plain = |v: &str| !v.is_empty() && v != NULL_SENTINEL;
    let both_plain = plain(&first_value) && plain(&second_value);

    match column_type {
        Some(ColumnType::Int) | Some(ColumnType::BigInt) if both_plain => {
            compare_values(&parse_int(&first_value)?, op, &parse_int(&second_value)?)
        }
        Some(ColumnType::Float) | Some(ColumnType::Double) if both_plain => compare_values(
            &parse_float(&first_value)?,
            op,
            &parse_float(&second_value)?,
        ),
        Some(ColumnType::Date) if both_plain => {
            compare_values(&parse_date(&first_value)?, op, &parse_date(&second_value)?)
        }
        Some(ColumnType::Time) if both_plain => {
            compare_values(&parse_time(&first_value)?, op, &parse_time(&second_value)?)
        }
        _ => {
            let lhs = strings::extract_quoted(&first_value);
            let rhs = strings::extract_quoted(&second_value);
            if op.to_lowercase() == "like" {
                compare_like(lhs, rhs)
            } else {
                compare_values(&lhs, op, &rhs)
            }
        }
    }
}

/// Applies a comparison operator to two values of the same type.
fn compare_values<T: PartialOrd + PartialEq + ?Sized>(
    val1: &T,
    op: &str,
    val2: &T,
) -> Result<bool> {
    match op {
        "=" => Ok(val1 == val2),
        "<" => Ok(val1 < val2),
        "<=" => Ok(val1 <= val2),
        ">" => Ok(val1 > val2),
        ">=" => Ok(val1 >= val2),
        "!=" => Ok(val1 != val2),
        _ => Err(Error::invalid(format!("Invalid operator: {}", op))),
    }
}

/// `val1 LIKE val2`: the pattern's `%` matches any run, `_` any single
/// character; the whole value must match.
fn compare_like(val1: &str, val2: &str) -> Result<bool> {
    let regex = Regex::new(&strings::like_to_regex(val2))
        .map_err(|e| Error::invalid(format!("Invalid LIKE pattern: {}", e)))?;
    Ok(regex.is_match(val1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnMetadata, Schema};

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnMetadata::new("id", "t", ColumnType::Int, None, true, false),
            ColumnMetadata::new("name", "t", ColumnType::Varchar(10), None, false, false),
            ColumnMetadata::new("score", "t", ColumnType::Double, None, false, false),
            ColumnMetadata::new("born", "t", ColumnType::Date, None, false, false),
        ])
    }

    fn row(id: &str, name: &str, score: &str, born: &str) -> Row {
        let line = format!(
            "{} {} {} {}",
            strings::quote(id),
            strings::quote(name),
            strings::quote(score),
            strings::quote(born)
        );
        Row::from_line(schema(), &line).unwrap()
    }

    fn sample() -> Row {
        row("10", "abc", "2.5", "2019-04-05")
    }

    #[test]
    fn test_empty_restriction_accepts_everything() {
        let restriction = Restriction::new("").unwrap();
        assert!(restriction.is_empty());
        assert!(restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_integer_comparisons() {
        for (expr, expected) in [
            ("id = 10", true),
            ("id != 10", false),
            ("id < 11", true),
            ("id <= 10", true),
            ("id > 9", true),
            ("id >= 11", false),
            ("9 < id", true),
        ] {
            let restriction = Restriction::new(expr).unwrap();
            assert_eq!(restriction.apply(&sample()).unwrap(), expected, "{}", expr);
        }
    }

    #[test]
    fn test_integer_compares_by_magnitude_not_text() {
        let restriction = Restriction::new("id < 9").unwrap();
        assert!(!restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_string_comparisons() {
        let restriction = Restriction::new("name = \"abc\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction = Restriction::new("name < \"abd\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction = Restriction::new("name = \"xyz\"").unwrap();
        assert!(!restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_float_and_date_comparisons() {
        let restriction = Restriction::new("score > 2.4").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction = Restriction::new("born < \"2020-01-01\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction = Restriction::new("born = \"2019-04-05\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_like() {
        for (expr, expected) in [
            ("name like \"a%\"", true),
            ("name like \"%c\"", true),
            ("name like \"a_c\"", true),
            ("name like \"b%\"", false),
            ("name like \"abc\"", true),
        ] {
            let restriction = Restriction::new(expr).unwrap();
            assert_eq!(restriction.apply(&sample()).unwrap(), expected, "{}", expr);
        }
    }

    #[test]
    fn test_null_comparison() {
        let with_null = row("\u{0}", "abc", "2.5", "2019-04-05");
        let restriction = Restriction::new("id = null").unwrap();
        assert!(restriction.apply(&with_null).unwrap());
        assert!(!restriction.apply(&sample()).unwrap());
        let restriction = Restriction::new("name != null").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_connectives_and_parens() {
        let restriction = Restriction::new("id = 10 and name = \"abc\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction = Restriction::new("id = 99 or name = \"abc\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction =
            Restriction::new("( id = 99 or id = 10 ) and name = \"abc\"").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
        let restriction =
            Restriction::new("( id = 99 or id = 98 ) and name = \"abc\"").unwrap();
        assert!(!restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_flat_precedence_groups_right_to_left() {
        // id = 10 (true) and name = "x" (false) or score > 2 (true):
        // with flat precedence this is true and (false or true) = true,
        // where C-style precedence would give (true and false) or true too;
        // distinguish with a leading false instead.
        let restriction =
            Restriction::new("id = 99 and name = \"x\" or score > 2").unwrap();
        // (name = "x" or score > 2) is true, id = 99 is false -> false,
        // while C-style ((id = 99 and name = "x") or score > 2) would be true.
        assert!(!restriction.apply(&sample()).unwrap());
    }

    #[test]
    fn test_restriction_is_idempotent() {
        let restriction = Restriction::new("id >= 10 and score < 3").unwrap();
        let first = restriction.apply(&sample()).unwrap();
        let second = restriction.apply(&sample()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_operator() {
        let restriction = Restriction::new("id ~ 10").unwrap();
        assert!(restriction.apply(&sample()).is_err());
    }

    #[test]
    fn test_incompatible_types() {
        let restriction = Restriction::new("id = score").unwrap();
        assert!(restriction.apply(&sample()).is_err());
    }

    #[test]
    fn test_unknown_operand() {
        let restriction = Restriction::new("bogus = 10").unwrap();
        assert!(restriction.apply(&sample()).is_err());
    }

    #[test]
    fn test_char_types_of_different_sizes_compare() {
        // name is varchar(10); a char(3) column would still be comparable,
        // and a plain literal comparison works through the same branch.
        let restriction = Restriction::new("name = name").unwrap();
        assert!(restriction.apply(&sample()).unwrap());
    }
}
