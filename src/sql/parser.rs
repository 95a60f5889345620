//! The query parser
//!
//! Parsing happens in two passes. A normalization pass rewrites the raw
//! input so that every meaningful token is separated by exactly one space:
//! runs of spaces outside quotes collapse to one, the punctuation characters
//! `( , ) ; =` get a single surrounding space, and the compound operators
//! `<=`, `>=`, `!=` (torn apart by the previous step) are fused back
//! together. The statement parsers then work on the space-split token list.
//!
//! The parser rejects input whose final non-whitespace character is not `;`,
//! and input with unbalanced parentheses or an odd number of unescaped
//! quotes of either kind.

use crate::error::{Error, Result};
use crate::strings;
use crate::types::{ColumnMetadata, ColumnType, Schema, NULL_SENTINEL};
use std::collections::HashSet;

/// A parsed statement, one variant per statement kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Create {
        table_name: String,
        schema: Schema,
    },
    Drop {
        table_name: String,
    },
    Insert {
        table_name: String,
        column_names: Vec<String>,
        column_values: Vec<String>,
    },
    Update {
        table_name: String,
        columns: Vec<String>,
        values: Vec<String>,
        restrictions: String,
    },
    Delete {
        table_name: String,
        restrictions: String,
    },
    Select {
        distinct: bool,
        /// Comma-joined projection list, `*`, or empty.
        column_names: String,
        table_names: Vec<String>,
        restrictions: String,
        /// The comparisons from the WHERE clause whose both sides look like
        /// column names; consumed by the join operator.
        join_conditions: String,
        /// Comma-joined ORDER BY column list, or empty.
        order_by: String,
        descending: bool,
    },
}

impl Query {
    /// Parses one semicolon-terminated statement.
    pub fn parse(input: &str) -> Result<Query> {
        let formatted = format_query(input);
        match formatted.find(';') {
            Some(pos) if pos == formatted.len() - 1 => {}
            _ => return Err(Error::invalid("Missing semicolon at end")),
        }
        if !is_balanced(&formatted) {
            return Err(Error::invalid("Unbalanced parentheses or quotes"));
        }
        let lowered = formatted.to_lowercase();
        if lowered.starts_with("create") {
            parse_create(&formatted)
        } else if lowered.starts_with("drop") {
            parse_drop(&formatted)
        } else if lowered.starts_with("insert") {
            parse_insert(&formatted)
        } else if lowered.starts_with("update") {
            parse_update(&formatted)
        } else if lowered.starts_with("delete") {
            parse_delete(&formatted)
        } else if lowered.starts_with("select") {
            parse_select(&formatted, &lowered)
        } else {
            Err(Error::invalid("Invalid query"))
        }
    }
}

/// Normalizes spacing as described in the module docs.
fn format_query(query: &str) -> String {
    const SEPARATED: &[char] = &['(', ',', ')', ';', '='];
    let mut out = String::with_capacity(query.len());
    let mut quote_char = '\0';
    let mut escaped = false;
    let mut quoted = false;
    let mut whitespace_found = false;
    for c in query.chars() {
        if c == '\\' {
            escaped = !escaped;
            out.push(c);
        } else {
            if c == ' ' && whitespace_found && !quoted {
                continue;
            }
            if (c == '"' || c == '\'') && !escaped && (quote_char == '\0' || quote_char == c) {
                quoted = !quoted;
                quote_char = if quoted { c } else { '\0' };
            }
            escaped = false;
            if !quoted && SEPARATED.contains(&c) {
                if !whitespace_found {
                    out.push(' ');
                }
                out.push(c);
                if c != ';' {
                    out.push(' ');
                }
            } else {
                out.push(c);
            }
        }
        whitespace_found = out.ends_with(' ');
    }
    out = out.replace("< =", "<=");
    out = out.replace("> =", ">=");
    out.replace("! =", "!=")
}

/// Checks parenthesis balance (outside double-quoted regions) and that both
/// quote characters appear an even number of times.
fn is_balanced(query: &str) -> bool {
    let mut depth = 0usize;
    let mut ignore = false;
    let mut escaped = false;
    for c in query.chars() {
        if c == '"' && !escaped {
            ignore = !ignore;
        }
        escaped = if c == '\\' { !escaped } else { false };
        if ignore {
            continue;
        }
        if c == '(' {
            depth += 1;
        } else if c == ')' {
            if depth == 0 {
                return false;
            }
            depth -= 1;
        }
    }
    depth == 0
        && strings::split(query, '"', true).len() % 2 == 1
        && strings::split(query, '\'', true).len() % 2 == 1
}

/// Bounds-checked token access; running off the end is a malformed query.
fn tok<'a>(parts: &'a [String], index: usize) -> Result<&'a str> {
    parts
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| Error::invalid("Malformed query"))
}

fn parse_create(formatted: &str) -> Result<Query> {
    let parts = strings::split(formatted, ' ', false);
    // Shortest form: CREATE TABLE name ( col type ) ;
    if parts.len() < 8 {
        return Err(Error::invalid("Malformed query"));
    }
    let table_name = parts[2].clone();
    if parts[1].to_lowercase() != "table"
        || parts[3] != "("
        || parts[parts.len() - 2] != ")"
    {
        return Err(Error::invalid("Malformed query"));
    }
    let mut metadata_vec: Vec<ColumnMetadata> = Vec::new();
    let mut index = 4;
    while index < parts.len() - 2 {
        if parts[index].to_lowercase() == "primary" {
            parse_primary_key(&parts, &mut metadata_vec, &mut index)?;
        } else {
            let metadata = create_column_metadata(&table_name, &parts, &mut index)?;
            metadata_vec.push(metadata);
        }
    }
    let mut schema = Schema::default();
    let mut names = HashSet::new();
    let mut primary_key_found = false;
    for metadata in metadata_vec {
        if metadata.primary_key {
            if primary_key_found {
                return Err(Error::invalid(
                    "Table cannot have more than one primary key",
                ));
            }
            primary_key_found = true;
        }
        if !names.insert(metadata.name.clone()) {
            return Err(Error::invalid("Column names must be unique"));
        }
        schema.add_column(metadata);
    }
    Ok(Query::Create { table_name, schema })
}

/// Parses one column definition: `name type [NOT NULL] [REFERENCES ( col )]`,
/// options in any order, ending at `,` or the closing `)`.
fn create_column_metadata(
    table_name: &str,
    parts: &[String],
    index: &mut usize,
) -> Result<ColumnMetadata> {
    let col_name = tok(parts, *index)?.to_string();
    *index += 1;
    let mut data_type = tok(parts, *index)?.to_lowercase();
    *index += 1;
    if tok(parts, *index)? == "(" {
        // Re-fuse a parenthesized size: char ( 10 ) -> char(10)
        data_type.push_str(tok(parts, *index)?);
        data_type.push_str(tok(parts, *index + 1)?);
        data_type.push_str(tok(parts, *index + 2)?);
        *index += 3;
    }
    let column_type = ColumnType::parse(&data_type)?;
    let mut references = None;
    let mut not_null = false;
    extract_column_options(parts, index, &col_name, &mut references, &mut not_null)?;
    *index += 1;
    Ok(ColumnMetadata::new(
        col_name,
        table_name,
        column_type,
        references,
        false,
        not_null,
    ))
}

fn extract_column_options(
    parts: &[String],
    index: &mut usize,
    col_name: &str,
    references: &mut Option<String>,
    not_null: &mut bool,
) -> Result<()> {
    while *index < parts.len() - 2 && parts[*index] != "," {
        let option = parts[*index].to_lowercase();
        if option == "not" {
            if tok(parts, *index + 1)?.to_lowercase() == "null" {
                *not_null = true;
                *index += 2;
            } else {
                return Err(Error::invalid(format!(
                    "Expected 'null' for column {}",
                    col_name
                )));
            }
        } else if option == "references" {
            if tok(parts, *index + 1)? == "(" && tok(parts, *index + 3)? == ")" {
                *references = Some(parts[*index + 2].clone());
                *index += 4;
            } else {
                return Err(Error::invalid(format!(
                    "Missing brackets for column {}",
                    col_name
                )));
            }
        } else {
            return Err(Error::invalid(format!(
                "Unexpected symbol {} for column {}",
                parts[*index], col_name
            )));
        }
    }
    Ok(())
}

/// A free-standing `PRIMARY KEY ( col )` clause elevates the named column's
/// primary-key and not-null flags.
fn parse_primary_key(
    parts: &[String],
    metadata_vec: &mut [ColumnMetadata],
    index: &mut usize,
) -> Result<()> {
    if tok(parts, *index + 1)?.to_lowercase() != "key" {
        return Err(Error::invalid("Expected 'key' after 'primary'"));
    }
    if tok(parts, *index + 2)? != "(" || tok(parts, *index + 4)? != ")" {
        return Err(Error::invalid(
            "Expected parentheses after primary key declaration",
        ));
    }
    for metadata in metadata_vec.iter_mut() {
        if metadata.name == parts[*index + 3] {
            metadata.primary_key = true;
            metadata.not_null = true;
        }
    }
    *index += if parts.get(*index + 5).map(String::as_str) == Some(",") {
        6
    } else {
        5
    };
    Ok(())
}

fn parse_drop(formatted: &str) -> Result<Query> {
    let parts = strings::split(formatted, ' ', false);
    // DROP TABLE name ;
    if parts.len() != 4 {
        return Err(Error::invalid("Malformed query"));
    }
    if parts[1].to_lowercase() != "table" {
        return Err(Error::invalid(format!(
            "Expected 'table' but got {}",
            parts[1]
        )));
    }
    Ok(Query::Drop {
        table_name: parts[2].clone(),
    })
}

fn parse_insert(formatted: &str) -> Result<Query> {
    let parts = strings::split(formatted, ' ', true);
    // Shortest form: INSERT INTO name ( col ) VALUES ( value ) ;
    if parts.len() < 11 {
        if parts.get(3).map(String::as_str) != Some("(") {
            return Err(Error::invalid("Expected column names after table name"));
        }
        return Err(Error::invalid("Malformed query"));
    }
    if parts[1].to_lowercase() != "into" {
        return Err(Error::invalid("Expected 'into' after insert keyword"));
    }
    let table_name = parts[2].clone();

    let mut index = 4;
    let mut names_joined = String::new();
    while tok(&parts, index)? != ")" {
        names_joined.push_str(&parts[index]);
        index += 1;
    }
    if index == parts.len() - 1 || parts[index + 1].to_lowercase() != "values" {
        return Err(Error::invalid(
            "Expected 'values' after column declarations",
        ));
    }
    if tok(&parts, index + 2)? != "(" {
        return Err(Error::invalid(
            "Expected value declarations within parentheses",
        ));
    }
    index += 3;
    let mut values_joined = String::new();
    while tok(&parts, index)? != ")" {
        if parts[index].to_lowercase() == "null" {
            values_joined.push_str(NULL_SENTINEL);
        } else {
            values_joined.push_str(&parts[index]);
        }
        index += 1;
    }
    Ok(Query::Insert {
        table_name,
        column_names: strings::split(&names_joined, ',', false),
        column_values: strings::split(&values_joined, ',', true),
    })
}

fn parse_update(formatted: &str) -> Result<Query> {
    let parts = strings::split(formatted, ' ', true);
    // Shortest form: UPDATE name SET col = value ;
    if parts.len() < 7 || parts[2].to_lowercase() != "set" {
        return Err(Error::invalid("Malformed query"));
    }
    let table_name = parts[1].clone();
    let mut columns = Vec::new();
    let mut values = Vec::new();
    let mut index = 3;
    loop {
        let part = tok(&parts, index)?;
        if part == ";" || part.to_lowercase() == "where" {
            break;
        }
        columns.push(part.to_string());
        index += 1;
        if tok(&parts, index)? != "=" {
            return Err(Error::invalid("Expected = after column name"));
        }
        index += 1;
        let value = tok(&parts, index)?;
        if value.to_lowercase() == "null" {
            values.push(NULL_SENTINEL.to_string());
        } else {
            values.push(value.to_string());
        }
        index += 1;
        if tok(&parts, index)? == "," {
            index += 1;
        }
    }
    let restrictions = parse_restrictions(&parts, &mut index)?;
    Ok(Query::Update {
        table_name,
        columns,
        values,
        restrictions,
    })
}

fn parse_delete(formatted: &str) -> Result<Query> {
    let parts = strings::split(formatted, ' ', true);
    // Shortest form: DELETE FROM name ;
    if parts.len() < 4 || parts[1].to_lowercase() != "from" {
        return Err(Error::invalid("Malformed query"));
    }
    let mut index = 3;
    let restrictions = parse_restrictions(&parts, &mut index)?;
    Ok(Query::Delete {
        table_name: parts[2].clone(),
        restrictions,
    })
}

fn parse_select(formatted: &str, lowered: &str) -> Result<Query> {
    let parts = strings::split(formatted, ' ', true);
    // Shortest form: SELECT col FROM name ; -- and FROM must be present.
    if parts.len() < 5 || !lowered.contains(" from ") {
        return Err(Error::invalid("Malformed query"));
    }
    let mut index = 1;
    let mut distinct = false;
    if parts[1].to_lowercase() == "distinct" {
        distinct = true;
        index = 2;
    }
    let mut column_names = String::new();
    while tok(&parts, index)?.to_lowercase() != "from" {
        column_names.push_str(strings::extract_quoted(&parts[index]));
        index += 1;
    }
    index += 1;
    let mut table_names_joined = String::new();
    loop {
        let part = tok(&parts, index)?;
        let lowered = part.to_lowercase();
        if part == ";" || lowered == "where" || lowered == "order" {
            break;
        }
        table_names_joined.push_str(strings::extract_quoted(part));
        index += 1;
    }
    let restrictions = parse_restrictions(&parts, &mut index)?;
    let join_conditions = extract_join_conditions(&restrictions);
    let order_by = parse_order_by(&parts, &mut index)?;
    let descending = parts
        .get(index)
        .map(|p| p.to_lowercase() == "desc")
        .unwrap_or(false);
    Ok(Query::Select {
        distinct,
        column_names,
        table_names: strings::split(&table_names_joined, ',', false),
        restrictions,
        join_conditions,
        order_by,
        descending,
    })
}

/// Parses an optional `WHERE …` body: the space-joined tokens up to `;` or
/// `ORDER`. With no WHERE present, the current token must already be one of
/// those terminators.
fn parse_restrictions(parts: &[String], index: &mut usize) -> Result<String> {
    let mut restrictions = String::new();
    if tok(parts, *index)?.to_lowercase() == "where" {
        *index += 1;
        loop {
            let part = tok(parts, *index)?;
            if part == ";" || part.to_lowercase() == "order" {
                break;
            }
            restrictions.push_str(part);
            restrictions.push(' ');
            *index += 1;
        }
        if restrictions.ends_with(' ') {
            restrictions.pop();
        }
    } else {
        let part = tok(parts, *index)?;
        if part != ";" && part.to_lowercase() != "order" {
            return Err(Error::invalid("Malformed query"));
        }
    }
    Ok(restrictions)
}

/// Parses an optional `ORDER BY col{,col}` clause into the comma-joined
/// column list, leaving `index` at the following `DESC` or `;` token.
fn parse_order_by(parts: &[String], index: &mut usize) -> Result<String> {
    let mut order_by = String::new();
    if tok(parts, *index)?.to_lowercase() == "order" {
        *index += 1;
        if tok(parts, *index)?.to_lowercase() != "by" {
            return Err(Error::invalid("Expected 'by' after 'order'"));
        }
        *index += 1;
        loop {
            let part = tok(parts, *index)?;
            if part == ";" || part.to_lowercase() == "desc" {
                break;
            }
            order_by.push_str(part);
            *index += 1;
        }
    }
    Ok(order_by)
}

/// True when the token cannot be a literal: not quoted and not numeric.
fn is_column_name(s: &str) -> bool {
    if matches!(s.chars().next(), Some('"') | Some('\'')) {
        return false;
    }
    !strings::looks_numeric(s)
}

/// Scans the WHERE body in comparison triples and keeps those whose both
/// sides are column-name-like; they drive the join operator.
fn extract_join_conditions(restrictions: &str) -> String {
    if restrictions.is_empty() {
        return String::new();
    }
    let parts = strings::split(restrictions, ' ', true);
    let mut join_conditions = String::new();
    let mut index = 0;
    while index < parts.len() {
        let left = &parts[index];
        let keep = match (parts.get(index + 1), parts.get(index + 2)) {
            (Some(op), Some(right)) if is_column_name(left) && is_column_name(right) => {
                join_conditions.push_str(left);
                join_conditions.push(' ');
                join_conditions.push_str(op);
                join_conditions.push(' ');
                join_conditions.push_str(right);
                true
            }
            _ => false,
        };
        index += 3;
        if index < parts.len() && (parts[index] == "and" || parts[index] == "or") {
            if keep {
                join_conditions.push(' ');
            }
            index += 1;
        }
    }
    if join_conditions.ends_with(' ') {
        join_conditions.pop();
    }
    join_conditions
}
