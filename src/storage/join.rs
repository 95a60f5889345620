//! The hash-join operator
//!
//! Two tables compose into one stream. The smaller input by row count is
//! indexed into a hash map (build side); the larger is streamed against it
//! (probe side). Remote tables report an unknown row count and therefore
//! always probe. Probe rows without a key match are padded with blank cells
//! (left-outer semantics); with no join condition at all, probe rows pair
//! cyclically with build rows.

use super::stream::{SharedStream, TableStream};
use super::table::{compare_rows, fingerprint, Table, UpdateMap};
use crate::error::{Error, Result};
use crate::sql::Restriction;
use crate::strings;
use crate::types::{Row, Schema};
use std::collections::HashMap;

/// Bounds-checked token access over a split join condition.
fn tok(parts: &[String], index: usize) -> Result<&str> {
    parts
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| Error::invalid("Malformed query"))
}

pub struct JoinedTable {
    schema: Schema,
    build: Box<dyn Table>,
    probe: Box<dyn Table>,
    /// Probe-side column name (qualified where needed) to build-side key
    /// column.
    column_map: HashMap<String, String>,
    /// `"<buildCol>=<value>"` to the build row holding that value. A value
    /// appearing in several build rows keeps only the last.
    join_map: HashMap<String, Row>,
    restriction: Restriction,
    col_filter: Vec<String>,
    distinct: bool,
    seen: std::collections::HashSet<String>,
    /// In-memory buffer replacing the joined stream after an order-by.
    sorted: Option<SharedStream>,
}

impl JoinedTable {
    /// Composes two tables under a join condition: zero or more
    /// `<col> = <col>` comparisons separated by single spaces (empty for a
    /// cross product).
    pub fn new(
        table1: Box<dyn Table>,
        table2: Box<dyn Table>,
        join_condition: &str,
    ) -> Result<JoinedTable> {
        let (build, probe) = if table1.row_count() > table2.row_count() {
            (table2, table1)
        } else {
            (table1, table2)
        };
        let mut schema = probe.schema().clone();
        schema.merge(build.schema());
        let mut joined = JoinedTable {
            schema,
            build,
            probe,
            column_map: HashMap::new(),
            join_map: HashMap::new(),
            restriction: Restriction::default(),
            col_filter: Vec::new(),
            distinct: false,
            seen: std::collections::HashSet::new(),
            sorted: None,
        };
        if !join_condition.is_empty() {
            let parts = strings::split(join_condition, ' ', true);
            joined.parse_join_condition(&parts)?;
        }
        Ok(joined)
    }

    /// Records the probe-to-build key mapping for each `=` triple, then
    /// indexes the build side.
    fn parse_join_condition(&mut self, parts: &[String]) -> Result<()> {
        let mut build_columns = Vec::new();
        let mut index = 0;
        loop {
            if tok(parts, index + 1)? != "=" {
                return Err(Error::invalid(
                    "Joins currently only support the = operator",
                ));
            }
            let left = tok(parts, index)?.to_string();
            let right = tok(parts, index + 2)?.to_string();
            if self.build.schema().has_column(&left) {
                self.column_map.insert(right, left.clone());
                build_columns.push(left);
            } else {
                self.column_map.insert(left, right.clone());
                build_columns.push(right);
            }
            if index + 3 >= parts.len() {
                break;
            }
            index += 3;
        }
        self.build_join_map(&build_columns)
    }

    /// Streams the build side once, recording `col=value` entries.
    fn build_join_map(&mut self, build_columns: &[String]) -> Result<()> {
        self.build.reset()?;
        while let Some(row) = self.build.next_row()? {
            for name in build_columns {
                if let Ok(col) = row.get_column(name) {
                    let key = format!("{}={}", name, col.raw_value());
                    self.join_map.insert(key, row.clone());
                }
            }
        }
        self.build.reset()
    }

    /// Extends a probe row with its build-side match, or with blank cells
    /// when no key matches.
    fn extend_probe_row(&self, row: &mut Row) -> Result<()> {
        let mut matched: Option<Row> = None;
        for col in row.columns() {
            let mut name = col.metadata().name.clone();
            if !self.column_map.contains_key(&name) {
                name = format!("{}.{}", col.metadata().table, name);
            }
            if let Some(build_col) = self.column_map.get(&name) {
                let key = format!("{}={}", build_col, col.raw_value());
                if let Some(found) = self.join_map.get(&key) {
                    matched = Some(found.clone());
                    break;
                }
            }
        }
        match matched {
            Some(build_row) => row.merge(&build_row),
            None => {
                let mut blank = Row::new(self.build.schema().clone());
                blank.fill_blank();
                row.merge(&blank)
            }
        }
    }

    /// Pulls the next joined row passing the restriction, from the sorted
    /// buffer when one exists, otherwise by probing.
    fn pull(&mut self) -> Result<Option<Row>> {
        loop {
            let row = if let Some(sorted) = &self.sorted {
                let line = sorted.borrow_mut().read_line()?;
                match line {
                    None => return Ok(None),
                    Some(line) => Row::from_line(self.schema.clone(), &line)?,
                }
            } else {
                let Some(mut row) = self.probe.next_row()? else {
                    return Ok(None);
                };
                if self.join_map.is_empty() && self.column_map.is_empty() {
                    // Cross product: cycle through the build side.
                    let pair = match self.build.next_row()? {
                        Some(pair) => Some(pair),
                        None => {
                            self.build.reset()?;
                            self.build.next_row()?
                        }
                    };
                    if let Some(pair) = pair {
                        row.merge(&pair)?;
                    }
                } else {
                    self.extend_probe_row(&mut row)?;
                }
                row
            };
            if self.restriction.apply(&row)? {
                return Ok(Some(row));
            }
        }
    }
}

impl Clone for JoinedTable {
    fn clone(&self) -> Self {
        JoinedTable {
            schema: self.schema.clone(),
            build: self.build.boxed_clone(),
            probe: self.probe.boxed_clone(),
            column_map: self.column_map.clone(),
            join_map: self.join_map.clone(),
            restriction: self.restriction.clone(),
            col_filter: self.col_filter.clone(),
            distinct: self.distinct,
            seen: self.seen.clone(),
            sorted: self.sorted.clone(),
        }
    }
}

impl Table for JoinedTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        loop {
            let Some(mut row) = self.pull()? else {
                return Ok(None);
            };
            row.order_and_filter_columns(&self.col_filter)?;
            if self.distinct && !self.seen.insert(fingerprint(&row)) {
                continue;
            }
            return Ok(Some(row));
        }
    }

    fn insert_row(&mut self, _row: Row) -> Result<()> {
        Err(Error::invalid("Cannot insert rows in a joined table"))
    }

    fn update_rows(&mut self, _updates: UpdateMap) -> Result<()> {
        Err(Error::invalid("Cannot update rows in a joined table"))
    }

    fn delete_rows(&mut self) -> Result<()> {
        Err(Error::invalid("Cannot delete rows in a joined table"))
    }

    fn set_restrictions(&mut self, restrictions: &str) -> Result<()> {
        self.restriction = Restriction::new(restrictions)?;
        Ok(())
    }

    fn filter_columns_by_name(&mut self, col_names: &str) {
        if col_names.is_empty() {
            self.col_filter.clear();
        } else if col_names != "*" {
            self.col_filter = strings::split(col_names, ',', false);
        }
    }

    fn filter_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    fn order_by(&mut self, col_names: &str, descending: bool) -> Result<()> {
        if col_names.is_empty() {
            return Ok(());
        }
        let names = strings::split(col_names, ',', false);
        for name in &names {
            if !self.schema.has_column(name) {
                return Err(Error::invalid(format!("Column {} does not exist", name)));
            }
        }
        let mut rows = Vec::new();
        while let Some(row) = self.next_row()? {
            rows.push(row);
        }
        rows.sort_by(|a, b| compare_rows(a, b, &names, descending));
        let buffer = rows
            .iter()
            .map(Row::to_line)
            .collect::<Vec<_>>()
            .join("\n");
        self.sorted = Some(TableStream::from_buffer(buffer).shared());
        Ok(())
    }

    fn row_count(&self) -> u64 {
        self.probe.row_count()
    }

    fn reset(&mut self) -> Result<()> {
        match &self.sorted {
            Some(sorted) => sorted.borrow_mut().rewind(),
            None => {
                self.probe.reset()?;
                self.build.reset()
            }
        }
    }

    fn boxed_clone(&self) -> Box<dyn Table> {
        Box::new(self.clone())
    }
}
