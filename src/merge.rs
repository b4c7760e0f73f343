use crate::error::RiskError;
use crate::types::{Cell, Table};
use crate::util::canonical_key;
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub left_rows: usize,
    pub right_rows: usize,
    pub output_rows: usize,
    pub unmatched_left: usize,
    pub duplicate_right_keys: usize,
}

/// Inner join `left` and `right` on the column `key`.
///
/// Columns come out as every left column followed by every right column
/// except the key. A non-key name present on both sides becomes `<name>_x` on
/// the left and `<name>_y` on the right. Rows keep left order; a left row
/// matching several right rows yields one output row per match, in right order.
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<(Table, JoinStats), RiskError> {
    let left_key = left
        .column_index(key)
        .ok_or_else(|| RiskError::missing_column(key, &left.name))?;
    let right_key = right
        .column_index(key)
        .ok_or_else(|| RiskError::missing_column(key, &right.name))?;

    let mut headers: Vec<String> = left
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i != left_key && right.column_index(h).is_some() {
                format!("{}_x", h)
            } else {
                h.clone()
            }
        })
        .collect();
    let right_cols: Vec<usize> = (0..right.headers.len()).filter(|&i| i != right_key).collect();
    for &i in &right_cols {
        let h = &right.headers[i];
        if left.column_index(h).is_some() {
            headers.push(format!("{}_y", h));
        } else {
            headers.push(h.clone());
        }
    }

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (row_idx, row) in right.rows.iter().enumerate() {
        if let Some(k) = canonical_key(&row[right_key]) {
            index.entry(k).or_default().push(row_idx);
        }
    }
    let duplicate_right_keys = index.values().filter(|rows| rows.len() > 1).count();
    if duplicate_right_keys > 0 {
        warn!(
            key,
            table = %right.name,
            duplicate_keys = duplicate_right_keys,
            "duplicate join keys; matching rows are multiplied"
        );
    }

    let name = format!("{} + {}", left.name, right.name);
    let mut out = Table::new(name, headers);
    let mut unmatched_left = 0usize;
    for row in &left.rows {
        let matches = canonical_key(&row[left_key]).and_then(|k| index.get(&k));
        let Some(matches) = matches else {
            unmatched_left += 1;
            continue;
        };
        for &r in matches {
            let mut joined: Vec<Cell> = row.clone();
            joined.extend(right_cols.iter().map(|&i| right.rows[r][i].clone()));
            out.push_row(joined);
        }
    }

    let stats = JoinStats {
        left_rows: left.len(),
        right_rows: right.len(),
        output_rows: out.len(),
        unmatched_left,
        duplicate_right_keys,
    };
    debug!(key, ?stats, "joined tables");
    Ok((out, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table(name: &str, headers: &[&str], rows: Vec<Vec<Cell>>) -> Table {
        let mut t = Table::new(name, headers.iter().map(|h| h.to_string()).collect());
        for r in rows {
            t.push_row(r);
        }
        t
    }

    #[test]
    fn unmatched_rows_are_dropped_and_order_kept() {
        let ar = table(
            "ar",
            &["Invoice_No", "Days_Overdue"],
            vec![
                vec![Cell::text("INV-3"), Cell::Number(5.0)],
                vec![Cell::text("INV-1"), Cell::Number(120.0)],
                vec![Cell::text("INV-9"), Cell::Number(30.0)],
            ],
        );
        let billing = table(
            "billing",
            &["Project_ID", "Invoice_No"],
            vec![
                vec![Cell::text("P1"), Cell::text("INV-1")],
                vec![Cell::text("P3"), Cell::text("INV-3")],
            ],
        );
        let (out, stats) = inner_join(&ar, &billing, "Invoice_No").unwrap();
        assert_eq!(out.headers, vec!["Invoice_No", "Days_Overdue", "Project_ID"]);
        assert_eq!(
            out.rows,
            vec![
                vec![Cell::text("INV-3"), Cell::Number(5.0), Cell::text("P3")],
                vec![Cell::text("INV-1"), Cell::Number(120.0), Cell::text("P1")],
            ]
        );
        assert_eq!(stats.unmatched_left, 1);
        assert_eq!(stats.output_rows, 2);
    }

    #[test]
    fn numeric_and_text_keys_join() {
        let left = table("l", &["Project_ID"], vec![vec![Cell::Number(7.0)]]);
        let right = table(
            "r",
            &["Project_ID", "Contract_Value"],
            vec![vec![Cell::text("7"), Cell::Number(400.0)]],
        );
        let (out, _) = inner_join(&left, &right, "Project_ID").unwrap();
        assert_eq!(out.rows, vec![vec![Cell::Number(7.0), Cell::Number(400.0)]]);
    }

    #[test]
    fn duplicate_keys_multiply_rows() {
        let left = table(
            "l",
            &["Project_ID", "Invoice_No"],
            vec![
                vec![Cell::text("P1"), Cell::text("A")],
                vec![Cell::text("P1"), Cell::text("B")],
            ],
        );
        let right = table(
            "r",
            &["Project_ID", "Tag"],
            vec![
                vec![Cell::text("P1"), Cell::text("first")],
                vec![Cell::text("P1"), Cell::text("second")],
            ],
        );
        let (out, stats) = inner_join(&left, &right, "Project_ID").unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(stats.duplicate_right_keys, 1);
        assert_eq!(out.rows[1][1..], [Cell::text("A"), Cell::text("second")]);
        assert_eq!(out.rows[2][1..], [Cell::text("B"), Cell::text("first")]);
    }

    #[test]
    fn shared_columns_are_suffixed() {
        let left = table("l", &["Invoice_No", "Amount"], vec![vec![Cell::text("A"), Cell::Number(1.0)]]);
        let right = table("r", &["Invoice_No", "Amount"], vec![vec![Cell::text("A"), Cell::Number(2.0)]]);
        let (out, _) = inner_join(&left, &right, "Invoice_No").unwrap();
        assert_eq!(out.headers, vec!["Invoice_No", "Amount_x", "Amount_y"]);
    }

    #[test]
    fn empty_keys_never_match() {
        let left = table("l", &["K"], vec![vec![Cell::Empty]]);
        let right = table("r", &["K"], vec![vec![Cell::Empty]]);
        let (out, stats) = inner_join(&left, &right, "K").unwrap();
        assert!(out.is_empty());
        assert_eq!(stats.unmatched_left, 1);
    }

    #[test]
    fn missing_key_names_the_table() {
        let left = table("AR Aging file", &["Invoice"], vec![]);
        let right = table("Billing file", &["Invoice_No"], vec![]);
        let err = inner_join(&left, &right, "Invoice_No").unwrap_err();
        assert_eq!(err.to_string(), "Missing column 'Invoice_No' in AR Aging file");
    }
}
