use std::io::{self, Write};

use crate::errors::{ScriptError, ScriptResult};
use crate::snowflake::QueryResult;

/// One metric: result column, step output key and report label.
#[derive(Debug, Clone, Copy)]
pub struct MetricSpec {
    pub column: &'static str,
    pub output_key: &'static str,
    pub label: &'static str,
}

/// Declared in positional order; the position is the fallback when the
/// column name is not found.
pub const METRICS: [MetricSpec; 5] = [
    MetricSpec {
        column: "LAST_DATE",
        output_key: "last_date",
        label: "Last date:",
    },
    MetricSpec {
        column: "WK_TOTAL_QUERIES",
        output_key: "wk_total_queries",
        label: "Total queries:",
    },
    MetricSpec {
        column: "WK_FAILED_QUERIES",
        output_key: "wk_failed_queries",
        label: "Failed queries:",
    },
    MetricSpec {
        column: "WK_AVG_QUERY_DURATION_SEC",
        output_key: "wk_avg_sec",
        label: "Avg query duration s:",
    },
    MetricSpec {
        column: "STORAGE_GB_ESTIMATE",
        output_key: "storage_gb",
        label: "Storage (GB):",
    },
];

pub const REPORT_TITLE: &str = "=== Snowflake INFORMATION_SCHEMA Metrics (last 7 days) ===";
const LABEL_WIDTH: usize = 22;

/// Values exactly as the warehouse rendered them; SQL NULL becomes "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WarehouseMetrics {
    pub last_date: String,
    pub wk_total_queries: String,
    pub wk_failed_queries: String,
    pub wk_avg_sec: String,
    pub storage_gb: String,
}

impl WarehouseMetrics {
    fn from_values(values: [String; 5]) -> Self {
        let [last_date, wk_total_queries, wk_failed_queries, wk_avg_sec, storage_gb] = values;
        Self {
            last_date,
            wk_total_queries,
            wk_failed_queries,
            wk_avg_sec,
            storage_gb,
        }
    }

    pub fn values(&self) -> [&str; 5] {
        [
            &self.last_date,
            &self.wk_total_queries,
            &self.wk_failed_queries,
            &self.wk_avg_sec,
            &self.storage_gb,
        ]
    }

    /// `(output_key, value)` pairs in declaration order.
    pub fn outputs(&self) -> Vec<(&'static str, &str)> {
        METRICS
            .iter()
            .zip(self.values())
            .map(|(spec, value)| (spec.output_key, value))
            .collect()
    }

    pub fn write_report(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", REPORT_TITLE)?;
        for (spec, value) in METRICS.iter().zip(self.values()) {
            writeln!(out, "{:<width$}{}", spec.label, value, width = LABEL_WIDTH)?;
        }
        Ok(())
    }
}

/// Pulls the five metrics out of the first result row.
///
/// Each metric is looked up by column name (case-insensitive) and falls back
/// to its position when the name is absent or there is no column metadata.
/// A reordered query without matching names is therefore read positionally.
pub fn extract(result: &QueryResult) -> ScriptResult<WarehouseMetrics> {
    let row = result.first_row().ok_or(ScriptError::NoRows)?;
    if row.len() < METRICS.len() {
        return Err(ScriptError::ResultShape(format!(
            "row has {} values",
            row.len()
        )));
    }

    let values = std::array::from_fn(|position| {
        let index = result
            .column_index(METRICS[position].column)
            .filter(|&index| index < row.len())
            .unwrap_or(position);
        row[index].clone().unwrap_or_default()
    });

    Ok(WarehouseMetrics::from_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snowflake::Column;
    use assert_matches::assert_matches;

    fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    fn full_row() -> Vec<Option<String>> {
        row(&[Some("2024-06-30"), Some("1532"), Some("12"), Some("0.842"), Some("3.75")])
    }

    #[test]
    fn positional_when_no_metadata() {
        let result = QueryResult::new(vec![], vec![full_row()]);
        let metrics = extract(&result).unwrap();
        assert_eq!(metrics.last_date, "2024-06-30");
        assert_eq!(metrics.wk_total_queries, "1532");
        assert_eq!(metrics.wk_failed_queries, "12");
        assert_eq!(metrics.wk_avg_sec, "0.842");
        assert_eq!(metrics.storage_gb, "3.75");
    }

    #[test]
    fn names_win_over_position() {
        let columns = [
            "storage_gb_estimate",
            "Wk_Avg_Query_Duration_Sec",
            "WK_FAILED_QUERIES",
            "wk_total_queries",
            "last_date",
        ]
        .into_iter()
        .map(Column::named)
        .collect();
        let result = QueryResult::new(
            columns,
            vec![row(&[Some("3.75"), Some("0.842"), Some("12"), Some("1532"), Some("2024-06-30")])],
        );
        let metrics = extract(&result).unwrap();
        assert_eq!(metrics.values(), ["2024-06-30", "1532", "12", "0.842", "3.75"]);
    }

    #[test]
    fn unmatched_names_fall_back_to_position() {
        let columns = ["D", "TOTAL", "FAILED", "AVG", "STORAGE_GB_ESTIMATE"]
            .into_iter()
            .map(Column::named)
            .collect();
        let result = QueryResult::new(columns, vec![full_row()]);
        let metrics = extract(&result).unwrap();
        assert_eq!(metrics.values(), ["2024-06-30", "1532", "12", "0.842", "3.75"]);
    }

    #[test]
    fn duplicate_names_take_the_last_column() {
        let columns = [
            "LAST_DATE",
            "WK_TOTAL_QUERIES",
            "WK_FAILED_QUERIES",
            "WK_AVG_QUERY_DURATION_SEC",
            "STORAGE_GB_ESTIMATE",
            "last_date",
        ]
        .into_iter()
        .map(Column::named)
        .collect();
        let mut values = full_row();
        values.push(Some("2024-07-01".into()));
        let metrics = extract(&QueryResult::new(columns, vec![values])).unwrap();
        assert_eq!(metrics.last_date, "2024-07-01");
    }

    #[test]
    fn nulls_become_empty_strings() {
        let result = QueryResult::new(vec![], vec![row(&[None, Some("0"), Some("0"), None, Some("0")])]);
        let metrics = extract(&result).unwrap();
        assert_eq!(metrics.last_date, "");
        assert_eq!(metrics.wk_avg_sec, "");
    }

    #[test]
    fn no_rows_is_an_error() {
        let result = QueryResult::new(vec![Column::named("LAST_DATE")], vec![]);
        assert_matches!(extract(&result), Err(ScriptError::NoRows));
    }

    #[test]
    fn short_rows_are_rejected_even_with_names() {
        let columns = ["LAST_DATE", "WK_TOTAL_QUERIES", "WK_FAILED_QUERIES"]
            .into_iter()
            .map(Column::named)
            .collect();
        let result = QueryResult::new(columns, vec![row(&[Some("2024-06-30"), Some("1"), Some("0")])]);
        assert_matches!(extract(&result), Err(ScriptError::ResultShape(msg)) if msg == "row has 3 values");
    }

    #[test]
    fn report_and_outputs_use_fixed_labels_and_keys() {
        let metrics = extract(&QueryResult::new(vec![], vec![full_row()])).unwrap();
        let mut out = Vec::new();
        metrics.write_report(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "=== Snowflake INFORMATION_SCHEMA Metrics (last 7 days) ===\n\
             Last date:            2024-06-30\n\
             Total queries:        1532\n\
             Failed queries:       12\n\
             Avg query duration s: 0.842\n\
             Storage (GB):         3.75\n"
        );
        assert_eq!(
            metrics.outputs(),
            vec![
                ("last_date", "2024-06-30"),
                ("wk_total_queries", "1532"),
                ("wk_failed_queries", "12"),
                ("wk_avg_sec", "0.842"),
                ("storage_gb", "3.75"),
            ]
        );
    }
}
