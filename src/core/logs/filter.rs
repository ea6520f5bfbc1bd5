use anyhow::{Result, anyhow};
use rusqlite::types::Value;

use super::types::{LogLevel, Severity};

pub const DEFAULT_LOG_LIMIT: usize = 100;
pub const MAX_LOG_LIMIT: usize = 1000;

/// Query over a tenant's system logs. Every field is optional; unset fields
/// do not constrain the result.
#[derive(Debug, Clone, Default, serde::Deserialize, serde::Serialize)]
pub struct LogFilter {
    pub module: Option<String>,
    pub level: Option<String>,
    pub severity: Option<String>,
    pub min_severity: Option<String>,
    /// Case-insensitive substring match over event and description.
    pub search: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD[ HH:MM:SS]`.
    pub since: Option<String>,
    /// Exclusive upper bound, same format as `since`.
    pub until: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl LogFilter {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT)
    }

    /// Builds the `WHERE` clause (tenant first) and its positional values.
    pub fn to_sql(&self, tenant_id: &str) -> Result<(String, Vec<Value>)> {
        let mut clauses = vec!["tenant_id = ?".to_string()];
        let mut values = vec![Value::Text(tenant_id.to_string())];

        if let Some(module) = non_empty(&self.module) {
            clauses.push("module = ?".to_string());
            values.push(Value::Text(module.to_string()));
        }
        if let Some(level) = non_empty(&self.level) {
            let level = LogLevel::parse(level).ok_or_else(|| anyhow!("Unknown log level: {}", level))?;
            clauses.push("level = ?".to_string());
            values.push(Value::Text(level.as_str().to_string()));
        }
        if let Some(severity) = non_empty(&self.severity) {
            let severity =
                Severity::parse(severity).ok_or_else(|| anyhow!("Unknown severity: {}", severity))?;
            clauses.push("severity = ?".to_string());
            values.push(Value::Text(severity.as_str().to_string()));
        }
        if let Some(min) = non_empty(&self.min_severity) {
            let min = Severity::parse(min).ok_or_else(|| anyhow!("Unknown severity: {}", min))?;
            let allowed = min.at_least();
            let placeholders = vec!["?"; allowed.len()].join(", ");
            clauses.push(format!("severity IN ({})", placeholders));
            values.extend(allowed.iter().map(|s| Value::Text(s.as_str().to_string())));
        }
        if let Some(search) = non_empty(&self.search) {
            clauses.push(
                "(LOWER(event) LIKE ? ESCAPE '\\' OR LOWER(description) LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            values.push(Value::Text(pattern.clone()));
            values.push(Value::Text(pattern));
        }
        if let Some(since) = non_empty(&self.since) {
            clauses.push("created_at >= ?".to_string());
            values.push(Value::Text(since.to_string()));
        }
        if let Some(until) = non_empty(&self.until) {
            clauses.push("created_at < ?".to_string());
            values.push(Value::Text(until.to_string()));
        }

        Ok((clauses.join(" AND "), values))
    }
}

/// `%` and `_` in a search term match themselves.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_only_scopes_tenant() {
        let (sql, values) = LogFilter::default().to_sql("t1").unwrap();
        assert_eq!(sql, "tenant_id = ?");
        assert_eq!(values, vec![Value::Text("t1".to_string())]);
    }

    #[test]
    fn min_severity_expands_to_in_clause() {
        let filter = LogFilter {
            min_severity: Some("high".to_string()),
            ..Default::default()
        };
        let (sql, values) = filter.to_sql("t1").unwrap();
        assert!(sql.contains("severity IN (?, ?)"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let filter = LogFilter {
            level: Some("verbose".to_string()),
            ..Default::default()
        };
        let err = filter.to_sql("t1").unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn blank_fields_are_ignored() {
        let filter = LogFilter {
            module: Some("  ".to_string()),
            search: Some(String::new()),
            ..Default::default()
        };
        let (sql, _) = filter.to_sql("t1").unwrap();
        assert_eq!(sql, "tenant_id = ?");
    }

    #[test]
    fn limit_is_clamped() {
        let filter = LogFilter {
            limit: Some(50_000),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), MAX_LOG_LIMIT);
        assert_eq!(LogFilter::default().effective_limit(), DEFAULT_LOG_LIMIT);
    }

    #[test]
    fn search_wildcards_are_escaped() {
        let filter = LogFilter {
            search: Some("50%_Done".to_string()),
            ..Default::default()
        };
        let (sql, values) = filter.to_sql("t1").unwrap();
        assert!(sql.contains("LIKE ? ESCAPE '\\'"));
        assert_eq!(values[1], Value::Text("%50\\%\\_done%".to_string()));
    }
}
