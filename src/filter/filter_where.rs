use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo, TableSpec};

/// Renders a JSON where-document into a parameterised SQL predicate.
///
/// `{ "user_id": "...", "date": { "$gte": "2025-01-01" }, "$or": [ ... ] }`
pub struct FilterWhere {
    spec: TableSpec,
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(spec: TableSpec, starting_param_index: usize) -> Self {
        Self {
            spec,
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    pub fn generate(where_data: &Value, spec: TableSpec, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut filter_where = Self::new(spec, starting_param_index);
        let conditions = filter_where.render(where_data)?;
        Ok((conditions.join(" AND "), filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        match where_data {
            Value::Null | Value::Object(_) => Ok(()),
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn render(&mut self, where_data: &Value) -> Result<Vec<String>, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(vec![]),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidWhereClause("Unsupported WHERE format".to_string())),
        };

        let mut sql = Vec::new();
        for (key, value) in obj {
            if key.starts_with('$') {
                sql.push(self.render_logical(key, value)?);
            } else {
                for condition in self.parse_field_condition(key, value)? {
                    sql.push(self.build_sql_condition(&condition)?);
                }
            }
        }
        Ok(sql)
    }

    fn render_logical(&mut self, op: &str, value: &Value) -> Result<String, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!("{} requires at least one clause", op)));
                }
                let mut parts = Vec::new();
                for clause in arr {
                    let inner = self.render(clause)?;
                    parts.push(if inner.is_empty() { "1=1".to_string() } else { format!("({})", inner.join(" AND ")) });
                }
                let joiner = if op == "$and" { " AND " } else { " OR " };
                Ok(format!("({})", parts.join(joiner)))
            }
            "$not" => {
                let inner = self.render(value)?;
                if inner.is_empty() {
                    return Err(FilterError::InvalidOperatorData("$not requires a condition".to_string()));
                }
                Ok(format!("NOT ({})", inner.join(" AND ")))
            }
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(&self, field: &str, value: &Value) -> Result<Vec<FilterWhereInfo>, FilterError> {
        if !self.spec.has_column(field) {
            return Err(FilterError::InvalidColumn(field.to_string()));
        }

        match value {
            Value::Object(obj) => obj
                .iter()
                .map(|(op_key, op_val)| {
                    Ok(FilterWhereInfo {
                        column: field.to_string(),
                        operator: Self::map_operator(op_key)?,
                        data: op_val.clone(),
                    })
                })
                .collect(),
            // Implicit equality: { field: value }
            _ => Ok(vec![FilterWhereInfo {
                column: field.to_string(),
                operator: FilterOp::Eq,
                data: value.clone(),
            }]),
        }
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Neq,
            "$gt" => FilterOp::Gt,
            "$gte" => FilterOp::Gte,
            "$lt" => FilterOp::Lt,
            "$lte" => FilterOp::Lte,
            "$like" => FilterOp::Like,
            "$ilike" => FilterOp::ILike,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            "$between" => FilterOp::Between,
            "$null" => FilterOp::Null,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = condition.column.as_str();
        let quoted = format!("\"{}\"", column);
        let data = &condition.data;

        let sql = match condition.operator {
            FilterOp::Eq if data.is_null() => format!("{} IS NULL", quoted),
            FilterOp::Eq => format!("{} = {}", quoted, self.param(column, data)),
            FilterOp::Neq if data.is_null() => format!("{} IS NOT NULL", quoted),
            FilterOp::Neq => format!("{} <> {}", quoted, self.param(column, data)),
            FilterOp::Gt => format!("{} > {}", quoted, self.scalar_param(column, data, "$gt")?),
            FilterOp::Gte => format!("{} >= {}", quoted, self.scalar_param(column, data, "$gte")?),
            FilterOp::Lt => format!("{} < {}", quoted, self.scalar_param(column, data, "$lt")?),
            FilterOp::Lte => format!("{} <= {}", quoted, self.scalar_param(column, data, "$lte")?),
            FilterOp::Like => format!("{} LIKE {}", quoted, self.scalar_param(column, data, "$like")?),
            FilterOp::ILike => format!("{} ILIKE {}", quoted, self.scalar_param(column, data, "$ilike")?),
            FilterOp::In | FilterOp::NIn => {
                let values = data
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData("$in/$nin requires array".to_string()))?;
                let negate = condition.operator == FilterOp::NIn;
                if values.is_empty() {
                    return Ok(if negate { "1=1" } else { "1=0" }.to_string());
                }
                let params: Vec<String> = values.iter().map(|v| self.param(column, v)).collect();
                let keyword = if negate { "NOT IN" } else { "IN" };
                format!("{} {} ({})", quoted, keyword, params.join(", "))
            }
            FilterOp::Between => match data.as_array() {
                Some(values) if values.len() == 2 => {
                    let low = self.param(column, &values[0]);
                    let high = self.param(column, &values[1]);
                    format!("{} BETWEEN {} AND {}", quoted, low, high)
                }
                _ => return Err(FilterError::InvalidOperatorData("$between requires exactly 2 values".to_string())),
            },
            FilterOp::Null => match data.as_bool() {
                Some(true) => format!("{} IS NULL", quoted),
                Some(false) => format!("{} IS NOT NULL", quoted),
                None => return Err(FilterError::InvalidOperatorData("$null requires boolean".to_string())),
            },
        };
        Ok(sql)
    }

    fn scalar_param(&mut self, column: &str, value: &Value, op: &str) -> Result<String, FilterError> {
        if value.is_array() || value.is_object() || value.is_null() {
            return Err(FilterError::InvalidOperatorData(format!("{} requires a scalar value", op)));
        }
        Ok(self.param(column, value))
    }

    fn param(&mut self, column: &str, value: &Value) -> String {
        self.param_values.push(value.clone());
        self.param_index += 1;
        match self.spec.cast_for(column) {
            Some(cast) => format!("${}::{}", self.param_index, cast),
            None => format!("${}", self.param_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SPEC: TableSpec = TableSpec {
        name: "sleep_sessions",
        columns: &["id", "user_id", "date", "hours", "quality"],
        casts: &[("id", "uuid"), ("user_id", "uuid"), ("date", "date")],
    };

    #[test]
    fn implicit_equality_with_cast() {
        let (sql, params) = FilterWhere::generate(&json!({ "user_id": "abc" }), SPEC, 0).unwrap();
        assert_eq!(sql, "\"user_id\" = $1::uuid");
        assert_eq!(params, vec![json!("abc")]);
    }

    #[test]
    fn between_and_comparison() {
        let where_data = json!({
            "date": { "$between": ["2025-01-01", "2025-01-31"] },
            "hours": { "$gte": 6 }
        });
        let (sql, params) = FilterWhere::generate(&where_data, SPEC, 0).unwrap();
        assert_eq!(sql, "\"date\" BETWEEN $1::date AND $2::date AND \"hours\" >= $3");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn nested_or_keeps_parameter_numbering() {
        let where_data = json!({
            "user_id": "u",
            "$or": [ { "quality": 5 }, { "hours": { "$gt": 8 } } ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, SPEC, 0).unwrap();
        // object keys iterate in sorted order, so "$or" renders first
        assert_eq!(sql, "((\"quality\" = $1) OR (\"hours\" > $2)) AND \"user_id\" = $3::uuid");
        assert_eq!(params, vec![json!(5), json!(8), json!("u")]);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "hours": 7 }), SPEC, 2).unwrap();
        assert_eq!(sql, "\"hours\" = $3");
    }

    #[test]
    fn null_handling_and_empty_in() {
        let (sql, params) = FilterWhere::generate(&json!({ "quality": null, "id": { "$in": [] } }), SPEC, 0).unwrap();
        assert_eq!(sql, "1=0 AND \"quality\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let err = FilterWhere::generate(&json!({ "password_hash": "x" }), SPEC, 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));

        let err = FilterWhere::generate(&json!({ "\"; DROP TABLE users; --": 1 }), SPEC, 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidColumn(_)));
    }

    #[test]
    fn unsupported_operator() {
        let err = FilterWhere::generate(&json!({ "hours": { "$regex": ".*" } }), SPEC, 0).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(_)));
    }
}
