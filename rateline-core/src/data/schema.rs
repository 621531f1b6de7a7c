use super::returns::{CLOSE_COLUMN, LOG_RETURN_COLUMN, TIME_COLUMN};
use polars::prelude::*;

/// Expected schema for a single-symbol return frame
pub struct ReturnSchema;

impl ReturnSchema {
    /// Get the canonical return-frame schema
    pub fn schema() -> Schema {
        Schema::from_iter(vec![
            Field::new(TIME_COLUMN.into(), DataType::Datetime(TimeUnit::Milliseconds, None)),
            Field::new(CLOSE_COLUMN.into(), DataType::Float64),
            Field::new(LOG_RETURN_COLUMN.into(), DataType::Float64),
        ])
    }

    /// Validate DataFrame against schema, including that no extra columns ride along
    pub fn validate(df: &DataFrame) -> Result<(), SchemaError> {
        let expected = Self::schema();
        let actual = df.schema();

        for field in expected.iter_fields() {
            let actual_dtype = actual
                .get(field.name())
                .ok_or_else(|| SchemaError::MissingColumn(field.name().to_string()))?;
            if actual_dtype != field.dtype() {
                return Err(SchemaError::TypeMismatch {
                    column: field.name().to_string(),
                    expected: field.dtype().clone(),
                    actual: actual_dtype.clone(),
                });
            }
        }

        for name in actual.iter_names() {
            if !expected.contains(name) {
                return Err(SchemaError::UnexpectedColumn(name.to_string()));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Unexpected column: {0}")]
    UnexpectedColumn(String),

    #[error("Type mismatch in column {column}: expected {expected:?}, got {actual:?}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        actual: DataType,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_column() -> Column {
        Column::Series(
            Series::new("time".into(), &[1704067200000i64])
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
                .unwrap()
                .into(),
        )
    }

    #[test]
    fn test_schema_has_all_required_columns() {
        let schema = ReturnSchema::schema();
        assert!(schema.contains("time"));
        assert!(schema.contains("close"));
        assert!(schema.contains("log_return"));
        assert_eq!(schema.len(), 3);
    }

    #[test]
    fn test_validate_accepts_valid_dataframe() {
        let df = DataFrame::new(vec![
            time_column(),
            Column::Series(Series::new("close".into(), &[1.0850]).into()),
            Column::Series(Series::new("log_return".into(), &[f64::NAN]).into()),
        ])
        .unwrap();

        assert!(ReturnSchema::validate(&df).is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_column() {
        let df = DataFrame::new(vec![
            time_column(),
            Column::Series(Series::new("close".into(), &[1.0850]).into()),
        ])
        .unwrap();

        let result = ReturnSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::MissingColumn(c) if c == "log_return"));
    }

    #[test]
    fn test_validate_rejects_extra_ohlc_column() {
        let df = DataFrame::new(vec![
            time_column(),
            Column::Series(Series::new("close".into(), &[1.0850]).into()),
            Column::Series(Series::new("log_return".into(), &[f64::NAN]).into()),
            Column::Series(Series::new("open".into(), &[1.0840]).into()),
        ])
        .unwrap();

        let result = ReturnSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::UnexpectedColumn(c) if c == "open"));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let df = DataFrame::new(vec![
            time_column(),
            Column::Series(Series::new("close".into(), &["not_a_number"]).into()),
            Column::Series(Series::new("log_return".into(), &[f64::NAN]).into()),
        ])
        .unwrap();

        let result = ReturnSchema::validate(&df);
        assert!(matches!(result.unwrap_err(), SchemaError::TypeMismatch { .. }));
    }
}
