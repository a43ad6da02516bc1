//! The fully numeric table handed to the split and model stages.

/// Named columns over row-major `f64` data. Every cell is a real number;
/// the encoder fills gaps before rows get here.
#[derive(Debug, Clone)]
pub struct FeatureFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copies one column out by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureFrame {
        FeatureFrame {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        }
    }

    #[test]
    fn test_column_lookup_by_name() {
        let frame = sample();
        assert_eq!(frame.column_index("b"), Some(1));
        assert_eq!(frame.column_index("c"), None);
        assert_eq!(frame.column("b"), Some(vec![2.0, 4.0]));
    }

    #[test]
    fn test_len_tracks_rows() {
        assert_eq!(sample().len(), 2);
        assert!(!sample().is_empty());
    }
}
