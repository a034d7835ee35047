use crate::constants::ERR_EMPTY_CATEGORY;
use crate::error::{AppError, Result};

/// Click counter for a single category filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClickCounter {
    pub category: String,
    pub click_count: u64,
}

impl FilterClickCounter {
    pub fn new(category: impl Into<String>, click_count: u64) -> Self {
        Self {
            category: category.into(),
            click_count,
        }
    }

    /// Validate that a category name is usable as a primary key
    pub fn validate_category(category: &str) -> Result<()> {
        if category.trim().is_empty() {
            return Err(AppError::InvalidInput(ERR_EMPTY_CATEGORY.to_string()));
        }
        Ok(())
    }
}

/// Keep the `limit` most-clicked counters, highest first; ties by category name
pub(crate) fn top_by_clicks(mut counters: Vec<FilterClickCounter>, limit: usize) -> Vec<FilterClickCounter> {
    counters.sort_by(|a, b| {
        b.click_count
            .cmp(&a.click_count)
            .then_with(|| a.category.cmp(&b.category))
    });
    counters.truncate(limit);
    counters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_category() {
        assert!(FilterClickCounter::validate_category("Comida").is_ok());
        assert!(FilterClickCounter::validate_category("").is_err());
        assert!(FilterClickCounter::validate_category("\t").is_err());
    }

    #[test]
    fn test_top_by_clicks() {
        let counters = vec![
            FilterClickCounter::new("Comida", 3),
            FilterClickCounter::new("Salud", 5),
            FilterClickCounter::new("Viajes", 3),
            FilterClickCounter::new("Moda", 1),
        ];

        let top = top_by_clicks(counters, 3);
        let names: Vec<_> = top.iter().map(|c| c.category.as_str()).collect();

        assert_eq!(names, vec!["Salud", "Comida", "Viajes"]);
    }

    #[test]
    fn test_top_by_clicks_short_list() {
        let top = top_by_clicks(vec![FilterClickCounter::new("Comida", 1)], 3);
        assert_eq!(top.len(), 1);
        assert!(top_by_clicks(Vec::new(), 3).is_empty());
    }
}
