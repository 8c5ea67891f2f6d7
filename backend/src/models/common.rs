use serde::{Deserialize, Deserializer};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Paging query params shared across v2 list endpoints.
///
/// Bad values are never rejected: a page below 1 becomes 1 and a page size
/// outside `1..=100` becomes 20. Values that do not parse as integers are
/// treated as absent.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(default, alias = "pageNumber", deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, alias = "pageSize", deserialize_with = "lenient_number")]
    pub page_size: Option<i64>,
}

impl PageParams {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Optional owning-branch filter for employee and vehicle listings.
#[derive(Debug, Default, Deserialize)]
pub struct BranchFilter {
    pub branch_id: Option<Uuid>,
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_values_fall_back_to_defaults() {
        let params = PageParams::new(0, 500);
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);

        let params = PageParams::new(-3, 0);
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn in_range_values_are_kept() {
        let params = PageParams::new(4, 100);
        assert_eq!(params.page(), 4);
        assert_eq!(params.page_size(), 100);

        let params = PageParams::new(1, 1);
        assert_eq!(params.page_size(), 1);
    }

    #[test]
    fn absent_values_use_defaults() {
        let params = PageParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
    }
}
