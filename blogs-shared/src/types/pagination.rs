use serde::Deserialize;

pub const MAX_PER_PAGE: i64 = 100;
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 { 1 }
fn default_per_page() -> i64 { 20 }

impl PaginationParams {
    pub fn offset(&self) -> i64 {
        (self.page.clamp(1, MAX_PAGE) - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, MAX_PER_PAGE)
    }

    /// Slices an already ordered list the same way a LIMIT/OFFSET query would.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit() as usize)
            .collect()
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1, per_page: 20 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_page_is_clamped() {
        let params = PaginationParams { page: 1, per_page: 10_000 };
        assert_eq!(params.limit(), MAX_PER_PAGE);

        let params = PaginationParams { page: 1, per_page: 0 };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn page_zero_behaves_like_first_page() {
        let params = PaginationParams { page: 0, per_page: 20 };
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn huge_page_stays_a_valid_offset() {
        let params = PaginationParams { page: i64::MAX, per_page: MAX_PER_PAGE };
        assert_eq!(params.offset(), (MAX_PAGE - 1) * MAX_PER_PAGE);
        assert!(params.apply((1..=10).collect::<Vec<i32>>()).is_empty());
    }

    #[test]
    fn apply_slices_like_limit_offset() {
        let params = PaginationParams { page: 2, per_page: 3 };
        assert_eq!(params.apply((1..=10).collect()), vec![4, 5, 6]);
    }
}
