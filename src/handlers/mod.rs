// Lifeboard/backend-api/src/handlers/mod.rs
pub mod diet_handlers;
pub mod export_handlers;
pub mod meal_progress_handlers;
pub mod stats_handlers;
pub mod task_handlers;
pub mod transaction_handlers;
pub mod user_handlers;

const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;

/// `(page, per_page, offset)` with page >= 1 and per_page clamped to 1..=100.
pub(crate) fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let per_page = per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);
    (page, per_page, (page - 1).saturating_mul(per_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_bounds_defaults_and_clamps() {
        assert_eq!(page_bounds(None, None), (1, 10, 0));
        assert_eq!(page_bounds(Some(3), Some(20)), (3, 20, 40));
        assert_eq!(page_bounds(Some(0), Some(1000)), (1, 100, 0));
        assert_eq!(page_bounds(Some(-4), Some(0)), (1, 1, 0));
    }

    #[test]
    fn page_bounds_saturates_huge_pages() {
        assert_eq!(
            page_bounds(Some(i64::MAX), Some(100)),
            (i64::MAX, 100, i64::MAX)
        );
    }
}
