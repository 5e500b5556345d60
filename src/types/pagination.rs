use serde::{Deserialize, Serialize};

/// View-model for the page-link controls of a listing page.
///
/// The window is three pages wide on each side of the current page. An
/// ellipsis flag is set only when the corresponding window does not already
/// touch the first (or last) page, so the controls never render "..." next
/// to an adjacent page number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub current: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<i64>,
    pub pages_left: Vec<i64>,
    pub pages_right: Vec<i64>,
    pub left_ellipsis: bool,
    pub right_ellipsis: bool,
}

impl Pagination {
    /// Computes the window for `current` out of `total` pages.
    ///
    /// Returns `None` when there are no pages at all: an empty catalog
    /// renders no paging controls, which is not an error.
    pub fn window(current: i64, total: i64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        let mut lower = current - 3;
        let mut upper = current + 3;
        let left_ellipsis = current - 3 > 2;
        if !left_ellipsis {
            lower = 1;
        }
        let right_ellipsis = current + 3 < total - 1;
        if !right_ellipsis {
            upper = total;
        }
        Some(Self {
            total,
            current,
            previous: (current > 1).then(|| current - 1),
            next: (current < total).then(|| current + 1),
            pages_left: (lower..current).collect(),
            pages_right: (current + 1..=upper).collect(),
            left_ellipsis,
            right_ellipsis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_catalog_has_no_window() {
        assert_eq!(Pagination::window(1, 0), None);
    }

    #[test]
    fn middle_page_gets_both_windows_and_ellipses() {
        let p = Pagination::window(7, 12).unwrap();
        assert_eq!(p.previous, Some(6));
        assert_eq!(p.next, Some(8));
        assert_eq!(p.pages_left, vec![4, 5, 6]);
        assert_eq!(p.pages_right, vec![8, 9, 10]);
        assert!(p.left_ellipsis);
        assert!(p.right_ellipsis);
    }

    #[test]
    fn first_page_of_three() {
        let p = Pagination::window(1, 3).unwrap();
        assert_eq!(p.previous, None);
        assert_eq!(p.next, Some(2));
        assert!(p.pages_left.is_empty());
        assert_eq!(p.pages_right, vec![2, 3]);
        assert!(!p.left_ellipsis);
        assert!(!p.right_ellipsis);
    }

    #[test]
    fn last_page_has_no_next() {
        let p = Pagination::window(5, 5).unwrap();
        assert_eq!(p.previous, Some(4));
        assert_eq!(p.next, None);
        // current-3 == 2 is not > 2, so the left window is widened to
        // start at page 1 instead of showing an ellipsis.
        assert_eq!(p.pages_left, vec![1, 2, 3, 4]);
        assert!(!p.left_ellipsis);
        assert!(p.pages_right.is_empty());
        assert!(!p.right_ellipsis);
    }

    #[test]
    fn single_page_has_no_links() {
        let p = Pagination::window(1, 1).unwrap();
        assert_eq!(p.previous, None);
        assert_eq!(p.next, None);
        assert!(p.pages_left.is_empty());
        assert!(p.pages_right.is_empty());
        assert!(!p.left_ellipsis);
        assert!(!p.right_ellipsis);
    }

    #[test]
    fn window_never_touches_ellipsis_boundary() {
        // current-3 == 2 means page 2 is in the left window, so no "..."
        // is needed between it and page 1.
        let p = Pagination::window(5, 20).unwrap();
        assert!(!p.left_ellipsis);
        assert_eq!(p.pages_left, vec![1, 2, 3, 4]);
        // current+3 == total-1 leaves only the last page outside, which the
        // window absorbs instead of eliding.
        let p = Pagination::window(16, 20).unwrap();
        assert!(!p.right_ellipsis);
        assert_eq!(p.pages_right, vec![17, 18, 19, 20]);
    }

    #[test]
    fn serialization_omits_absent_links() {
        let p = Pagination::window(1, 1).unwrap();
        let v = serde_json::to_value(&p).unwrap();
        assert!(v.get("previous").is_none());
        assert!(v.get("next").is_none());
        assert_eq!(v["current"], 1);
    }
}
