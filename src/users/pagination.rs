use std::ops::RangeInclusive;

use serde::Serialize;

pub const PER_PAGE: i64 = 10;
/// Page buttons shown on each side of the current page.
pub const WINDOW: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn new(page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: PER_PAGE,
        }
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

pub fn last_page(total: i64, per_page: i64) -> i64 {
    ((total + per_page - 1) / per_page).max(1)
}

/// Page numbers rendered as buttons around `current`. Empty when `current`
/// is more than `WINDOW` pages past `last`.
pub fn window(current: i64, last: i64) -> RangeInclusive<i64> {
    (current - WINDOW).max(1)..=current.saturating_add(WINDOW).min(last)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub current_page: i64,
    pub data: Vec<T>,
    pub first_page_url: String,
    pub from: Option<i64>,
    pub last_page: i64,
    pub last_page_url: String,
    pub links: Vec<PageLink>,
    pub next_page_url: Option<String>,
    pub path: String,
    pub per_page: i64,
    pub prev_page_url: Option<String>,
    pub to: Option<i64>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: i64, req: PageRequest, path: &str) -> Self {
        let url = |n: i64| format!("{}?page={}", path, n);
        let current = req.page;
        let last = last_page(total, req.per_page);

        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = req.offset() + 1;
            (Some(first), Some(first + data.len() as i64 - 1))
        };
        let prev_page_url = (current > 1).then(|| url(current - 1));
        let next_page_url = (current < last).then(|| url(current + 1));

        let mut links = Vec::with_capacity((2 * WINDOW + 3) as usize);
        links.push(PageLink {
            url: prev_page_url.clone(),
            label: "« Previous".into(),
            active: false,
        });
        for n in window(current, last) {
            links.push(PageLink {
                url: Some(url(n)),
                label: n.to_string(),
                active: n == current,
            });
        }
        links.push(PageLink {
            url: next_page_url.clone(),
            label: "Next »".into(),
            active: false,
        });

        Self {
            current_page: current,
            data,
            first_page_url: url(1),
            from,
            last_page: last,
            last_page_url: url(last),
            links,
            next_page_url,
            path: path.to_string(),
            per_page: req.per_page,
            prev_page_url,
            to,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(page: &Page<i64>) -> Vec<&str> {
        page.links.iter().map(|l| l.label.as_str()).collect()
    }

    #[test]
    fn last_page_rounds_up_and_is_at_least_one() {
        assert_eq!(last_page(0, 10), 1);
        assert_eq!(last_page(10, 10), 1);
        assert_eq!(last_page(11, 10), 2);
        assert_eq!(last_page(25, 10), 3);
    }

    #[test]
    fn window_is_clamped_to_existing_pages() {
        assert_eq!(window(1, 3), 1..=3);
        assert_eq!(window(5, 10), 3..=7);
        assert_eq!(window(10, 10), 8..=10);
        assert!(window(9, 3).is_empty());
    }

    #[test]
    fn middle_page_metadata() {
        let data: Vec<i64> = (11..=20).collect();
        let page = Page::new(data, 25, PageRequest::new(2), "/api/users");
        assert_eq!(page.from, Some(11));
        assert_eq!(page.to, Some(20));
        assert_eq!(page.last_page, 3);
        assert_eq!(page.prev_page_url.as_deref(), Some("/api/users?page=1"));
        assert_eq!(page.next_page_url.as_deref(), Some("/api/users?page=3"));
        assert_eq!(labels(&page), ["« Previous", "1", "2", "3", "Next »"]);
        assert!(page.links[2].active);
    }

    #[test]
    fn last_page_is_partial() {
        let page = Page::new(vec![21, 22, 23, 24, 25], 25, PageRequest::new(3), "/api/users");
        assert_eq!((page.from, page.to), (Some(21), Some(25)));
        assert_eq!(page.next_page_url, None);
        assert_eq!(page.links.last().and_then(|l| l.url.clone()), None);
    }

    #[test]
    fn page_past_the_end_keeps_shape() {
        let page: Page<i64> = Page::new(vec![], 25, PageRequest::new(4), "/api/users");
        assert_eq!(page.current_page, 4);
        assert_eq!(page.last_page, 3);
        assert_eq!((page.from, page.to), (None, None));
        assert_eq!(page.next_page_url, None);
        assert_eq!(page.last_page_url, "/api/users?page=3");
    }

    #[test]
    fn offset_does_not_overflow() {
        let req = PageRequest::new(i64::MAX);
        assert_eq!(req.offset(), i64::MAX);
        assert_eq!(PageRequest::new(0).offset(), 0);
    }
}
