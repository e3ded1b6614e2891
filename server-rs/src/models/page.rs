use serde::Serialize;

/// One page of an in-memory listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// `page` is zero-based; both arguments are expected to be validated.
    pub fn slice(items: Vec<T>, page: i64, size: i64) -> Self {
        let total_elements = items.len();
        let per_page = usize::try_from(size.max(1)).unwrap_or(usize::MAX);
        let total_pages = total_elements.div_ceil(per_page);
        // Offsets past usize are past the end anyway.
        let offset = usize::try_from(page.max(0))
            .ok()
            .and_then(|p| p.checked_mul(per_page))
            .unwrap_or(usize::MAX);
        let content = items
            .into_iter()
            .skip(offset)
            .take(per_page)
            .collect();
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_and_counts() {
        let page = Page::slice((1..=7).collect::<Vec<_>>(), 1, 3);
        assert_eq!(page.content, vec![4, 5, 6]);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.total_pages, 3);

        let past_end = Page::slice((1..=7).collect::<Vec<_>>(), 5, 3);
        assert!(past_end.content.is_empty());
    }

    #[test]
    fn huge_page_numbers_are_empty() {
        let page = Page::slice(vec![1, 2, 3], 100_000_000_000_000_000, 200);
        assert!(page.content.is_empty());
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.total_pages, 1);

        let last = Page::slice(vec![1, 2, 3], i64::MAX, i64::MAX);
        assert!(last.content.is_empty());
    }
}
