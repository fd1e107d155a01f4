use super::sort::Sort;
use super::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};

/// Zero-based page index, positive page size and optional ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Sort,
}

impl PageRequest {
    /// # Errors
    /// `QueryError::InvalidQuery` when `size` is zero.
    pub fn of(page: u32, size: u32) -> QueryResult<Self> {
        if size == 0 {
            return Err(QueryError::InvalidQuery(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            page,
            size,
            sort: Sort::unsorted(),
        })
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    /// Request for the following page with the same size and ordering.
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
            sort: self.sort.clone(),
        }
    }
}

/// Page envelope: one slice of a result set plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    /// Zero-based index of this page.
    pub number: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            total_elements,
            total_pages: total_elements.div_ceil(u64::from(request.size)),
            number: request.page,
            size: request.size,
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number: self.number,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            PageRequest::of(0, 0),
            Err(QueryError::InvalidQuery(_))
        ));
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::of(0, 3).unwrap();
        assert_eq!(Page::<u8>::new(Vec::new(), &request, 0).total_pages, 0);
        assert_eq!(Page::<u8>::new(Vec::new(), &request, 3).total_pages, 1);
        assert_eq!(Page::<u8>::new(Vec::new(), &request, 7).total_pages, 3);
    }

    #[test]
    fn offset_and_next_follow_page_index() {
        let request = PageRequest::of(2, 25).unwrap();
        assert_eq!(request.offset(), 50);
        let next = request.next();
        assert_eq!(next.page(), 3);
        assert_eq!(next.offset(), 75);
    }

    #[test]
    fn has_next_is_false_on_last_page() {
        let first = Page::new(vec![1, 2], &PageRequest::of(0, 2).unwrap(), 3);
        assert!(first.has_next());
        let last = Page::new(vec![3], &PageRequest::of(1, 2).unwrap(), 3);
        assert!(last.is_last());
    }

    #[test]
    fn map_keeps_page_metadata() {
        let page = Page::new(vec![1, 2], &PageRequest::of(1, 2).unwrap(), 5);
        let labels = page.map(|n| format!("#{n}"));
        assert_eq!(labels.content, vec!["#1", "#2"]);
        assert_eq!(labels.total_elements, 5);
        assert_eq!(labels.total_pages, 3);
        assert_eq!(labels.number, 1);
        assert_eq!(labels.size, 2);
    }

    #[test]
    fn serializes_with_camel_case_totals() {
        let page = Page::new(vec!["a"], &PageRequest::of(0, 1).unwrap(), 4);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalElements"], 4);
        assert_eq!(json["totalPages"], 4);
        assert_eq!(json["content"][0], "a");
    }
}
