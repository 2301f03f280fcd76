/// Inclusive, 0-based span of pages owned by one bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub end: usize,
}

impl PageRange {
    pub fn contains(&self, page: usize) -> bool {
        self.start <= page && page <= self.end
    }

    pub fn page_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Turn bookmark start pages into chapter ranges.
///
/// Each range runs up to the page before the next bookmark; the last one
/// runs to the end of the document. Two bookmarks on the same page (or a
/// next bookmark that comes earlier) clamp to a single-page range. Input
/// order is taken as given.
pub fn compute_ranges(starts: &[usize], total_pages: usize) -> Vec<PageRange> {
    let last_page = total_pages.saturating_sub(1);

    starts
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = match starts.get(i + 1) {
                Some(&next) => next.saturating_sub(1),
                None => last_page,
            };
            PageRange {
                start,
                end: end.max(start),
            }
        })
        .collect()
}
