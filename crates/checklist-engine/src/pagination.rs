use crate::{EngineError, ValidationError};

/// A 1-indexed window over a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub number: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total: usize,
    pub items: &'a [T],
}

impl<T> Page<'_, T> {
    /// Position of `items[0]` in the paginated sequence.
    pub fn first_index(&self) -> usize {
        (self.number - 1) * self.page_size
    }
}

pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Page `page` of `seq`.
///
/// Pages run from 1 to `ceil(len / page_size)`; anything else is rejected. An
/// empty sequence still has an (empty) page 1.
pub fn paginate<T>(seq: &[T], page_size: usize, page: usize) -> Result<Page<'_, T>, EngineError> {
    if page_size == 0 {
        return Err(ValidationError::InvalidPageSize.into());
    }
    let count = page_count(seq.len(), page_size);
    if page == 0 || page > count.max(1) {
        return Err(EngineError::PageOutOfRange {
            page,
            page_count: count,
        });
    }
    Ok(window(seq, page_size, page))
}

fn window<T>(seq: &[T], page_size: usize, page: usize) -> Page<'_, T> {
    let start = ((page - 1) * page_size).min(seq.len());
    let end = (start + page_size).min(seq.len());
    Page {
        number: page,
        page_count: page_count(seq.len(), page_size),
        page_size,
        total: seq.len(),
        items: &seq[start..end],
    }
}

/// The page a table is currently showing.
///
/// Rejected navigation leaves the current page as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    current: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::InvalidPageSize);
        }
        Ok(Self {
            page_size,
            current: 1,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn go_to<'a, T>(&mut self, seq: &'a [T], page: usize) -> Result<Page<'a, T>, EngineError> {
        let shown = paginate(seq, self.page_size, page)?;
        self.current = page;
        Ok(shown)
    }

    pub fn next<'a, T>(&mut self, seq: &'a [T]) -> Result<Page<'a, T>, EngineError> {
        self.go_to(seq, self.current + 1)
    }

    pub fn previous<'a, T>(&mut self, seq: &'a [T]) -> Result<Page<'a, T>, EngineError> {
        self.go_to(seq, self.current.saturating_sub(1))
    }

    /// Back to page 1, e.g. after the filter changed.
    pub fn reset(&mut self) {
        self.current = 1;
    }

    /// The current page of `seq`, pulled back to the last page if `seq` shrank.
    pub fn show<'a, T>(&mut self, seq: &'a [T]) -> Page<'a, T> {
        let last = page_count(seq.len(), self.page_size).max(1);
        self.current = self.current.clamp(1, last);
        window(seq, self.page_size, self.current)
    }
}
