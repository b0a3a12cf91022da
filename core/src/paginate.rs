use std::fmt;
use std::ops::Deref;

/// Contiguous run of items produced by [`Paginator`].
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T>(&'a [T]);

impl<T> Clone for Page<'_, T> {
    fn clone(&self) -> Self { *self }
}

impl<T> Copy for Page<'_, T> {}

impl<T> Deref for Page<'_, T> {
    type Target = [T];
    fn deref(&self) -> &[T] { self.0 }
}

impl<T: fmt::Display> fmt::Display for Page<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.0 {
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// Lazily slices a result list into pages of `page_size` items; the last page may be shorter.
/// Clone the paginator (or call [`paginate`] again) to start over.
#[derive(Debug)]
pub struct Paginator<'a, T> {
    rest: &'a [T],
    page_size: usize,
}

impl<T> Clone for Paginator<'_, T> {
    fn clone(&self) -> Self { Self { rest: self.rest, page_size: self.page_size } }
}

impl<'a, T> Iterator for Paginator<'a, T> {
    type Item = Page<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.page_size == 0 || self.rest.is_empty() {
            return None;
        }
        let (page, rest) = self.rest.split_at(self.page_size.min(self.rest.len()));
        self.rest = rest;
        Some(Page(page))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = if self.page_size == 0 { 0 } else { self.rest.len().div_ceil(self.page_size) };
        (n, Some(n))
    }
}

impl<T> ExactSizeIterator for Paginator<'_, T> {}

pub fn paginate<T>(items: &[T], page_size: usize) -> Paginator<'_, T> {
    Paginator { rest: items, page_size }
}
