//! Lazy, single-pass sequences of shrink candidates.

use std::fmt;

/// A pull-based, possibly infinite sequence.
///
/// A stream is consumed once; every combinator takes it by value and returns
/// a new stream without evaluating anything up front.
pub struct Stream<T> {
    iter: Box<dyn Iterator<Item = T>>,
}

impl<T: 'static> Stream<T> {
    /// Wrap any iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = T> + 'static,
    {
        Stream {
            iter: Box::new(iter),
        }
    }

    /// The empty stream.
    pub fn nil() -> Self {
        Stream::new(std::iter::empty())
    }

    /// A stream over the given items.
    pub fn of<I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Stream::new(items.into_iter())
    }

    /// Defer building a stream until its first element is pulled.
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnOnce() -> Stream<T> + 'static,
    {
        Stream::new(std::iter::once_with(f).flatten())
    }

    pub fn map<U, F>(self, f: F) -> Stream<U>
    where
        F: FnMut(T) -> U + 'static,
        U: 'static,
    {
        Stream::new(self.iter.map(f))
    }

    pub fn filter<F>(self, predicate: F) -> Stream<T>
    where
        F: FnMut(&T) -> bool + 'static,
    {
        Stream::new(self.iter.filter(predicate))
    }

    pub fn flat_map<U, F>(self, f: F) -> Stream<U>
    where
        F: FnMut(T) -> Stream<U> + 'static,
        U: 'static,
    {
        Stream::new(self.iter.flat_map(f))
    }

    /// Concatenate `other` after this stream.
    pub fn join(self, other: Stream<T>) -> Stream<T> {
        Stream::new(self.iter.chain(other.iter))
    }

    /// Keep at most `n` elements.
    pub fn take(self, n: usize) -> Stream<T> {
        Stream::new(self.iter.take(n))
    }

    /// Skip the first `n` elements.
    pub fn drop(self, n: usize) -> Stream<T> {
        Stream::new(self.iter.skip(n))
    }
}

impl<T> Iterator for Stream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.iter.next()
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Stream(..)")
    }
}
