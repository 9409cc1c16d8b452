//! Lazy pipeline over an in-memory sequence.

use futures::stream;

use crate::outcome::Presence;
use crate::pipeline::AsyncPipeline;

/// A lazy, single-pass transformation chain over an iterator.
///
/// Element-level failures are expressed through [`Presence`] (or
/// [`Outcome`](crate::outcome::Outcome)) return values; [`Pipeline::filter_map`]
/// is the idiomatic way to drop failed elements and keep going.
pub struct Pipeline<I> {
    iter: I,
}

impl<I: Iterator> Pipeline<I> {
    pub fn new<S>(source: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Pipeline {
            iter: source.into_iter(),
        }
    }

    pub fn map<U, F>(self, f: F) -> Pipeline<impl Iterator<Item = U>>
    where
        F: FnMut(I::Item) -> U,
    {
        Pipeline {
            iter: self.iter.map(f),
        }
    }

    pub fn filter<F>(self, f: F) -> Pipeline<impl Iterator<Item = I::Item>>
    where
        F: FnMut(&I::Item) -> bool,
    {
        Pipeline {
            iter: self.iter.filter(f),
        }
    }

    /// Map each element and drop the ones whose transformer yields `Absent`.
    pub fn filter_map<U, F>(self, mut f: F) -> Pipeline<impl Iterator<Item = U>>
    where
        F: FnMut(I::Item) -> Presence<U>,
    {
        Pipeline {
            iter: self.iter.filter_map(move |item| f(item).into_option()),
        }
    }

    /// Drain the pipeline into a container.
    ///
    /// Returns `Absent` when the pipeline produced no elements; a `Present`
    /// collection is never empty.
    pub fn collect_as<C>(self) -> Presence<C>
    where
        C: Default + Extend<I::Item>,
    {
        let mut collected = C::default();
        let mut count = 0usize;
        for item in self.iter {
            collected.extend(Some(item));
            count += 1;
        }
        if count == 0 {
            Presence::Absent
        } else {
            Presence::Present(collected)
        }
    }

    /// Lift into an [`AsyncPipeline`] over the same elements.
    pub fn into_async(self) -> AsyncPipeline<I::Item>
    where
        I: Send + 'static,
        I::Item: Send,
    {
        AsyncPipeline::new(stream::iter(self.iter))
    }
}

impl<I: Iterator> IntoIterator for Pipeline<I> {
    type Item = I::Item;
    type IntoIter = I;

    fn into_iter(self) -> I {
        self.iter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn construction_does_no_work() {
        let calls = Cell::new(0);
        let pipeline = Pipeline::new(vec![1, 2, 3]).map(|n| {
            calls.set(calls.get() + 1);
            n * 2
        });
        assert_eq!(calls.get(), 0);

        let doubled: Presence<Vec<i32>> = pipeline.collect_as();
        assert_eq!(doubled, Presence::Present(vec![2, 4, 6]));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn filter_map_drops_absent_elements() {
        let collected: Presence<Vec<i32>> = Pipeline::new(vec![1, 2, 3, 4])
            .filter_map(|n| {
                if n % 2 == 0 {
                    Presence::Present(n * 10)
                } else {
                    Presence::Absent
                }
            })
            .collect_as();
        assert_eq!(collected, Presence::Present(vec![20, 40]));
    }

    #[test]
    fn collect_as_never_yields_empty_present() {
        let none: Presence<Vec<i32>> = Pipeline::new(Vec::<i32>::new()).collect_as();
        assert_eq!(none, Presence::Absent);

        let filtered: Presence<Vec<i32>> = Pipeline::new(vec![1, 3])
            .filter(|n| n % 2 == 0)
            .collect_as();
        assert_eq!(filtered, Presence::Absent);
    }

    #[tokio::test]
    async fn into_async_lifts_the_remaining_elements() {
        let collected: Presence<Vec<i32>> = Pipeline::new(vec![1, 2, 3])
            .map(|n| n + 1)
            .into_async()
            .collect_as()
            .await;
        assert_eq!(collected, Presence::Present(vec![2, 3, 4]));
    }

    #[test]
    fn combinators_compose_in_one_pass() {
        let collected: Presence<Vec<String>> = Pipeline::new(vec![1, 2, 3, 4, 5])
            .filter(|n| *n > 1)
            .map(|n| n * n)
            .filter_map(|n| {
                if n < 20 {
                    Presence::Present(n.to_string())
                } else {
                    Presence::Absent
                }
            })
            .collect_as();
        assert_eq!(
            collected,
            Presence::Present(vec!["4".to_string(), "9".to_string(), "16".to_string()])
        );
    }
}
