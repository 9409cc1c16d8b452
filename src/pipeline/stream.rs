//! Async pipeline over a suspend-capable source.

use std::future;
use std::pin::Pin;

use futures::{Future, Stream, StreamExt};

use crate::outcome::{Outcome, Presence};

/// Boxed element source for an [`AsyncPipeline`].
pub type PipelineStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

/// A single-pass, in-order streaming pipeline.
///
/// Transformers run one element at a time and output order matches input
/// order; there is no parallel fan-out and never more than one in-flight
/// element. If the consumer stops pulling, the source is not polled again;
/// cleanup is the source's responsibility via scoped acquisition.
pub struct AsyncPipeline<T> {
    inner: PipelineStream<T>,
}

impl<T: Send + 'static> AsyncPipeline<T> {
    pub fn new<S>(source: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
    {
        AsyncPipeline {
            inner: source.boxed(),
        }
    }

    pub fn from_iter<I>(source: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        AsyncPipeline::new(futures::stream::iter(source))
    }

    /// Pull the next element, suspending until the source yields one.
    pub async fn next(&mut self) -> Option<T> {
        self.inner.next().await
    }

    pub fn map<U, F>(self, f: F) -> AsyncPipeline<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> U + Send + 'static,
    {
        AsyncPipeline {
            inner: self.inner.map(f).boxed(),
        }
    }

    /// [`AsyncPipeline::map`] with a suspending transformer, awaited per
    /// element before the next one is pulled.
    pub fn map_async<U, F, Fut>(self, f: F) -> AsyncPipeline<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = U> + Send + 'static,
    {
        AsyncPipeline {
            inner: self.inner.then(f).boxed(),
        }
    }

    pub fn filter<F>(self, mut f: F) -> AsyncPipeline<T>
    where
        F: FnMut(&T) -> bool + Send + 'static,
    {
        AsyncPipeline {
            inner: self
                .inner
                .filter(move |item| future::ready(f(item)))
                .boxed(),
        }
    }

    pub fn filter_async<F, Fut>(self, f: F) -> AsyncPipeline<T>
    where
        F: FnMut(&T) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        AsyncPipeline {
            inner: self.inner.filter(f).boxed(),
        }
    }

    /// Map each element and drop the ones whose transformer yields `Absent`.
    pub fn filter_map<U, F>(self, mut f: F) -> AsyncPipeline<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Presence<U> + Send + 'static,
    {
        AsyncPipeline {
            inner: self
                .inner
                .filter_map(move |item| future::ready(f(item).into_option()))
                .boxed(),
        }
    }

    pub fn filter_map_async<U, F, Fut>(self, f: F) -> AsyncPipeline<U>
    where
        U: Send + 'static,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future<Output = Presence<U>> + Send + 'static,
    {
        AsyncPipeline {
            inner: self
                .inner
                .then(f)
                .filter_map(|presence| future::ready(presence.into_option()))
                .boxed(),
        }
    }

    /// Drain the pipeline into a container.
    ///
    /// Returns `Absent` when the pipeline produced no elements; a `Present`
    /// collection is never empty.
    pub async fn collect_as<C>(mut self) -> Presence<C>
    where
        C: Default + Extend<T>,
    {
        let mut collected = C::default();
        let mut count = 0usize;
        while let Some(item) = self.inner.next().await {
            collected.extend(Some(item));
            count += 1;
        }
        if count == 0 {
            Presence::Absent
        } else {
            Presence::Present(collected)
        }
    }
}

impl<T, E> AsyncPipeline<Outcome<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Drain a pipeline of outcomes, failing the whole collection with the
    /// first `Failure` encountered and discarding partial results. No further
    /// elements are pulled from the source after a failure.
    pub async fn unwrap_as<C>(mut self) -> Outcome<C, E>
    where
        C: Default + Extend<T>,
    {
        let mut collected = C::default();
        while let Some(item) = self.inner.next().await {
            match item {
                Outcome::Success(value) => collected.extend(Some(value)),
                Outcome::Failure(err) => return Outcome::Failure(err),
            }
        }
        Outcome::Success(collected)
    }
}
