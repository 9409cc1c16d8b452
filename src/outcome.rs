//! Success/failure and presence/absence algebra.
//!
//! Core operations never signal expected conditions by panicking or by
//! papering over errors with sentinel values; they return [`Outcome`] (did
//! the operation work?) or [`Presence`] (was there a value?). The two are
//! distinct on purpose: an absent record is a perfectly good answer, not a
//! failure.
//!
//! Raw errors from collaborator libraries enter the algebra through exactly
//! one door: [`Outcome::lift`] / [`Outcome::lift_future`], which convert a
//! `Result` via the [`Classify`] boundary. Kinds the failure type declares as
//! expected become ordinary `Failure`s; everything else is wrapped by
//! [`Classify::unexpected`] and treated as fatal by callers.

use std::future::Future;

/// Result of an operation that can fail in an expected way.
///
/// A chain of `map`/`chain` calls short-circuits on the first `Failure`;
/// nothing downstream runs.
#[must_use = "an Outcome carries a possible failure that must be handled"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T, E> {
    Success(T),
    Failure(E),
}

/// A value that may legitimately be absent.
#[must_use = "a Presence may be Absent and must be inspected"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence<T> {
    Present(T),
    Absent,
}

/// Boundary conversion from a raw library error into a closed failure set.
///
/// `expected` maps the kinds the caller has declared; returning the raw error
/// back marks it as outside the set, and `unexpected` then wraps it as fatal.
/// Implementations must never silently absorb an unrecognized kind.
pub trait Classify<Raw>: Sized {
    fn expected(raw: Raw) -> Result<Self, Raw>;
    fn unexpected(raw: Raw) -> Self;

    fn classify(raw: Raw) -> Self {
        match Self::expected(raw) {
            Ok(err) => err,
            Err(raw) => Self::unexpected(raw),
        }
    }
}

impl<T, E> Outcome<T, E> {
    /// Lift a fallible computation into the algebra, classifying its error.
    pub fn lift<Raw, F>(op: F) -> Self
    where
        F: FnOnce() -> Result<T, Raw>,
        E: Classify<Raw>,
    {
        match op() {
            Ok(value) => Outcome::Success(value),
            Err(raw) => Outcome::Failure(E::classify(raw)),
        }
    }

    /// Suspending variant of [`Outcome::lift`].
    pub async fn lift_future<Raw, Fut>(fut: Fut) -> Self
    where
        Fut: Future<Output = Result<T, Raw>>,
        E: Classify<Raw>,
    {
        match fut.await {
            Ok(value) => Outcome::Success(value),
            Err(raw) => Outcome::Failure(E::classify(raw)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Transform the success value; a no-op on `Failure`.
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// Transform the failure value; a no-op on `Success`.
    pub fn map_failure<F2, F>(self, f: F) -> Outcome<T, F2>
    where
        F: FnOnce(E) -> F2,
    {
        match self {
            Outcome::Success(value) => Outcome::Success(value),
            Outcome::Failure(err) => Outcome::Failure(f(err)),
        }
    }

    /// Flattening bind: feed the success value to the next fallible step.
    pub fn chain<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Outcome<U, E>,
    {
        match self {
            Outcome::Success(value) => f(value),
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    /// [`Outcome::chain`] where the next step suspends.
    pub async fn chain_async<U, Fut, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Outcome<U, E>>,
    {
        match self {
            Outcome::Success(value) => f(value).await,
            Outcome::Failure(err) => Outcome::Failure(err),
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Outcome::Success(value) => value,
            Outcome::Failure(_) => default,
        }
    }

    /// The success value as a [`Presence`], dropping any failure.
    pub fn success(self) -> Presence<T> {
        match self {
            Outcome::Success(value) => Presence::Present(value),
            Outcome::Failure(_) => Presence::Absent,
        }
    }

    /// The failure value as a [`Presence`].
    pub fn failure(self) -> Presence<E> {
        match self {
            Outcome::Success(_) => Presence::Absent,
            Outcome::Failure(err) => Presence::Present(err),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(err) => Err(err),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(value) => Outcome::Success(value),
            Err(err) => Outcome::Failure(err),
        }
    }
}

impl<T> Presence<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Presence::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    /// Transform the present value; a no-op on `Absent`.
    pub fn map<U, F>(self, f: F) -> Presence<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Presence::Present(value) => Presence::Present(f(value)),
            Presence::Absent => Presence::Absent,
        }
    }

    /// Flattening bind over presence.
    pub fn chain<U, F>(self, f: F) -> Presence<U>
    where
        F: FnOnce(T) -> Presence<U>,
    {
        match self {
            Presence::Present(value) => f(value),
            Presence::Absent => Presence::Absent,
        }
    }

    /// [`Presence::chain`] where the next step suspends.
    pub async fn chain_async<U, Fut, F>(self, f: F) -> Presence<U>
    where
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Presence<U>>,
    {
        match self {
            Presence::Present(value) => f(value).await,
            Presence::Absent => Presence::Absent,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Presence::Present(value) => value,
            Presence::Absent => default,
        }
    }

    pub fn or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or(T::default())
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Presence::Present(value) => Some(value),
            Presence::Absent => None,
        }
    }

}

impl<T> From<Option<T>> for Presence<T> {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(value) => Presence::Present(value),
            None => Presence::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Boom {
        Known(String),
        Fatal(String),
    }

    #[derive(Debug)]
    struct Raw {
        recognized: bool,
        msg: &'static str,
    }

    impl Classify<Raw> for Boom {
        fn expected(raw: Raw) -> Result<Self, Raw> {
            if raw.recognized {
                Ok(Boom::Known(raw.msg.to_string()))
            } else {
                Err(raw)
            }
        }

        fn unexpected(raw: Raw) -> Self {
            Boom::Fatal(raw.msg.to_string())
        }
    }

    #[test]
    fn map_and_chain_short_circuit_on_failure() {
        let failed: Outcome<i32, &str> = Outcome::Failure("nope");
        let mut ran = false;
        let out = failed
            .map(|n| n + 1)
            .chain(|_| {
                ran = true;
                Outcome::<i32, &str>::Success(0)
            });
        assert_eq!(out, Outcome::Failure("nope"));
        assert!(!ran);
    }

    #[test]
    fn chain_flattens() {
        let out: Outcome<i32, &str> = Outcome::Success(2).chain(|n| Outcome::Success(n * 10));
        assert_eq!(out, Outcome::Success(20));
    }

    #[tokio::test]
    async fn chain_async_runs_only_on_success() {
        let out = Outcome::<i32, &str>::Success(3)
            .chain_async(|n| async move { Outcome::Success(n + 1) })
            .await;
        assert_eq!(out, Outcome::Success(4));

        let failed = Outcome::<i32, &str>::Failure("db down")
            .chain_async(|n| async move { Outcome::Success(n + 1) })
            .await;
        assert_eq!(failed, Outcome::Failure("db down"));
    }

    #[test]
    fn lift_classifies_expected_and_fatal() {
        let known: Outcome<(), Boom> = Outcome::lift(|| {
            Err(Raw {
                recognized: true,
                msg: "timeout",
            })
        });
        assert_eq!(known, Outcome::Failure(Boom::Known("timeout".into())));

        let fatal: Outcome<(), Boom> = Outcome::lift(|| {
            Err(Raw {
                recognized: false,
                msg: "segfault",
            })
        });
        assert_eq!(fatal, Outcome::Failure(Boom::Fatal("segfault".into())));

        let fine: Outcome<i32, Boom> = Outcome::lift(|| Ok(7));
        assert_eq!(fine, Outcome::Success(7));
    }

    #[tokio::test]
    async fn lift_future_classifies() {
        let out: Outcome<i32, Boom> = Outcome::lift_future(async { Ok(1) }).await;
        assert_eq!(out, Outcome::Success(1));

        let out: Outcome<i32, Boom> = Outcome::lift_future(async {
            Err(Raw {
                recognized: true,
                msg: "busy",
            })
        })
        .await;
        assert_eq!(out, Outcome::Failure(Boom::Known("busy".into())));
    }

    #[test]
    fn presence_is_not_a_failure() {
        let absent: Presence<i32> = Presence::Absent;
        assert!(absent.is_absent());
        assert_eq!(absent.or_default(), 0);
        assert_eq!(Presence::Present(5).map(|n| n * 2), Presence::Present(10));
        assert_eq!(
            Presence::Present(5).chain(|_| Presence::<i32>::Absent),
            Presence::Absent
        );
    }

    #[test]
    fn interop_with_std_types() {
        let out: Outcome<i32, &str> = Ok::<_, &str>(1).into();
        assert_eq!(out.into_result(), Ok(1));
        assert_eq!(Presence::from(Some(2)).into_option(), Some(2));
        assert_eq!(Presence::<i32>::from(None).into_option(), None);
        assert_eq!(Outcome::<i32, &str>::Failure("x").success(), Presence::Absent);
        assert_eq!(
            Outcome::<i32, &str>::Failure("x").failure(),
            Presence::Present("x")
        );
        assert_eq!(Outcome::<i32, &str>::Success(1).failure(), Presence::Absent);
    }
}
