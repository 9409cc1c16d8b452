//! Single-pass transformation pipelines.
//!
//! Both pipelines are pull-based: constructing one performs no work, and only
//! one element is in flight at a time. Every combinator consumes `self`, so a
//! consumed pipeline cannot be re-driven; single-pass is a compile-time
//! guarantee, not a runtime check.

pub mod lazy;
pub mod stream;

pub use lazy::Pipeline;
pub use stream::AsyncPipeline;
