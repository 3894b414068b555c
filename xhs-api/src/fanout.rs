//! Concurrent fan-out over independent API calls.
//!
//! Two policies over a homogeneous group of futures:
//!
//! - [`join_all`]: fail fast; the first error drops the remaining futures
//! - [`join_settled`]: every future runs to completion and reports its own
//!   result
//!
//! For heterogeneous groups see
//! [`AsyncXhsClient::snapshot`](crate::AsyncXhsClient::snapshot).

use crate::error::Result;
use std::future::Future;

/// How a fan-out treats a failing member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanOut {
    /// Abort the group on the first error and return it.
    FailFast,
    /// Run everything and keep one result per member.
    #[default]
    Partial,
}

/// Run all futures concurrently; return every value or the first error.
pub async fn join_all<I, F, T>(tasks: I) -> Result<Vec<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    futures::future::try_join_all(tasks).await
}

/// Run all futures concurrently; return one result per future, in order.
pub async fn join_settled<I, F, T>(tasks: I) -> Vec<Result<T>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T>>,
{
    futures::future::join_all(tasks).await
}
