use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::HandlerError;
use crate::server::{Request, Response};

/// What a handler unit tells the executor once it has finished
#[derive(Debug)]
#[must_use]
pub enum Next {
    /// Proceed to the next unit in the chain
    Continue,
    /// Abort the chain; the error is rendered by [`Response::send_error`]
    Error(HandlerError),
    /// The unit wrote a terminal response; no further units run
    Done,
}

impl From<HandlerError> for Next {
    fn from(err: HandlerError) -> Self {
        Next::Error(err)
    }
}

impl From<Result<(), HandlerError>> for Next {
    fn from(result: Result<(), HandlerError>) -> Self {
        match result {
            Ok(()) => Next::Continue,
            Err(err) => Next::Error(err),
        }
    }
}

/// One step of request processing
///
/// A unit receives the request context and the response sink and resolves to
/// exactly one [`Next`]. Units may await freely; suspension of one request's
/// chain never blocks another's.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response) -> BoxFuture<'a, Next>;

    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a handler unit
pub type HandlerUnit = Arc<dyn Handler>;

struct FnHandler<F> {
    f: F,
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Next>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response) -> BoxFuture<'a, Next> {
        (self.f)(req, res)
    }

    fn name(&self) -> &str {
        "handler_fn"
    }
}

struct SyncFnHandler<F> {
    f: F,
}

impl<F> Handler for SyncFnHandler<F>
where
    F: Fn(&mut Request, &mut Response) -> Next + Send + Sync + 'static,
{
    fn call<'a>(&'a self, req: &'a mut Request, res: &'a mut Response) -> BoxFuture<'a, Next> {
        let next = (self.f)(req, res);
        Box::pin(futures::future::ready(next))
    }

    fn name(&self) -> &str {
        "sync_handler_fn"
    }
}

/// Build an async handler unit from a closure
///
/// ```rust
/// use chainrouter::{handler, Next};
/// use http::StatusCode;
/// use serde_json::json;
///
/// let unit = handler(|req, res| {
///     Box::pin(async move {
///         let id = req.param("id").unwrap_or_default().to_string();
///         res.send(StatusCode::OK, &json!({ "id": id }))
///     })
/// });
/// # let _ = unit;
/// ```
pub fn handler<F>(f: F) -> HandlerUnit
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response) -> BoxFuture<'a, Next>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FnHandler { f })
}

/// Build a handler unit from a closure that never suspends
pub fn sync_handler<F>(f: F) -> HandlerUnit
where
    F: Fn(&mut Request, &mut Response) -> Next + Send + Sync + 'static,
{
    Arc::new(SyncFnHandler { f })
}

/// Ordered, flat sequence of handler units
///
/// Nested groups are flattened on conversion, preserving relative order:
///
/// ```rust
/// use chainrouter::{sync_handler, Chain, Next};
///
/// let a = sync_handler(|_, _| Next::Continue);
/// let b = sync_handler(|_, _| Next::Continue);
/// let c = sync_handler(|_, res| res.send_status(http::StatusCode::NO_CONTENT));
/// let chain = Chain::from(vec![Chain::from(vec![a, b]), Chain::from(c)]);
/// assert_eq!(chain.len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct Chain {
    units: Vec<HandlerUnit>,
}

impl Chain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a unit, builder style
    #[must_use]
    pub fn then(mut self, unit: HandlerUnit) -> Self {
        self.units.push(unit);
        self
    }

    /// Append every unit of another chain (or group)
    pub fn extend(&mut self, other: impl Into<Chain>) {
        self.units.extend(other.into().units);
    }

    /// `self` followed by `other`, leaving both untouched
    #[must_use]
    pub fn concat(&self, other: &Chain) -> Chain {
        let mut units = Vec::with_capacity(self.units.len() + other.units.len());
        units.extend(self.units.iter().cloned());
        units.extend(other.units.iter().cloned());
        Chain { units }
    }

    #[must_use]
    pub fn units(&self) -> &[HandlerUnit] {
        &self.units
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.units.iter().map(|u| u.name()))
            .finish()
    }
}

impl From<HandlerUnit> for Chain {
    fn from(unit: HandlerUnit) -> Self {
        Chain { units: vec![unit] }
    }
}

impl<T: Into<Chain>> From<Vec<T>> for Chain {
    fn from(groups: Vec<T>) -> Self {
        let mut chain = Chain::new();
        for group in groups {
            chain.extend(group);
        }
        chain
    }
}

impl<T: Into<Chain>, const N: usize> From<[T; N]> for Chain {
    fn from(groups: [T; N]) -> Self {
        let mut chain = Chain::new();
        for group in groups {
            chain.extend(group);
        }
        chain
    }
}
