use http::StatusCode;
use tracing::{debug, warn};

use crate::middleware::{HandlerUnit, Next};
use crate::server::{Request, Response};

/// How a chain run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// A unit wrote the terminal response
    Completed { index: usize },
    /// A unit signalled an error; it has been rendered to the response
    Failed { index: usize, status: StatusCode },
    /// Every unit continued and none wrote a response
    Exhausted,
    /// A unit reported [`Next::Done`] without writing a response
    Stalled { index: usize },
    /// The transport aborted the request before the unit at `index` ran
    Aborted { index: usize },
}

impl ChainOutcome {
    /// Whether the response has been produced (successfully or as an error)
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChainOutcome::Completed { .. } | ChainOutcome::Failed { .. })
    }
}

/// Run `units` in order against one request
///
/// Each unit gets the request context and the response sink and must resolve
/// to exactly one [`Next`]:
///
/// - [`Next::Continue`] proceeds, unless the unit already wrote a response
/// - [`Next::Error`] aborts the rest of the chain and renders the error via
///   [`Response::send_error`]
/// - [`Next::Done`] aborts the rest of the chain
///
/// A response written by a unit always ends the chain, whatever it returned.
pub async fn execute(
    units: &[HandlerUnit],
    req: &mut Request,
    res: &mut Response,
) -> ChainOutcome {
    for (index, unit) in units.iter().enumerate() {
        if req.is_aborted() {
            debug!(index, unit = unit.name(), "Request aborted, chain stopped");
            return ChainOutcome::Aborted { index };
        }
        if res.is_sent() {
            return ChainOutcome::Completed { index };
        }

        match unit.call(req, res).await {
            Next::Continue => {
                if res.is_sent() {
                    return ChainOutcome::Completed { index };
                }
            }
            Next::Error(err) => {
                let status = err.status();
                if status.is_server_error() {
                    warn!(index, unit = unit.name(), error = %err, "Handler chain failed");
                } else {
                    debug!(index, unit = unit.name(), error = %err, "Handler chain aborted");
                }
                let _ = res.send_error(&err);
                return ChainOutcome::Failed { index, status };
            }
            Next::Done => {
                return if res.is_sent() {
                    ChainOutcome::Completed { index }
                } else {
                    ChainOutcome::Stalled { index }
                };
            }
        }
    }
    ChainOutcome::Exhausted
}
