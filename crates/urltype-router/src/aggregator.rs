//! Aggregation of every typed parameter of a transition.
//!
//! [`TransitionAggregator::resolve_all`] starts one resolution per parameter,
//! in declaration order, and polls them together on the calling task. The
//! result is either the complete [`ResolvedParameterSet`] or the first failure
//! by completion order. Partial results are never exposed.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;

use urltype_core::{UrlTypeError, UrlTypeResult};

use crate::resolver::ParamDecoder;
use crate::transition::{TransitionId, TransitionTracker};

/// One typed parameter occurrence to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedParam {
    /// The parameter name.
    pub name: String,
    /// The declared type name.
    pub type_name: String,
    /// The raw segment taken from the URL.
    pub raw: String,
}

impl TypedParam {
    /// Creates a parameter occurrence.
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            raw: raw.into(),
        }
    }
}

/// Completion state of a [`PendingResolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Still waiting on the type's resolve.
    Pending,
    /// Produced a value.
    Resolved,
    /// Produced an error.
    Failed,
}

/// One outstanding resolution, owned by a single aggregation.
///
/// Completes with the parameter name and its result. Once complete it stays
/// pending if polled again.
pub struct PendingResolution {
    param: String,
    future: BoxFuture<'static, UrlTypeResult<Value>>,
    state: ResolutionState,
}

impl PendingResolution {
    /// Wraps the future resolving `param`.
    pub fn new(param: impl Into<String>, future: BoxFuture<'static, UrlTypeResult<Value>>) -> Self {
        Self {
            param: param.into(),
            future,
            state: ResolutionState::Pending,
        }
    }

    /// Returns the parameter name.
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Returns the completion state.
    pub const fn state(&self) -> ResolutionState {
        self.state
    }
}

impl fmt::Debug for PendingResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResolution")
            .field("param", &self.param)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Future for PendingResolution {
    type Output = (String, UrlTypeResult<Value>);

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.state != ResolutionState::Pending {
            return Poll::Pending;
        }
        match self.future.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                self.state = if result.is_ok() {
                    ResolutionState::Resolved
                } else {
                    ResolutionState::Failed
                };
                Poll::Ready((self.param.clone(), result))
            }
        }
    }
}

/// The resolved values of one transition, keyed by parameter name.
///
/// Values are shared (`Arc`) so every consumer of the set sees the very same
/// value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParameterSet {
    transition: Option<TransitionId>,
    values: HashMap<String, Arc<Value>>,
}

impl ResolvedParameterSet {
    /// Returns the transition these values belong to.
    pub const fn transition(&self) -> Option<TransitionId> {
        self.transition
    }

    /// Returns the value for a parameter.
    pub fn get(&self, name: &str) -> Option<&Arc<Value>> {
        self.values.get(name)
    }

    /// Returns `true` if a value exists for the parameter.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Value>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of resolved parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no resolved parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consumes the set, returning the underlying map.
    pub fn into_inner(self) -> HashMap<String, Arc<Value>> {
        self.values
    }
}

/// Resolves all typed parameters of a transition together.
#[derive(Clone)]
pub struct TransitionAggregator {
    decoder: Arc<dyn ParamDecoder>,
    tracker: Arc<TransitionTracker>,
}

impl fmt::Debug for TransitionAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionAggregator")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

impl TransitionAggregator {
    /// Creates an aggregator decoding through `decoder`.
    ///
    /// `tracker` decides whether a transition is still current when its
    /// resolutions settle.
    pub fn new(decoder: Arc<dyn ParamDecoder>, tracker: Arc<TransitionTracker>) -> Self {
        Self { decoder, tracker }
    }

    /// Returns the transition tracker.
    pub const fn tracker(&self) -> &Arc<TransitionTracker> {
        &self.tracker
    }

    /// Resolves every parameter of transition `token`.
    ///
    /// Resolutions start in the order of `params` and run interleaved; none
    /// waits for another. On success the complete set is returned. Otherwise:
    ///
    /// - [`UrlTypeError::TransitionResolution`] wraps the first failure by
    ///   completion order; the remaining resolutions are dropped unfinished
    /// - [`UrlTypeError::TransitionSuperseded`] if another transition started
    ///   before this one settled
    pub async fn resolve_all(
        &self,
        token: TransitionId,
        params: Vec<TypedParam>,
    ) -> UrlTypeResult<ResolvedParameterSet> {
        let total = params.len();
        let mut pending: FuturesUnordered<PendingResolution> = params
            .into_iter()
            .map(|p| {
                let future = self.decoder.decode(&p.name, &p.type_name, &p.raw, token);
                PendingResolution::new(p.name, future)
            })
            .collect();

        let mut values = HashMap::with_capacity(total);
        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(value) => {
                    tracing::trace!(transition = %token, param = %name, "parameter resolved");
                    values.insert(name, Arc::new(value));
                }
                Err(e) => {
                    let abandoned = pending.len();
                    drop(pending);
                    if !self.tracker.is_current(token) {
                        tracing::debug!(transition = %token, "discarding failure of superseded transition");
                        return Err(UrlTypeError::TransitionSuperseded(token.get()));
                    }
                    tracing::warn!(
                        transition = %token,
                        param = %name,
                        abandoned,
                        error = %e,
                        "parameter resolution failed"
                    );
                    return Err(UrlTypeError::TransitionResolution {
                        transition: token.get(),
                        source: Box::new(e),
                    });
                }
            }
        }

        if !self.tracker.is_current(token) {
            tracing::debug!(transition = %token, resolved = values.len(), "discarding results of superseded transition");
            return Err(UrlTypeError::TransitionSuperseded(token.get()));
        }

        tracing::debug!(transition = %token, resolved = values.len(), "all parameters resolved");
        Ok(ResolvedParameterSet {
            transition: Some(token),
            values,
        })
    }
}
