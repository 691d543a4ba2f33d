//! Sample URL types.
//!
//! [`SyncTestType`] and [`AsyncTestType`] resolve any numeric segment to a
//! fixed record and represent records by their `pk`. [`FailingType`] always
//! fails asynchronously, and [`GatedType`] completes only when the test
//! releases the matching gate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::oneshot;

use urltype_core::{UrlTypeError, UrlTypeResult};
use urltype_router::{Resolution, ResolveContext, UrlType};

fn represent_pk(type_name: &str, value: &Value) -> UrlTypeResult<String> {
    match value.get("pk") {
        Some(Value::String(pk)) => Ok(pk.clone()),
        Some(pk @ Value::Number(_)) => Ok(pk.to_string()),
        _ => Err(UrlTypeError::Representation {
            type_name: type_name.to_string(),
            message: format!("expected an object with a pk, got {value}"),
        }),
    }
}

/// Resolves immediately to `{pk: 1, attr1: "sync-value1", attr2: "sync-value2"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncTestType;

impl UrlType for SyncTestType {
    fn name(&self) -> &str {
        "SyncTest"
    }

    fn pattern(&self) -> &str {
        r"\d+"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, _raw: &str, _ctx: &ResolveContext) -> Resolution {
        Resolution::ready(json!({
            "pk": 1,
            "attr1": "sync-value1",
            "attr2": "sync-value2",
        }))
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        represent_pk(self.name(), value)
    }
}

/// Resolves after a timer tick to `{pk: 1, attr1: "async-value1", attr2: "async-value2"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncTestType;

impl UrlType for AsyncTestType {
    fn name(&self) -> &str {
        "AsyncTest"
    }

    fn pattern(&self) -> &str {
        r"\d+"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, _raw: &str, _ctx: &ResolveContext) -> Resolution {
        Resolution::pending(async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(json!({
                "pk": 1,
                "attr1": "async-value1",
                "attr2": "async-value2",
            }))
        })
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        represent_pk(self.name(), value)
    }
}

/// Fails every resolve after yielding once.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingType;

impl UrlType for FailingType {
    fn name(&self) -> &str {
        "Failing"
    }

    fn pattern(&self) -> &str {
        r"\d+"
    }

    fn resolve(&self, raw: &str, _ctx: &ResolveContext) -> Resolution {
        let raw = raw.to_string();
        Resolution::pending(async move {
            tokio::task::yield_now().await;
            Err(format!("record {raw} does not exist").into())
        })
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        represent_pk(self.name(), value)
    }
}

/// Gates held by tests to control when [`GatedType`] resolves complete.
///
/// Install a clone into the router's [`Services`](urltype_router::Services);
/// clones share their gates. A segment with no gate resolves immediately.
#[derive(Debug, Clone, Default)]
pub struct Gates {
    pending: Arc<Mutex<HashMap<String, oneshot::Receiver<Result<(), String>>>>>,
}

impl Gates {
    /// Creates an empty gate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the gate for `raw`, returning the sender that opens it.
    ///
    /// Sending `Err(message)` makes the resolve fail with that message.
    pub fn close(&self, raw: &str) -> oneshot::Sender<Result<(), String>> {
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("gates lock poisoned")
            .insert(raw.to_string(), rx);
        tx
    }

    fn take(&self, raw: &str) -> Option<oneshot::Receiver<Result<(), String>>> {
        self.pending.lock().expect("gates lock poisoned").remove(raw)
    }
}

/// Resolves to `{pk: <raw>}` once the gate for the segment opens.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatedType;

impl UrlType for GatedType {
    fn name(&self) -> &str {
        "Gated"
    }

    fn pattern(&self) -> &str {
        r"\d+"
    }

    fn bindable(&self) -> bool {
        true
    }

    fn resolve(&self, raw: &str, ctx: &ResolveContext) -> Resolution {
        let value = json!({ "pk": raw });
        let Some(gate) = ctx.services.get::<Gates>().and_then(|g| g.take(raw)) else {
            return Resolution::ready(value);
        };
        Resolution::pending(async move {
            match gate.await {
                Ok(Ok(())) => Ok(value),
                Ok(Err(message)) => Err(message.into()),
                Err(_) => Err("gate dropped".into()),
            }
        })
    }

    fn represent(&self, value: &Value) -> UrlTypeResult<String> {
        represent_pk(self.name(), value)
    }
}
