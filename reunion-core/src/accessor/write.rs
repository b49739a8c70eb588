//! Write accessors.

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::model::RequestDescriptor;
use crate::transport::ApiClient;

/// State of a write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteState<T> {
    /// Never triggered, or reset.
    Idle,
    Pending,
    Failed(ApiError),
    Succeeded(T),
}

impl<T> WriteState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Succeeded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Convert a terminal state into a `Result`; `Idle` and `Pending` give `None`.
    pub fn into_result(self) -> Option<Result<T, ApiError>> {
        match self {
            Self::Idle | Self::Pending => None,
            Self::Failed(err) => Some(Err(err)),
            Self::Succeeded(data) => Some(Ok(data)),
        }
    }
}

type SuccessFn<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorFn = Box<dyn FnOnce(&ApiError) + Send>;

/// Per-trigger callbacks.
///
/// Exactly one of them runs, once, after the accessor's state has been
/// updated to the terminal state.
pub struct Callbacks<T> {
    on_success: Option<SuccessFn<T>>,
    on_error: Option<ErrorFn>,
}

impl<T> Callbacks<T> {
    /// No callbacks.
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }

    /// Run `f` with the decoded payload when the call succeeds.
    pub fn on_success(mut self, f: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Run `f` with the error when the call fails.
    pub fn on_error(mut self, f: impl FnOnce(&ApiError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Handle on a write call site.
///
/// Starts [`WriteState::Idle`] and issues no call until
/// [`trigger`](Self::trigger). Clones share state.
pub struct WriteAccessor<Req, Resp> {
    client: ApiClient,
    descriptor: RequestDescriptor,
    state: Arc<Mutex<WriteState<Resp>>>,
    _marker: PhantomData<fn(Req)>,
}

impl<Req, Resp> WriteAccessor<Req, Resp> {
    pub(crate) fn new(client: ApiClient, descriptor: RequestDescriptor) -> Self {
        Self {
            client,
            descriptor,
            state: Arc::new(Mutex::new(WriteState::Idle)),
            _marker: PhantomData,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Return to [`WriteState::Idle`].
    pub fn reset(&self) {
        *self.state.lock() = WriteState::Idle;
    }
}

impl<Req, Resp: Clone> WriteAccessor<Req, Resp> {
    /// Current state.
    pub fn state(&self) -> WriteState<Resp> {
        self.state.lock().clone()
    }
}

impl<Req, Resp> WriteAccessor<Req, Resp>
where
    Req: Serialize,
    Resp: DeserializeOwned + Clone,
{
    /// Issue exactly one call with `payload` as the body.
    ///
    /// A payload that serializes to `null`, such as `()`, sends the body from
    /// the request config instead. Any other payload replaces the config body
    /// outright: the two are never merged, and the payload takes precedence
    /// over the config rather than the config being layered over it.
    ///
    /// Overlapping triggers are not serialized: each one moves the state to
    /// `Pending`, and the state ends up reflecting whichever call resolves
    /// last.
    pub async fn trigger(&self, payload: Req, callbacks: Callbacks<Resp>) -> WriteState<Resp> {
        *self.state.lock() = WriteState::Pending;

        let outcome = match serde_json::to_value(&payload) {
            Ok(Value::Null) => self.send(None).await,
            Ok(body) => self.send(Some(&body)).await,
            Err(e) => Err(ApiError::Encode {
                message: e.to_string(),
            }),
        };

        let state = match outcome {
            Ok(data) => WriteState::Succeeded(data),
            Err(err) => WriteState::Failed(err),
        };
        *self.state.lock() = state.clone();

        match &state {
            WriteState::Succeeded(data) => {
                if let Some(on_success) = callbacks.on_success {
                    on_success(data);
                }
            }
            WriteState::Failed(err) => {
                debug!(verb = %self.descriptor.verb, url = %self.descriptor.target, error = %err, "Write failed");
                if let Some(on_error) = callbacks.on_error {
                    on_error(err);
                }
            }
            WriteState::Idle | WriteState::Pending => {}
        }

        state
    }

    async fn send(&self, body: Option<&Value>) -> Result<Resp, ApiError> {
        let value = self.client.call(&self.descriptor, body).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode {
            message: e.to_string(),
        })
    }
}

impl<Req, Resp> Clone for WriteAccessor<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            descriptor: self.descriptor.clone(),
            state: self.state.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Req, Resp> std::fmt::Debug for WriteAccessor<Req, Resp> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteAccessor")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
