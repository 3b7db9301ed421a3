//! Negotiation state machine
//!
//! One negotiation drives a single permission kind from an initial grant
//! check to a terminal granted/denied outcome, suspending on the host's
//! consent surface along the way:
//!
//! ```text
//! Init → CheckGranted → {Granted | Rationale | SystemPrompt | SettingsPrompt}
//!                     → Terminal(Granted | Denied)
//! ```
//!
//! Denial is an ordinary outcome, never an error. The only way a
//! negotiation ends without a result is the consent surface going away,
//! which closes the result channel without emitting anything.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use assent_api::{PermissionKind, PermissionResult};

use crate::grant::GrantChecker;
use crate::ui::{ConsentUi, EscalationChoice, UiError};

/// Immutable snapshot of a request entering the state machine.
///
/// Created after quirk adjustment; the state machine never mutates the
/// permission list it carries.
#[derive(Debug, Clone)]
pub struct NegotiationRequest {
    /// The quirk-adjusted kind to negotiate.
    pub kind: PermissionKind,
}

impl NegotiationRequest {
    pub fn new(kind: PermissionKind) -> Self {
        Self { kind }
    }
}

/// Outcome of one grant-status evaluation, in transition precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Evaluation {
    /// Nothing left to request.
    Granted,
    /// Still denied after the settings round-trip; no further prompting.
    Denied(Vec<String>),
    /// Explain first, then prompt for the pending set.
    Rationale(Vec<String>),
    /// Prompt for the pending set.
    Prompt(Vec<String>),
}

fn evaluate(kind: &PermissionKind, checker: &dyn GrantChecker, from_settings: bool) -> Evaluation {
    let pending: Vec<String> = kind
        .permissions
        .iter()
        .filter(|p| !checker.is_granted(p))
        .cloned()
        .collect();

    if pending.is_empty() {
        Evaluation::Granted
    } else if from_settings {
        Evaluation::Denied(pending)
    } else if kind.rationale_message.is_some() {
        Evaluation::Rationale(pending)
    } else {
        Evaluation::Prompt(pending)
    }
}

/// Run the state machine to its terminal outcome.
///
/// Errors from the consent surface abort the run; the caller drops the
/// result sender so nothing is emitted.
pub(crate) async fn drive(
    checker: Arc<dyn GrantChecker>,
    ui: Arc<dyn ConsentUi>,
    request: NegotiationRequest,
) -> Result<PermissionResult, UiError> {
    let kind = request.kind;
    let mut from_settings = false;

    loop {
        let (pending, explain_first) = match evaluate(&kind, checker.as_ref(), from_settings) {
            Evaluation::Granted => {
                tracing::debug!(kind = %kind.group, "all permissions granted");
                return Ok(PermissionResult::Granted(kind));
            }
            Evaluation::Denied(denied) => {
                tracing::debug!(kind = %kind.group, ?denied, "denied after settings round-trip");
                return Ok(PermissionResult::Denied { kind, denied });
            }
            Evaluation::Rationale(pending) => (pending, true),
            Evaluation::Prompt(pending) => (pending, false),
        };

        if explain_first {
            // One-shot informational gate; acknowledgement carries the same
            // pending set into the system prompt.
            let message = kind.rationale_message.clone().unwrap_or_default();
            tracing::debug!(kind = %kind.group, "showing rationale");
            ui.show_rationale(&message).await?;
        }

        tracing::debug!(kind = %kind.group, ?pending, "launching system prompt");
        let answers = ui.show_system_prompt(&pending).await?;
        let still_denied = partition_denied(&pending, &answers);

        if still_denied.is_empty() {
            tracing::debug!(kind = %kind.group, "system prompt granted everything");
            return Ok(PermissionResult::Granted(kind));
        }
        if !kind.has_escalation() {
            tracing::debug!(kind = %kind.group, denied = ?still_denied, "denied without escalation");
            return Ok(PermissionResult::Denied {
                kind,
                denied: still_denied,
            });
        }

        let message = kind.setting_message.clone().unwrap_or_default();
        match ui.show_settings_escalation(&message).await? {
            EscalationChoice::Decline => {
                tracing::debug!(kind = %kind.group, denied = ?still_denied, "escalation declined");
                return Ok(PermissionResult::Denied {
                    kind,
                    denied: still_denied,
                });
            }
            EscalationChoice::OpenSettings => {
                tracing::debug!(kind = %kind.group, "opening settings screen");
                ui.open_settings().await?;
                // Exactly one settings round-trip: the re-check below is
                // terminal either way.
                from_settings = true;
            }
        }
    }
}

/// Pending permissions the prompt answers did not grant, in request order.
fn partition_denied(pending: &[String], answers: &HashMap<String, bool>) -> Vec<String> {
    pending
        .iter()
        .filter(|p| !answers.get(*p).copied().unwrap_or(false))
        .cloned()
        .collect()
}

/// Aborts the negotiation task when the owning handle goes away.
#[derive(Debug)]
pub(crate) struct AbortGuard(JoinHandle<()>);

impl AbortGuard {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self(task)
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to one in-flight negotiation.
///
/// Yields exactly one [`PermissionResult`], strictly after the state
/// machine reaches its terminal state, and the underlying channel closes
/// immediately after delivery. Dropping the handle before the terminal
/// state aborts the negotiation; no partial result is ever emitted.
#[derive(Debug)]
pub struct Negotiation {
    rx: mpsc::Receiver<PermissionResult>,
    guard: AbortGuard,
}

impl Negotiation {
    pub(crate) fn spawn(
        checker: Arc<dyn GrantChecker>,
        ui: Arc<dyn ConsentUi>,
        request: NegotiationRequest,
    ) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            match drive(checker, ui, request).await {
                Ok(result) => {
                    // A closed receiver means the host already tore down.
                    let _ = tx.send(result).await;
                }
                Err(err) => {
                    tracing::debug!(error = %err, "negotiation ended without a result");
                }
            }
        });

        Self {
            rx,
            guard: AbortGuard::new(task),
        }
    }

    /// Await the terminal outcome.
    ///
    /// Returns `None` when the negotiation was cancelled before reaching
    /// a terminal state.
    pub async fn result(mut self) -> Option<PermissionResult> {
        self.rx.recv().await
    }

    /// Consume the handle as a single-item stream.
    pub fn into_stream(self) -> ResultStream {
        let Self { rx, guard } = self;
        ResultStream {
            inner: ReceiverStream::new(rx),
            _guard: guard,
        }
    }

    /// Await the outcome and invoke the matching callback.
    ///
    /// Cancelled negotiations invoke neither callback.
    pub async fn dispatch(self, callbacks: ResultCallbacks) {
        match self.result().await {
            Some(PermissionResult::Granted(kind)) => {
                if let Some(on_granted) = callbacks.on_granted {
                    on_granted(kind);
                }
            }
            Some(PermissionResult::Denied { kind, denied }) => {
                if let Some(on_denied) = callbacks.on_denied {
                    on_denied(kind, denied);
                }
            }
            None => {}
        }
    }

    /// Spawn [`Negotiation::dispatch`] onto the runtime.
    pub fn spawn_dispatch(self, callbacks: ResultCallbacks) -> JoinHandle<()> {
        tokio::spawn(self.dispatch(callbacks))
    }
}

/// Single-item stream over a negotiation's terminal outcome.
///
/// Completes immediately after yielding the result. Dropping the stream
/// before the terminal state aborts the negotiation.
#[derive(Debug)]
pub struct ResultStream {
    inner: ReceiverStream<PermissionResult>,
    _guard: AbortGuard,
}

impl Stream for ResultStream {
    type Item = PermissionResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Callback pair dispatched with a negotiation's terminal outcome.
///
/// Owned by the negotiation it is handed to, never shared: set the
/// branches you care about, the other is a no-op.
#[derive(Default)]
pub struct ResultCallbacks {
    on_granted: Option<Box<dyn FnOnce(PermissionKind) + Send>>,
    on_denied: Option<Box<dyn FnOnce(PermissionKind, Vec<String>) + Send>>,
}

impl ResultCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked with the kind when the negotiation ends granted.
    pub fn on_granted(mut self, callback: impl FnOnce(PermissionKind) + Send + 'static) -> Self {
        self.on_granted = Some(Box::new(callback));
        self
    }

    /// Invoked with the kind and the denied permissions on denial.
    pub fn on_denied(
        mut self,
        callback: impl FnOnce(PermissionKind, Vec<String>) + Send + 'static,
    ) -> Self {
        self.on_denied = Some(Box::new(callback));
        self
    }
}
