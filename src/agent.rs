use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

use crate::backend::JobSource;
use crate::error::AgentError;
use crate::printer::PrinterStatusSource;
use crate::state_machine::{AgentState, ReadySignal, SendResult, StateMachine, Step};
use crate::store::StateStore;

/// Non-blocking reentrancy guard: at most one tick holds a permit.
#[derive(Debug, Default, Clone)]
pub struct TickGuard {
    busy: Arc<AtomicBool>,
    released: Arc<Notify>,
}

/// Held for the duration of a tick. Dropping it releases the guard, also
/// when the tick errors or panics.
#[derive(Debug)]
pub struct TickPermit {
    busy: Arc<AtomicBool>,
    released: Arc<Notify>,
}

impl TickGuard {
    pub fn try_acquire(&self) -> Option<TickPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| TickPermit {
                busy: Arc::clone(&self.busy),
                released: Arc::clone(&self.released),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Resolves once no permit is held.
    pub async fn wait_idle(&self) {
        loop {
            // Registered before the check so a release in between is not missed.
            let released = self.released.notified();
            if !self.is_busy() {
                return;
            }
            released.await;
        }
    }
}

impl Drop for TickPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        self.released.notify_waiters();
    }
}

/// The backend call a tick made, with its settled result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendCall {
    Readiness(ReadySignal),
    Dispatch(SendResult),
}

/// What one completed tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub from: AgentState,
    pub to: AgentState,
    pub call: Option<BackendCall>,
}

impl TickReport {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Result of asking for a tick through the guard.
#[derive(Debug)]
pub enum TickRun {
    /// Another tick was still running; this one was dropped.
    Skipped,
    Finished(Result<TickReport, AgentError>),
}

/// Polls the printer and drives the job handoff state machine.
pub struct Agent<P, B, S> {
    printer: P,
    backend: B,
    store: S,
    /// Bound on each outward call.
    call_timeout: Duration,
    guard: TickGuard,
}

impl<P, B, S> Agent<P, B, S>
where
    P: PrinterStatusSource + 'static,
    B: JobSource + 'static,
    S: StateStore + 'static,
{
    pub fn new(printer: P, backend: B, store: S, call_timeout: Duration) -> Self {
        Self {
            printer,
            backend,
            store,
            call_timeout,
            guard: TickGuard::default(),
        }
    }

    /// Run one tick unless another is in flight.
    pub async fn try_tick(&self) -> TickRun {
        let Some(_permit) = self.guard.try_acquire() else {
            return TickRun::Skipped;
        };
        TickRun::Finished(self.tick().await)
    }

    /// One full tick: load state, fetch a snapshot, decide, make at most one
    /// backend call, persist.
    ///
    /// Errors return before the store is written, so the persisted state is
    /// whatever the last successful tick left. A failed dispatch is the one
    /// exception: it saves `READY` first, since the backend may already have
    /// pushed the job.
    pub async fn tick(&self) -> Result<TickReport, AgentError> {
        let loaded = self.store.load()?;
        let state = match loaded {
            AgentState::Pending => {
                // Only seen when a previous process died mid-request.
                tracing::warn!("found interrupted readiness request, treating as READY");
                AgentState::Ready
            }
            other => other,
        };

        let snapshot = self
            .bounded("printer status", self.printer.fetch_snapshot())
            .await?;
        tracing::debug!(
            %state,
            status = ?snapshot.status,
            message_box = snapshot.message_box_present,
            "printer snapshot"
        );

        let (to, call) = match StateMachine::decide(state, &snapshot) {
            Step::Stay => (state, None),
            Step::Advance(next) => (next, None),
            Step::RequestReadiness => {
                let pending = AgentState::Pending;
                tracing::info!(from = %state, to = %pending, "printer idle, requesting next job");
                let signal = self
                    .bounded("readiness request", self.backend.request_readiness())
                    .await?;
                tracing::info!(%signal, "readiness request settled");
                (
                    StateMachine::after_readiness(signal),
                    Some(BackendCall::Readiness(signal)),
                )
            }
            Step::DispatchJob => {
                tracing::info!("confirmation cleared, dispatching job");
                let result = match self
                    .bounded("job dispatch", self.backend.dispatch_confirmed_job())
                    .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        // Never resend within the same INTERACTION; start a new cycle.
                        let ready = AgentState::Ready;
                        tracing::warn!(error = %e, to = %ready, "dispatch failed");
                        self.store.save(ready)?;
                        return Err(e);
                    }
                };
                tracing::info!(%result, "dispatch settled");
                (
                    StateMachine::after_dispatch(result),
                    Some(BackendCall::Dispatch(result)),
                )
            }
        };

        if to != loaded {
            self.store.save(to)?;
        }

        Ok(TickReport {
            from: state,
            to,
            call,
        })
    }

    /// Tick every `interval` until `shutdown` resolves.
    ///
    /// Each tick runs on its own task so a slow call never stalls the timer;
    /// firings that land while a tick is still running are skipped.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping poll loop");
                    self.drain().await;
                    break;
                }
                _ = ticker.tick() => {}
            }

            let Some(permit) = self.guard.try_acquire() else {
                tracing::warn!("previous tick still running, skipping this one");
                continue;
            };

            let agent = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                // The inner task isolates panics so the permit is still released
                // and the loop keeps going.
                match tokio::spawn(async move { agent.tick().await }).await {
                    Ok(result) => log_tick(&result),
                    Err(e) => log_tick(&Err(AgentError::Panicked(e.to_string()))),
                }
            });
        }
    }

    /// Give an in-flight tick a chance to persist its result before exit.
    async fn drain(&self) {
        if !self.guard.is_busy() {
            return;
        }
        tracing::info!("waiting for in-flight tick");
        // Printer fetch plus one backend call.
        if tokio::time::timeout(self.call_timeout * 2, self.guard.wait_idle())
            .await
            .is_err()
        {
            tracing::warn!("in-flight tick did not finish, exiting anyway");
        }
    }

    async fn bounded<T, E>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> Result<T, AgentError>
    where
        E: Into<AgentError>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => Err(AgentError::Timeout {
                operation,
                after_ms: self.call_timeout.as_millis() as u64,
            }),
        }
    }
}

pub fn log_tick(result: &Result<TickReport, AgentError>) {
    match result {
        Ok(report) if report.changed() => {
            tracing::info!(from = %report.from, to = %report.to, "state changed");
        }
        Ok(report) => tracing::debug!(state = %report.to, "no change"),
        Err(e) if e.is_transient() => tracing::warn!(error = %e, "tick failed"),
        Err(e) => tracing::error!(error = %e, "tick failed"),
    }
}
