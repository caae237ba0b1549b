use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::AbortHandle;

use crate::config::{Config, TimingConfig};
use crate::debugger::{self, ActiveLine};
use crate::mvi::Reducer;
use crate::protocol::{
    Endpoint, LineId, PollStatus, SessionHandle, StopReply, FIELD_INPUT, FIELD_PROGRAM_CODE,
    FIELD_SESSION_ID,
};
use crate::session::error::SessionError;
use crate::session::lifecycle::{
    DebugMode, LifecycleIntent, LifecycleReducer, LifecycleState, RunControl, SessionTicket,
};
use crate::session::{feed, poller};
use crate::transport::{ServerClient, TransportError};
use crate::view::{Notice, View};

/// Mutable state shared by the session components.
///
/// Guarded by one lock that is never held across an await point.
pub(crate) struct SessionState {
    lifecycle: LifecycleState,
    generation: u64,
    poll_timer: Option<AbortHandle>,
    reload_timer: Option<AbortHandle>,
    debug_mode: DebugMode,
    pub(crate) active_line: ActiveLine,
}

impl SessionState {
    fn apply(&mut self, intent: LifecycleIntent) {
        self.lifecycle = LifecycleReducer::reduce(self.lifecycle, intent);
    }
}

/// How a session is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LaunchKind {
    /// `run`: the reply body is the handle.
    Run,
    /// `debugger`: the reply is a page announcing the handle.
    Debug,
}

impl LaunchKind {
    fn endpoint(self) -> Endpoint {
        match self {
            LaunchKind::Run => Endpoint::Run,
            LaunchKind::Debug => Endpoint::Debugger,
        }
    }

    fn parse(self, body: &str) -> Option<SessionHandle> {
        match self {
            LaunchKind::Run => SessionHandle::parse_reply(body),
            LaunchKind::Debug => SessionHandle::find_in_page(body),
        }
    }
}

/// Owns the run/stop lifecycle, the session handle and both timers.
///
/// Cloning yields another handle to the same session; the breakpoint
/// manager and debug dispatcher each hold one.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    client: ServerClient,
    view: Arc<dyn View>,
    timing: TimingConfig,
    show_debug_detail: bool,
    state: Mutex<SessionState>,
    run_control: watch::Sender<RunControl>,
}

impl SessionController {
    pub fn new(config: &Config, view: Arc<dyn View>) -> Result<Self, TransportError> {
        let client = ServerClient::new(config)?;
        Ok(Self::with_client(client, config, view))
    }

    pub fn with_client(client: ServerClient, config: &Config, view: Arc<dyn View>) -> Self {
        let (run_control, _) = watch::channel(RunControl::Idle);
        let state = SessionState {
            lifecycle: LifecycleState::Idle,
            generation: 0,
            poll_timer: None,
            reload_timer: None,
            debug_mode: DebugMode::Off,
            active_line: ActiveLine::default(),
        };

        Self {
            inner: Arc::new(Inner {
                client,
                view,
                timing: config.timing.clone(),
                show_debug_detail: config.logging.show_debug_detail,
                state: Mutex::new(state),
                run_control,
            }),
        }
    }

    /// Current handle; `SessionHandle::NONE` when no session is live.
    pub fn handle(&self) -> SessionHandle {
        self.inner.state.lock().lifecycle.handle()
    }

    pub fn ticket(&self) -> Option<SessionTicket> {
        self.inner.state.lock().lifecycle.ticket()
    }

    pub fn is_running(&self) -> bool {
        self.ticket().is_some()
    }

    pub fn run_control(&self) -> RunControl {
        self.inner.state.lock().lifecycle.run_control()
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.inner.state.lock().debug_mode
    }

    pub fn active_line(&self) -> Option<LineId> {
        self.inner.state.lock().active_line.line().cloned()
    }

    /// Whether the termination poller is armed.
    pub fn is_polling(&self) -> bool {
        self.inner.state.lock().poll_timer.is_some()
    }

    /// Whether the terminal reload timer is armed.
    pub fn is_reloading(&self) -> bool {
        self.inner.state.lock().reload_timer.is_some()
    }

    /// Watches the run control, e.g. to wait for a session to end.
    pub fn subscribe(&self) -> watch::Receiver<RunControl> {
        self.inner.run_control.subscribe()
    }

    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        self.ticket() == Some(ticket)
    }

    pub(crate) fn client(&self) -> &ServerClient {
        &self.inner.client
    }

    pub(crate) fn view(&self) -> &dyn View {
        self.inner.view.as_ref()
    }

    pub(crate) fn timing(&self) -> &TimingConfig {
        &self.inner.timing
    }

    pub(crate) fn connection_notice(&self, error: &TransportError, endpoint: Endpoint) -> Notice {
        Notice::connection_error(error, endpoint, self.inner.show_debug_detail)
    }

    /// Runs `f` against the shared state if `ticket` is still the live
    /// session. Returns `None` when the result belongs to an ended session.
    pub(crate) fn with_current<R>(
        &self,
        ticket: SessionTicket,
        f: impl FnOnce(&mut SessionState, &dyn View) -> R,
    ) -> Option<R> {
        let mut state = self.inner.state.lock();
        if state.lifecycle.ticket() != Some(ticket) {
            return None;
        }
        Some(f(&mut *state, self.inner.view.as_ref()))
    }

    /// Runs `program` as a new session.
    ///
    /// On success the termination poller and the terminal reload timer are
    /// armed and the breakpoint icons are reset to the fresh session's
    /// (empty) breakpoint set.
    ///
    /// # Errors
    /// `AlreadyRunning` if a session is live or launching. Transport and
    /// protocol failures leave no session behind and are reported to the
    /// user before returning.
    pub async fn start_session(&self, program: &str) -> Result<SessionHandle, SessionError> {
        self.launch(LaunchKind::Run, program).await
    }

    /// Stops the live session.
    ///
    /// Local state is torn down before the `stop` request is sent, so the
    /// handle is `0` and no timer is armed once this returns, whatever the
    /// server answers. A non-`OK` answer or a transport failure is reported
    /// to the user.
    pub async fn stop_session(&self) -> Result<(), SessionError> {
        let ticket = {
            let mut state = self.inner.state.lock();
            if state.lifecycle.is_idle() {
                return Err(SessionError::NotRunning);
            }
            let ticket = state.lifecycle.ticket();
            self.teardown(&mut state, LifecycleIntent::Stop);
            ticket
        };

        let Some(ticket) = ticket else {
            tracing::info!("Launch cancelled before the server answered");
            return Ok(());
        };

        let handle = ticket.handle();
        tracing::info!(session = %handle, "Stopping session");

        match self
            .inner
            .client
            .post(Endpoint::Stop, &[(FIELD_SESSION_ID, handle.form_value())])
            .await
        {
            Ok(body) => match StopReply::parse(&body) {
                StopReply::Ok => tracing::debug!(session = %handle, "Stop acknowledged"),
                StopReply::Failed(text) => {
                    tracing::warn!(session = %handle, reply = %text, "Server reported stop failure");
                    self.inner.view.notify(Notice::StopFailed(text));
                }
            },
            Err(err) => {
                tracing::warn!(session = %handle, error = %err, "Stop request failed");
                self.inner
                    .view
                    .notify(self.connection_notice(&err, Endpoint::Stop));
            }
        }

        Ok(())
    }

    /// Enters or leaves debug mode.
    ///
    /// Entering submits `program` to the debugger page, loads the returned
    /// page into the view and adopts the session it announces. Leaving stops
    /// the live session, if any.
    pub async fn toggle_debug_mode(&self, program: &str) -> Result<DebugMode, SessionError> {
        let mode = self.debug_mode();
        match mode {
            DebugMode::Off => {
                self.launch(LaunchKind::Debug, program).await?;
                Ok(DebugMode::On)
            }
            DebugMode::On => {
                match self.stop_session().await {
                    Ok(()) | Err(SessionError::NotRunning) => {}
                    Err(err) => return Err(err),
                }
                let mut state = self.inner.state.lock();
                state.debug_mode = DebugMode::Off;
                self.inner.view.set_debug_mode(DebugMode::Off);
                Ok(DebugMode::Off)
            }
        }
    }

    /// Sends a line of terminal input and appends the program's answer.
    pub async fn send_input(&self, text: &str) -> Result<(), SessionError> {
        let ticket = self.ticket().ok_or(SessionError::NotRunning)?;
        let fields = [
            (FIELD_SESSION_ID, ticket.handle().form_value()),
            (FIELD_INPUT, text.to_string()),
        ];

        let output = match self.inner.client.post(Endpoint::Shell, &fields).await {
            Ok(output) => output,
            Err(err) => {
                if self.is_current(ticket) {
                    self.inner
                        .view
                        .notify(self.connection_notice(&err, Endpoint::Shell));
                }
                return Err(err.into());
            }
        };

        self.with_current(ticket, |_, view| view.append_output(&output))
            .ok_or(SessionError::Superseded)
    }

    /// Ends `ticket` after the poller saw it stop running.
    ///
    /// Returns false if the ticket was already superseded; nothing changes
    /// in that case.
    pub(crate) fn finish(&self, ticket: SessionTicket, status: &PollStatus) -> bool {
        let mut state = self.inner.state.lock();
        if state.lifecycle.ticket() != Some(ticket) {
            return false;
        }
        self.teardown(&mut state, LifecycleIntent::Terminated { ticket });
        if *status == PollStatus::Timeout {
            self.inner.view.notify(Notice::Timeout);
        }
        true
    }

    async fn launch(&self, kind: LaunchKind, program: &str) -> Result<SessionHandle, SessionError> {
        let generation = {
            let mut state = self.inner.state.lock();
            if !state.lifecycle.is_idle() {
                return Err(SessionError::AlreadyRunning);
            }
            state.generation += 1;
            let generation = state.generation;
            state.apply(LifecycleIntent::Launch { generation });
            if kind == LaunchKind::Debug {
                state.debug_mode = DebugMode::On;
                self.inner.view.set_debug_mode(DebugMode::On);
            }
            self.publish(&state);
            generation
        };

        let endpoint = kind.endpoint();
        tracing::info!(%endpoint, generation, "Launching session");

        let body = match self
            .inner
            .client
            .post(endpoint, &[(FIELD_PROGRAM_CODE, program.to_string())])
            .await
        {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "Launch request failed");
                self.abandon_launch(kind, generation, self.connection_notice(&err, endpoint));
                return Err(err.into());
            }
        };

        let Some(handle) = kind.parse(&body) else {
            tracing::warn!(%endpoint, reply = %body, "Launch reply carries no session handle");
            self.abandon_launch(
                kind,
                generation,
                Notice::IllegalResponse {
                    endpoint,
                    body: body.clone(),
                },
            );
            return Err(SessionError::Protocol { endpoint, body });
        };

        let ticket = SessionTicket::new(handle, generation);
        {
            let mut state = self.inner.state.lock();
            if state.lifecycle != (LifecycleState::Starting { generation }) {
                self.leave_cancelled_debug_mode(&mut state, kind);
                drop(state);
                tracing::warn!(session = %handle, "Session started after it was cancelled");
                self.release_orphan(handle);
                return Err(SessionError::Superseded);
            }

            state.apply(LifecycleIntent::Launched { ticket });
            state.poll_timer = Some(tokio::spawn(poller::run(self.clone(), ticket)).abort_handle());
            state.reload_timer = Some(tokio::spawn(feed::run(self.clone(), ticket)).abort_handle());
            if kind == LaunchKind::Debug {
                self.inner.view.load_page(&body);
            }
            self.inner.view.clear_breakpoint_icons();
            self.publish(&state);
        }

        tracing::info!(session = %handle, %ticket, "Session started");
        Ok(handle)
    }

    /// Rolls back a launch that produced no session. The notice is only
    /// shown if the user has not cancelled the launch in the meantime.
    fn abandon_launch(&self, kind: LaunchKind, generation: u64, notice: Notice) {
        let mut state = self.inner.state.lock();
        if state.lifecycle != (LifecycleState::Starting { generation }) {
            self.leave_cancelled_debug_mode(&mut state, kind);
            tracing::debug!(generation, "Dropped failure of a cancelled launch");
            return;
        }

        state.apply(LifecycleIntent::LaunchFailed { generation });
        if kind == LaunchKind::Debug {
            state.debug_mode = DebugMode::Off;
            self.inner.view.set_debug_mode(DebugMode::Off);
        }
        self.publish(&state);
        self.inner.view.notify(notice);
    }

    /// A cancelled debug launch leaves debug mode, unless a newer launch
    /// already owns the state.
    fn leave_cancelled_debug_mode(&self, state: &mut SessionState, kind: LaunchKind) {
        if kind == LaunchKind::Debug && state.lifecycle.is_idle() {
            state.debug_mode = DebugMode::Off;
            self.inner.view.set_debug_mode(DebugMode::Off);
        }
    }

    /// Stops a session the server started after the user had already
    /// stopped the launch.
    fn release_orphan(&self, handle: SessionHandle) {
        let client = self.inner.client.clone();
        tokio::spawn(async move {
            match client
                .post(Endpoint::Stop, &[(FIELD_SESSION_ID, handle.form_value())])
                .await
            {
                Ok(body) => tracing::debug!(session = %handle, reply = %body, "Released orphaned session"),
                Err(err) => tracing::warn!(session = %handle, error = %err, "Failed to release orphaned session"),
            }
        });
    }

    /// Ends the live session locally: cancels both timers and clears the
    /// active line.
    fn teardown(&self, state: &mut SessionState, intent: LifecycleIntent) {
        state.apply(intent);
        for timer in [state.poll_timer.take(), state.reload_timer.take()]
            .into_iter()
            .flatten()
        {
            timer.abort();
        }
        debugger::reset_active_line(&mut state.active_line, self.inner.view.as_ref());
        self.publish(state);
    }

    fn publish(&self, state: &SessionState) {
        let control = state.lifecycle.run_control();
        self.inner.view.set_run_control(control);
        self.inner.run_control.send_replace(control);
    }
}
