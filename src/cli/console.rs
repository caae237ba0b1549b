use std::io::Write;

use crate::protocol::{BreakpointId, LineId};
use crate::session::{DebugMode, RunControl};
use crate::view::{Icon, Notice, SourceView, View};

/// Terminal front end: a [`SourceView`] that also echoes what the user
/// needs to see.
pub struct ConsoleView {
    source: SourceView,
}

impl ConsoleView {
    pub fn new(program: &str) -> Self {
        Self {
            source: SourceView::new(program),
        }
    }

    pub fn source(&self) -> &SourceView {
        &self.source
    }
}

impl View for ConsoleView {
    fn set_run_control(&self, control: RunControl) {
        self.source.set_run_control(control);
    }

    fn set_debug_mode(&self, mode: DebugMode) {
        self.source.set_debug_mode(mode);
    }

    fn notify(&self, notice: Notice) {
        eprintln!("! {}", notice);
        self.source.notify(notice);
    }

    fn breakpoint_icon(&self, id: &BreakpointId) -> Option<Icon> {
        self.source.breakpoint_icon(id)
    }

    fn set_breakpoint_icon(&self, id: &BreakpointId, icon: Icon) {
        self.source.set_breakpoint_icon(id, icon);
    }

    fn clear_breakpoint_icons(&self) {
        self.source.clear_breakpoint_icons();
    }

    fn has_line(&self, line: &LineId) -> bool {
        self.source.has_line(line)
    }

    fn set_line_active(&self, line: &LineId, active: bool) {
        self.source.set_line_active(line, active);
        if !active {
            return;
        }
        if let Some(number) = line.line_number() {
            let text = self.source.line_text(number).unwrap_or_default();
            println!("-> {:>4} | {}", number, text);
        }
    }

    fn append_output(&self, text: &str) {
        self.source.append_output(text);
        let mut stdout = std::io::stdout().lock();
        if let Err(err) = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
            tracing::debug!(error = %err, "Failed to echo program output");
        }
    }

    fn load_page(&self, page: &str) {
        tracing::debug!(bytes = page.len(), "Debugger page loaded");
        self.source.load_page(page);
    }
}
