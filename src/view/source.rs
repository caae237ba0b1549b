use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::protocol::{BreakpointId, LineId};
use crate::session::{DebugMode, RunControl};
use crate::view::{Icon, Notice, View};

/// In-memory page for one program.
///
/// Line `N` (1-based) has the line element `lineN` and the breakpoint icon
/// `dotN`. Icons are also found by any other prefix followed by the line
/// number, such as `ln5`. Notices and terminal output are recorded for the caller to
/// drain.
pub struct SourceView {
    inner: Mutex<SourceViewInner>,
}

#[derive(Default)]
struct SourceViewInner {
    lines: Vec<String>,
    icons: Vec<Icon>,
    highlighted: BTreeSet<u32>,
    run_control: RunControl,
    debug_mode: DebugMode,
    notices: Vec<Notice>,
    output: String,
    page: Option<String>,
}

impl SourceView {
    pub fn new(source: &str) -> Self {
        let lines: Vec<String> = source.lines().map(str::to_string).collect();
        let icons = vec![Icon::NoBreakpoint; lines.len()];
        Self {
            inner: Mutex::new(SourceViewInner {
                lines,
                icons,
                ..SourceViewInner::default()
            }),
        }
    }

    pub fn line_count(&self) -> usize {
        self.inner.lock().lines.len()
    }

    pub fn line_text(&self, number: u32) -> Option<String> {
        let inner = self.inner.lock();
        index_of(number, inner.lines.len()).map(|i| inner.lines[i].clone())
    }

    pub fn icon(&self, number: u32) -> Option<Icon> {
        let inner = self.inner.lock();
        index_of(number, inner.icons.len()).map(|i| inner.icons[i])
    }

    /// Lines currently carrying the active styling.
    pub fn highlighted_lines(&self) -> Vec<u32> {
        self.inner.lock().highlighted.iter().copied().collect()
    }

    pub fn run_control(&self) -> RunControl {
        self.inner.lock().run_control
    }

    pub fn debug_mode(&self) -> DebugMode {
        self.inner.lock().debug_mode
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.inner.lock().notices.clone()
    }

    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.lock().notices)
    }

    pub fn output(&self) -> String {
        self.inner.lock().output.clone()
    }

    pub fn take_output(&self) -> String {
        std::mem::take(&mut self.inner.lock().output)
    }

    pub fn page(&self) -> Option<String> {
        self.inner.lock().page.clone()
    }

    fn line_index(&self, line: &LineId) -> Option<usize> {
        let number = parse_id(line.as_str(), "line")?;
        index_of(number, self.inner.lock().lines.len())
    }

    fn icon_index(&self, id: &BreakpointId) -> Option<usize> {
        let number = id.line_number()?;
        index_of(number, self.inner.lock().icons.len())
    }
}

impl View for SourceView {
    fn set_run_control(&self, control: RunControl) {
        self.inner.lock().run_control = control;
    }

    fn set_debug_mode(&self, mode: DebugMode) {
        self.inner.lock().debug_mode = mode;
    }

    fn notify(&self, notice: Notice) {
        self.inner.lock().notices.push(notice);
    }

    fn breakpoint_icon(&self, id: &BreakpointId) -> Option<Icon> {
        let index = self.icon_index(id)?;
        Some(self.inner.lock().icons[index])
    }

    fn set_breakpoint_icon(&self, id: &BreakpointId, icon: Icon) {
        if let Some(index) = self.icon_index(id) {
            self.inner.lock().icons[index] = icon;
        }
    }

    fn clear_breakpoint_icons(&self) {
        self.inner
            .lock()
            .icons
            .iter_mut()
            .for_each(|icon| *icon = Icon::NoBreakpoint);
    }

    fn has_line(&self, line: &LineId) -> bool {
        self.line_index(line).is_some()
    }

    fn set_line_active(&self, line: &LineId, active: bool) {
        let Some(index) = self.line_index(line) else {
            return;
        };
        let number = index as u32 + 1;
        let mut inner = self.inner.lock();
        if active {
            inner.highlighted.insert(number);
        } else {
            inner.highlighted.remove(&number);
        }
    }

    fn append_output(&self, text: &str) {
        self.inner.lock().output.push_str(text);
    }

    fn load_page(&self, page: &str) {
        self.inner.lock().page = Some(page.to_string());
    }
}

/// Parses `<prefix><N>` with N a positive decimal.
fn parse_id(id: &str, prefix: &str) -> Option<u32> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn index_of(number: u32, len: usize) -> Option<usize> {
    let index = (number as usize).checked_sub(1)?;
    (index < len).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "in x;\nx := succ(x);\nout x;";

    #[test]
    fn lines_and_icons_are_one_based() {
        let view = SourceView::new(PROGRAM);
        assert_eq!(view.line_count(), 3);
        assert_eq!(view.line_text(1).as_deref(), Some("in x;"));
        assert!(view.has_line(&LineId::new("line3")));
        assert!(!view.has_line(&LineId::new("line0")));
        assert!(!view.has_line(&LineId::new("line4")));
        assert!(!view.has_line(&LineId::new("OK")));
        assert_eq!(
            view.breakpoint_icon(&BreakpointId::new("dot2")),
            Some(Icon::NoBreakpoint)
        );
        assert_eq!(
            view.breakpoint_icon(&BreakpointId::new("ln3")),
            Some(Icon::NoBreakpoint)
        );
        assert_eq!(view.breakpoint_icon(&BreakpointId::new("dot9")), None);
        assert_eq!(view.breakpoint_icon(&BreakpointId::new("dot0")), None);
    }

    #[test]
    fn clearing_highlight_is_idempotent() {
        let view = SourceView::new(PROGRAM);
        let line = LineId::new("line2");
        view.set_line_active(&line, true);
        assert_eq!(view.highlighted_lines(), vec![2]);
        view.set_line_active(&line, false);
        view.set_line_active(&line, false);
        assert!(view.highlighted_lines().is_empty());
    }

    #[test]
    fn clear_breakpoint_icons_resets_all() {
        let view = SourceView::new(PROGRAM);
        view.set_breakpoint_icon(&BreakpointId::new("dot1"), Icon::Breakpoint);
        view.set_breakpoint_icon(&BreakpointId::new("dot3"), Icon::Breakpoint);
        view.clear_breakpoint_icons();
        assert_eq!(view.icon(1), Some(Icon::NoBreakpoint));
        assert_eq!(view.icon(3), Some(Icon::NoBreakpoint));
    }

    #[test]
    fn notices_and_output_drain() {
        let view = SourceView::new(PROGRAM);
        view.notify(Notice::Timeout);
        view.append_output("4\n");
        assert_eq!(view.take_notices(), vec![Notice::Timeout]);
        assert!(view.notices().is_empty());
        assert_eq!(view.take_output(), "4\n");
        assert_eq!(view.output(), "");
    }
}
