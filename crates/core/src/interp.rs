//! Evaluator context: the call stack and error construction
//!
//! The interpreter threads one [`Interp`] through every evaluation instead
//! of keeping process-wide mutable state, so independent interpreters can
//! coexist in one process. The call stack mirrors the evaluator's
//! recursion; it exists purely to attach traces to errors.

use crate::value::{ErrData, ErrKind, Kind, SourcePos, Value, to_display_string};
use std::fmt::Write as _;
use std::rc::Rc;

/// LIFO of the expressions currently being evaluated. Frames hold plain
/// handles; they never outlive the evaluation that pushed them.
#[derive(Default)]
pub struct CallStack {
    frames: Vec<Rc<Value>>,
}

impl CallStack {
    pub fn push(&mut self, frame: Rc<Value>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Render the stack, innermost frame first, as
    /// `at <expr> <file>:<row>:<col>` lines.
    pub fn render(&self) -> Option<String> {
        if self.frames.is_empty() {
            return None;
        }
        let mut out = String::new();
        for frame in self.frames.iter().rev() {
            let _ = writeln!(
                out,
                "at {} {}{}:{}",
                to_display_string(frame, true),
                frame
                    .pos
                    .file
                    .as_deref()
                    .map(|f| format!("{}:", f))
                    .unwrap_or_default(),
                frame.pos.row + 1,
                frame.pos.col,
            );
        }
        Some(out)
    }
}

/// Per-interpreter evaluation context.
pub struct Interp {
    pub call_stack: CallStack,
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

impl Interp {
    pub fn new() -> Interp {
        Interp {
            call_stack: CallStack::default(),
        }
    }

    /// An error value with no position attached (rare; prefer
    /// [`Interp::error_at`]).
    pub fn error(&self, kind: ErrKind, message: impl Into<String>) -> Rc<Value> {
        Value::new(
            Kind::Err(ErrData {
                kind,
                message: Rc::from(message.into().as_str()),
                trace: self.call_stack.render().map(|t| Rc::from(t.as_str())),
            }),
            SourcePos::default(),
        )
    }

    /// An error value blaming a specific value: the value's source
    /// position is folded into the message and the current call stack is
    /// attached as the trace.
    pub fn error_at(&self, kind: ErrKind, at: &Value, message: impl Into<String>) -> Rc<Value> {
        let message = format!(
            "{} at line {}:{}",
            message.into(),
            at.pos.row + 1,
            at.pos.col
        );
        self.error(kind, message)
    }
}

/// Render an error the way the REPL and script runner report it: the
/// message, then the captured trace when one exists, otherwise the
/// error's own source position.
pub fn error_report(err: &Value) -> String {
    let (Kind::Err(data) | Kind::CaughtErr(data)) = &err.kind else {
        return err.to_string();
    };
    match &data.trace {
        Some(trace) => format!("{}\n{}", data.message, trace),
        None => format!(
            "{} at {}{}:{}",
            data.message,
            err.pos
                .file
                .as_deref()
                .map(|f| format!("{}:", f))
                .unwrap_or_default(),
            err.pos.row + 1,
            err.pos.col
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_at_includes_position_and_trace() {
        let mut interp = Interp::new();
        let frame = Value::sexpr(vec![Value::sym("f"), Value::int(1)]);
        interp.call_stack.push(frame);
        let site = Value::int(0).with_pos(SourcePos::new(2, 5, None));
        let err = interp.error_at(ErrKind::Type, &site, "bad thing");
        match &err.kind {
            Kind::Err(data) => {
                assert_eq!(&*data.message, "bad thing at line 3:5");
                let trace = data.trace.as_deref().unwrap();
                assert!(trace.contains("at (f 1) 1:0"));
            }
            _ => panic!("expected error"),
        }
        interp.call_stack.pop();
        assert_eq!(interp.call_stack.depth(), 0);
    }

    #[test]
    fn report_uses_trace_when_present() {
        let interp = Interp::new();
        let err = interp.error(ErrKind::User, "boom");
        assert!(error_report(&err).starts_with("boom"));
    }
}
