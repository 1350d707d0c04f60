//! Trace Serialization and Replay.
//!
//! A trace is a line stream: one line per action (`<kind> <arg> …`), a
//! `return sN`/`return tN` line after each object-creating action, optional
//! `set-seed` lines, and `#` comments. Term and sort arguments are referenced
//! by id. The tracer writes each action line and flushes *before* the
//! backend call it describes, so a crashing backend leaves a trace whose last
//! line is the killer.
//!
//! The untracer is the inverse: it tokenizes each line, dispatches on the
//! action kind and re-executes the same backend call, then rebinds the trace
//! id of the `return` line to the object the replay produced.

use std::io::{BufRead, Write};

use skelter_core::sort::SortId;
use skelter_core::term::TermId;

use crate::actions::TracedObject;
use crate::error::{Result, SkelterError};
use crate::fsm::Fsm;
use crate::manager::SolverManager;

/// Writer for the canonical trace surface.
pub struct Tracer {
    out: Box<dyn Write>,
}

impl std::fmt::Debug for Tracer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl Tracer {
    /// A tracer writing to the given sink.
    #[must_use]
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    /// Emit one action line.
    pub fn line(&mut self, line: &str) -> Result<()> {
        debug_assert!(!line.contains('\n'), "multi-line trace entry");
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    /// Emit a `set-seed` line.
    pub fn seed(&mut self, seed: u64) -> Result<()> {
        writeln!(self.out, "set-seed {seed}")?;
        Ok(())
    }

    /// Emit the `return` line for a created sort.
    pub fn ret_sort(&mut self, id: SortId) -> Result<()> {
        writeln!(self.out, "return {id}")?;
        Ok(())
    }

    /// Emit the `return` line for a created term.
    pub fn ret_term(&mut self, id: TermId) -> Result<()> {
        writeln!(self.out, "return {id}")?;
        Ok(())
    }

    /// Flush buffered lines; called before every blocking backend call.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Quote a symbol or value string for the trace surface.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Split a trace line into whitespace-separated tokens; quoted strings are
/// one token with quotes and escapes removed.
pub fn tokenize(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&c) = chars.peek() else { break };
        if c == '"' {
            chars.next();
            let mut tok = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => tok.push(escaped),
                        None => return Err("dangling escape in quoted string".into()),
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    _ => tok.push(c),
                }
            }
            if !closed {
                return Err("unterminated quoted string".into());
            }
            tokens.push(tok);
        } else {
            let mut tok = String::new();
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                tok.push(c);
            }
            tokens.push(tok);
        }
    }
    Ok(tokens)
}

/// Parse an `sN` sort reference.
#[must_use]
pub fn parse_sort_ref(token: &str) -> Option<u64> {
    token.strip_prefix('s')?.parse().ok()
}

/// Parse a `tN` term reference.
#[must_use]
pub fn parse_term_ref(token: &str) -> Option<u64> {
    token.strip_prefix('t')?.parse().ok()
}

/// Replay a trace stream against the manager's backend.
///
/// Every line re-executes the backend call it records; trace ids are mapped
/// to the replay's objects through the manager's untrace tables. Unknown
/// action kinds, unknown ids and malformed lines stop the replay with an
/// [`SkelterError::Untrace`] carrying the line number.
pub fn untrace(mgr: &mut SolverManager, fsm: &Fsm, reader: impl BufRead) -> Result<()> {
    let registry = fsm.action_registry();
    let mut pending: Option<TracedObject> = None;

    for (idx, line) in reader.lines().enumerate() {
        let lineno = idx + 1;
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let tokens = tokenize(trimmed).map_err(|m| SkelterError::untrace(lineno, m))?;
        match tokens[0].as_str() {
            "set-seed" => {
                let seed: u64 = tokens
                    .get(1)
                    .and_then(|t| t.parse().ok())
                    .ok_or_else(|| SkelterError::untrace(lineno, "malformed set-seed line"))?;
                mgr.rng_mut().reseed(seed);
            }
            "return" => {
                let obj = pending.take().ok_or_else(|| {
                    SkelterError::untrace(lineno, "return line without a preceding creation")
                })?;
                let token = tokens
                    .get(1)
                    .ok_or_else(|| SkelterError::untrace(lineno, "return line without id"))?;
                match obj {
                    TracedObject::Sort(sort) => {
                        let id = parse_sort_ref(token).ok_or_else(|| {
                            SkelterError::untrace(lineno, format!("malformed sort id `{token}`"))
                        })?;
                        mgr.register_untraced_sort(id, sort);
                    }
                    TracedObject::Term(term) => {
                        let id = parse_term_ref(token).ok_or_else(|| {
                            SkelterError::untrace(lineno, format!("malformed term id `{token}`"))
                        })?;
                        mgr.register_untraced_term(id, term);
                    }
                }
            }
            kind => {
                if pending.is_some() {
                    return Err(SkelterError::untrace(
                        lineno,
                        format!("expected return line before `{kind}`"),
                    ));
                }
                let action = registry.get(kind).ok_or_else(|| {
                    SkelterError::untrace(lineno, format!("unknown action kind `{kind}`"))
                })?;
                pending = action
                    .untrace(mgr, &tokens[1..])
                    .map_err(|e| at_line(e, lineno))?;
            }
        }
    }
    // A trailing creation without its return line is a trace truncated at
    // the crash point; everything before it already replayed.
    Ok(())
}

fn at_line(err: SkelterError, lineno: usize) -> SkelterError {
    match err {
        SkelterError::Untrace { line: 0, message } => SkelterError::Untrace {
            line: lineno,
            message,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_plain() {
        let tokens = tokenize("mk_sort BV 8").unwrap();
        assert_eq!(tokens, vec!["mk_sort", "BV", "8"]);
    }

    #[test]
    fn test_tokenize_quoted() {
        let tokens = tokenize(r#"mk_const s1 "x y""#).unwrap();
        assert_eq!(tokens, vec!["mk_const", "s1", "x y"]);
    }

    #[test]
    fn test_tokenize_escapes() {
        let tokens = tokenize(r#"mk_value s2 "a\"b\\c""#).unwrap();
        assert_eq!(tokens[2], "a\"b\\c");
    }

    #[test]
    fn test_tokenize_unterminated() {
        assert!(tokenize(r#"mk_const s1 "x"#).is_err());
    }

    #[test]
    fn test_quote_roundtrip() {
        for s in ["plain", "with space", "qu\"ote", "back\\slash", ""] {
            let quoted = quote(s);
            let tokens = tokenize(&format!("v {quoted}")).unwrap();
            assert_eq!(tokens[1], s);
        }
    }

    #[test]
    fn test_id_refs() {
        assert_eq!(parse_sort_ref("s42"), Some(42));
        assert_eq!(parse_term_ref("t7"), Some(7));
        assert_eq!(parse_sort_ref("t7"), None);
        assert_eq!(parse_term_ref("x"), None);
        assert_eq!(parse_term_ref("t"), None);
    }

    #[test]
    fn test_tracer_output() {
        use std::cell::RefCell;
        use std::rc::Rc;

        #[derive(Clone)]
        struct SharedBuf(Rc<RefCell<Vec<u8>>>);

        impl Write for SharedBuf {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.borrow_mut().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buf = SharedBuf(Rc::new(RefCell::new(Vec::new())));
        let mut tracer = Tracer::new(Box::new(buf.clone()));
        tracer.seed(99).unwrap();
        tracer.line("mk_sort BV 8").unwrap();
        tracer.ret_sort(SortId::new(1)).unwrap();
        tracer.flush().unwrap();

        let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
        assert_eq!(text, "set-seed 99\nmk_sort BV 8\nreturn s1\n");
    }
}
