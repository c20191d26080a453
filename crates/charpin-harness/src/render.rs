//! Test-script synthesis.
//!
//! Renders the original source, fixed linked-structure helpers, and the
//! captured snapshot list into one self-contained Rust test file. The
//! generated file has no dependency on this crate: it reconstructs inputs
//! with its own helpers and asserts against embedded literals.
//!
//! Known narrowing, carried deliberately: the template assumes the
//! two-argument calling convention of a linked-structure receiver/first
//! argument plus a scalar second argument, returning a linked structure,
//! and it expects the embedded source to declare the linked-node type
//! with public fields. Snapshot lists outside that shape fail fast
//! instead of rendering broken code.

use std::fmt::Write as _;

use thiserror::Error;

use charpin_core::Repr;

use crate::snapshots::Snapshot;

/// Snapshot shape the synthesizer cannot render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("target identifier `{0}` cannot name a test function")]
    BadIdentifier(String),
    #[error("snapshot {index}: expected 2 inputs, got {got}")]
    Arity { index: usize, got: usize },
    #[error("snapshot {index}: input {position} is not a {expected}")]
    InputShape {
        index: usize,
        position: usize,
        expected: &'static str,
    },
    #[error("snapshot {index}: return value is not a plain sequence")]
    ReturnShape { index: usize },
}

/// Render a self-contained characterization test file.
pub fn render(
    target_identifier: &str,
    source_text: &str,
    snapshots: &[Snapshot],
) -> Result<String, RenderError> {
    let test_name = test_fn_name(target_identifier)?;
    let call_path = target_identifier.replace('.', "::");

    let mut cases = String::new();
    for (index, snapshot) in snapshots.iter().enumerate() {
        let case = render_case(index, snapshot)?;
        let _ = writeln!(cases, "    {case}");
    }

    let mut out = String::new();
    let _ = writeln!(out, "//! Characterization test for `{target_identifier}`.");
    let _ = writeln!(out, "//!");
    let _ = writeln!(
        out,
        "//! Generated by charpin. Each case replays one captured input"
    );
    let _ = writeln!(
        out,
        "//! combination and asserts the observed return value has not drifted."
    );
    out.push('\n');
    let _ = writeln!(out, "mod subject {{");
    out.push_str(&indent(source_text, "    "));
    let _ = writeln!(out, "}}");
    out.push('\n');
    let _ = writeln!(out, "use subject::*;");
    out.push('\n');
    out.push_str(HELPERS);
    out.push('\n');
    out.push_str(CASE_DECL);
    out.push('\n');
    let _ = writeln!(out, "const CASES: &[Case] = &[");
    out.push_str(&cases);
    let _ = writeln!(out, "];");
    out.push('\n');
    let _ = writeln!(out, "#[test]");
    let _ = writeln!(out, "fn {test_name}_matches_captured_behavior() {{");
    let _ = writeln!(out, "    for case in CASES {{");
    let _ = writeln!(out, "        if !case.fault.is_empty() {{");
    let _ = writeln!(
        out,
        "            // Captured as a fault; nothing to re-assert here."
    );
    let _ = writeln!(out, "            continue;");
    let _ = writeln!(out, "        }}");
    let _ = writeln!(out, "        let head = build_list(case.input);");
    let _ = writeln!(
        out,
        "        let actual = flatten_list({call_path}(head, case.arg));"
    );
    let _ = writeln!(out, "        assert_eq!(");
    let _ = writeln!(out, "            actual, case.expected,");
    let _ = writeln!(
        out,
        "            \"inputs {{:?}} / {{}}\", case.input, case.arg"
    );
    let _ = writeln!(out, "        );");
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
    Ok(out)
}

/// Fixed helpers embedded into every generated file. They mirror the
/// linked-structure round-trip semantics of the capture-side plugins.
const HELPERS: &str = "\
fn build_list(items: &[i64]) -> Option<Box<ListNode>> {
    let mut head = None;
    for &val in items.iter().rev() {
        head = Some(Box::new(ListNode { val, next: head }));
    }
    head
}

fn flatten_list(mut head: Option<Box<ListNode>>) -> Vec<i64> {
    let mut items = Vec::new();
    while let Some(node) = head {
        items.push(node.val);
        head = node.next;
    }
    items
}
";

const CASE_DECL: &str = "\
struct Case {
    input: &'static [i64],
    arg: i64,
    expected: &'static [i64],
    fault: &'static str,
}
";

fn render_case(index: usize, snapshot: &Snapshot) -> Result<String, RenderError> {
    if snapshot.inputs_repr.len() != 2 {
        return Err(RenderError::Arity {
            index,
            got: snapshot.inputs_repr.len(),
        });
    }
    let input = plain_seq_literal(&snapshot.inputs_repr[0]).ok_or(RenderError::InputShape {
        index,
        position: 0,
        expected: "plain sequence",
    })?;
    let Repr::Int(arg) = snapshot.inputs_repr[1] else {
        return Err(RenderError::InputShape {
            index,
            position: 1,
            expected: "scalar integer",
        });
    };
    let expected = match &snapshot.return_value_repr {
        // Unit returns render as the empty sequence, matching what the
        // helper yields for an absent head.
        None => "&[]".to_string(),
        Some(repr) => {
            plain_seq_literal(repr).ok_or(RenderError::ReturnShape { index })?
        }
    };
    let fault = escape(&snapshot.exception_repr);
    Ok(format!(
        "Case {{ input: {input}, arg: {arg}, expected: {expected}, fault: \"{fault}\" }},"
    ))
}

fn plain_seq_literal(repr: &Repr) -> Option<String> {
    let items = repr.as_plain_seq()?;
    let rendered: Vec<String> = items.iter().map(i64::to_string).collect();
    Some(format!("&[{}]", rendered.join(", ")))
}

fn escape(text: &str) -> String {
    text.escape_default().to_string()
}

/// Lowercase the identifier into a legal test-function stem.
fn test_fn_name(identifier: &str) -> Result<String, RenderError> {
    let stem: String = identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() || !stem.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(RenderError::BadIdentifier(identifier.to_string()));
    }
    Ok(stem)
}

fn indent(text: &str, pad: &str) -> String {
    let mut out = String::new();
    for line in text.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(pad);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
