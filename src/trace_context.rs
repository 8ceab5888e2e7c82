//! Ambient distributed-tracing context.
//!
//! The server runs every request inside a [`TraceContext`] scope: a child of
//! the caller's `traceparent` header when one arrives, a fresh root trace
//! otherwise. Anything running on that request's task can read it back with
//! [`TraceContext::current`] without it being threaded through signatures.
//!
//! The textual form is the W3C trace-context `traceparent` value:
//!
//! ```text
//! 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01
//! ^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ ^^^^^^^^^^^^^^^^ ^^
//! version        trace id                span id     flags
//! ```

use std::fmt;
use std::future::Future;

/// Request header carrying the caller's trace context.
pub const TRACEPARENT_HEADER: &str = "traceparent";

const VERSION: u8 = 0x00;
const FLAG_SAMPLED: u8 = 0x01;

tokio::task_local! {
    static CURRENT: TraceContext;
}

/// Position of one request within a distributed trace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TraceContext {
    trace_id: u128,
    span_id: u64,
    flags: u8,
}

impl TraceContext {
    /// Starts a new trace.
    pub fn new_root() -> Self {
        Self {
            trace_id: nonzero_u128(),
            span_id: nonzero_u64(),
            flags: FLAG_SAMPLED,
        }
    }

    /// A new span in the same trace, parented on `self`.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: nonzero_u64(),
            flags: self.flags,
        }
    }

    /// Parses a `traceparent` header value.
    ///
    /// Returns `None` for anything malformed, for the reserved version `ff`,
    /// and for all-zero trace or span ids. Future versions are accepted as
    /// long as the first four fields parse.
    pub fn parse(header: &str) -> Option<Self> {
        let mut fields = header.trim().split('-');
        let version = hex_field(fields.next()?, 2)?;
        let trace_id = hex_field(fields.next()?, 32)?;
        let span_id = hex_field(fields.next()?, 16)?;
        let flags = hex_field(fields.next()?, 2)?;

        if version == 0xff || (version == u128::from(VERSION) && fields.next().is_some()) {
            return None;
        }
        if trace_id == 0 || span_id == 0 {
            return None;
        }

        Some(Self {
            trace_id,
            span_id: span_id as u64,
            flags: flags as u8,
        })
    }

    pub fn trace_id(&self) -> u128 { self.trace_id }
    pub fn span_id(&self) -> u64 { self.span_id }

    pub fn is_sampled(&self) -> bool {
        self.flags & FLAG_SAMPLED != 0
    }

    /// The context of the request running on the current task, if any.
    pub fn current() -> Option<Self> {
        CURRENT.try_with(|ctx| *ctx).ok()
    }

    /// Runs `fut` with `self` as the ambient context.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{VERSION:02x}-{:032x}-{:016x}-{:02x}",
            self.trace_id, self.span_id, self.flags
        )
    }
}

/// Lowercase hex of exactly `len` digits.
fn hex_field(field: &str, len: usize) -> Option<u128> {
    let valid = field.len() == len
        && field.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !valid {
        return None;
    }
    u128::from_str_radix(field, 16).ok()
}

fn nonzero_u128() -> u128 {
    loop {
        let id = rand::random::<u128>();
        if id != 0 {
            return id;
        }
    }
}

fn nonzero_u64() -> u64 {
    loop {
        let id = rand::random::<u64>();
        if id != 0 {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";

    #[test]
    fn parse_and_display_agree() {
        let ctx = TraceContext::parse(SAMPLE).unwrap();
        assert_eq!(ctx.trace_id(), 0x4bf92f3577b34da6a3ce929d0e0e4736);
        assert_eq!(ctx.span_id(), 0x00f067aa0ba902b7);
        assert!(ctx.is_sampled());
        assert_eq!(ctx.to_string(), SAMPLE);
    }

    #[test]
    fn parse_rejects_malformed_values() {
        for bad in [
            "",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7",
            "00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01",
            "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01",
            "ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra",
            "00-+bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        ] {
            assert_eq!(TraceContext::parse(bad), None, "{bad:?}");
        }
    }

    #[test]
    fn child_keeps_the_trace() {
        let parent = TraceContext::parse(SAMPLE).unwrap();
        let child = parent.child();
        assert_eq!(child.trace_id(), parent.trace_id());
        assert_ne!(child.span_id(), 0);
    }

    #[test]
    fn roots_render_as_traceparent() {
        let root = TraceContext::new_root();
        let text = root.to_string();
        assert_eq!(text.len(), 55);
        assert!(text.starts_with("00-"));
        assert_eq!(TraceContext::parse(&text), Some(root));
    }

    #[tokio::test]
    async fn current_is_scoped_to_the_future() {
        assert_eq!(TraceContext::current(), None);

        let ctx = TraceContext::new_root();
        let seen = ctx.scope(async { TraceContext::current() }).await;
        assert_eq!(seen, Some(ctx));

        assert_eq!(TraceContext::current(), None);
    }
}
