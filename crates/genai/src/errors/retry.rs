/// Classification for retry policy.
///
/// Used by callers to decide how to respond to a failed `generateContent`
/// call.
///
/// # Behavior Summary
///
/// | Class | Retry? |
/// |-------|--------|
/// | `Never` | No - surface the failure |
/// | `WithBackoff` | Yes - exponential backoff up to the caller's attempt budget |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Terminal failure - bad credentials, exhausted quota, malformed reply.
    /// Resending the same request cannot help.
    Never,

    /// Transient failure such as rate limiting (429) or a timeout.
    /// Retry with exponential backoff.
    WithBackoff,
}
