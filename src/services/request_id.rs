use uuid::Uuid;

/// Identifies one in-flight catalog fetch
///
/// The orchestrator stamps each listing or detail fetch with a fresh id and
/// only commits a result whose id is still the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Creates a new random request ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span for a fetch tagged with its request id
pub fn fetch_span(operation: &'static str, request_id: RequestId) -> tracing::Span {
    tracing::info_span!(
        "catalog_fetch",
        operation = operation,
        request_id = %request_id,
    )
}
