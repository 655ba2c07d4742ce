pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Limit/offset pair after normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub offset: u64,
}

impl PageWindow {
    /// A limit outside `(0, MAX_LIMIT]` falls back to `DEFAULT_LIMIT`; a
    /// negative offset becomes 0. Offset has no upper bound.
    pub fn normalize(limit: i64, offset: i64) -> Self {
        let limit = match u64::try_from(limit) {
            Ok(l) if l > 0 && l <= MAX_LIMIT => l,
            _ => DEFAULT_LIMIT,
        };
        let offset = u64::try_from(offset).unwrap_or(0);
        Self { limit, offset }
    }
}
