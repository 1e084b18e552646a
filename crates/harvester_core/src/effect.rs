use crate::ListingRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ScanPage { page: usize, attempt: ScanAttempt },
    ResolveRow { page: usize, row: ListingRow },
    Paginate { page: usize },
    Finish { reason: FinishReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanAttempt {
    First,
    /// The previous scan of this page found no data rows.
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Exhausted,
    EmptyPage,
    PageCap,
    PaginationFailed,
}
