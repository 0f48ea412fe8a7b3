//! Remote request state: the four-state result cell, the request error
//! taxonomy, and the staleness guard for overlapping fetches.
//!
//! Every daemon call site stores a `RemoteData` so the caller always
//! distinguishes "never asked" from "in flight" from "failed".

use thiserror::Error;

/// Why a daemon request failed.
///
/// Transport problems, bad HTTP statuses and schema mismatches are kept
/// apart so callers can retry, notify, or report them differently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Connection or transport failure before a response arrived.
    #[error("Network failure: {0}")]
    Network(String),

    /// The daemon answered with a non-2xx status.
    #[error("Daemon returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    /// The response arrived but did not match the expected schema.
    /// Includes unrecognized enum values; never coerced to a default.
    #[error("Decode failure: {0}")]
    Decode(String),

    /// The request exceeded the configured per-request timeout.
    #[error("Request timed out")]
    Timeout,
}

/// State of a single remote request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemoteData<T> {
    /// No request has been issued yet.
    #[default]
    NotAsked,
    /// A request is in flight.
    Loading,
    /// The request succeeded.
    Success(T),
    /// The request failed.
    Failure(ApiError),
}

impl<T> RemoteData<T> {
    pub fn is_not_asked(&self) -> bool {
        matches!(self, RemoteData::NotAsked)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RemoteData::Loading)
    }

    /// The successful value, if any.
    pub fn success(&self) -> Option<&T> {
        match self {
            RemoteData::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteData<U> {
        match self {
            RemoteData::NotAsked => RemoteData::NotAsked,
            RemoteData::Loading => RemoteData::Loading,
            RemoteData::Success(value) => RemoteData::Success(f(value)),
            RemoteData::Failure(err) => RemoteData::Failure(err),
        }
    }

    /// Fold a completed request result into the cell.
    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => RemoteData::Success(value),
            Err(err) => RemoteData::Failure(err),
        }
    }
}

/// Monotone sequence guard for overlapping requests to one endpoint.
///
/// There is no request cancellation: a superseded response still arrives
/// and must be ignored. `begin` stamps each outgoing request; a response
/// is only applied when `try_complete` accepts its stamp, so a slow stale
/// response can never clobber the result of a newer request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latest {
    issued: u64,
    applied: u64,
}

impl Latest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new outgoing request.
    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    /// Accept a response stamped `seq`. Returns false for responses older
    /// than one already applied; the caller must then drop the payload.
    pub fn try_complete(&mut self, seq: u64) -> bool {
        if seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }

    /// Whether a request newer than every applied response is in flight.
    pub fn in_flight(&self) -> bool {
        self.issued > self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_data_default_not_asked() {
        let cell: RemoteData<u32> = RemoteData::default();
        assert!(cell.is_not_asked());
        assert!(cell.success().is_none());
    }

    #[test]
    fn test_remote_data_from_result() {
        let ok: RemoteData<u32> = RemoteData::from_result(Ok(7));
        assert_eq!(ok.success(), Some(&7));

        let err: RemoteData<u32> = RemoteData::from_result(Err(ApiError::Timeout));
        assert_eq!(err, RemoteData::Failure(ApiError::Timeout));
    }

    #[test]
    fn test_remote_data_map() {
        let cell = RemoteData::Success(2).map(|n| n * 10);
        assert_eq!(cell.success(), Some(&20));

        let loading: RemoteData<u32> = RemoteData::Loading;
        assert!(loading.map(|n| n * 10).is_loading());
    }

    #[test]
    fn test_latest_in_order() {
        let mut guard = Latest::new();
        let a = guard.begin();
        let b = guard.begin();
        assert!(guard.try_complete(a));
        assert!(guard.try_complete(b));
        assert!(!guard.in_flight());
    }

    #[test]
    fn test_latest_rejects_stale_response() {
        let mut guard = Latest::new();
        let a = guard.begin();
        let b = guard.begin();

        // B's response overtakes A's.
        assert!(guard.try_complete(b));
        assert!(!guard.try_complete(a));
    }

    #[test]
    fn test_latest_in_flight() {
        let mut guard = Latest::new();
        assert!(!guard.in_flight());
        let seq = guard.begin();
        assert!(guard.in_flight());
        guard.try_complete(seq);
        assert!(!guard.in_flight());
    }
}
