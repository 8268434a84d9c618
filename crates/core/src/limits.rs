//! Size limits for ingested events and query parameters.
//!
//! The `#[validate]` derive macro requires literal values in attributes,
//! so field limits are duplicated there. Keep both in sync when modifying.

// === Request Limits ===

/// Maximum ingest request body size in bytes (64KB).
///
/// A single event per request; anything larger is not a browser event.
pub const MAX_EVENT_BODY_BYTES: usize = 64 * 1024;

/// Maximum serialized `data` payload size in bytes (16KB).
pub const MAX_EVENT_DATA_BYTES: usize = 16 * 1024;

// === String Field Limits (chars) ===

/// Page path max length.
pub const MAX_PAGE_LEN: usize = 2000;

/// Referrer URL max length.
/// Matches HTTP Referer header limit.
pub const MAX_REFERRER_LEN: usize = 2048;

/// Session and user identifier max length.
pub const MAX_ID_LEN: usize = 128;

/// User agent string max length. Longer values are truncated, not rejected.
pub const MAX_USER_AGENT_LEN: usize = 512;

/// IP address max length (IPv6 = 45 chars).
pub const MAX_IP_LEN: usize = 45;

// === Query Limits ===

/// Default page size for raw event listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Maximum page size for raw event listings.
pub const MAX_PAGE_LIMIT: u32 = 100;
