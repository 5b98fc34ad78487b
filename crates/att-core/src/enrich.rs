//! Registration records and the session display join.

use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::types::UserId;

/// Department shown for sessions with no matching registration.
pub const DEFAULT_DEPARTMENT: &str = "General";

/// Laptop brand placeholder for sessions with no matching registration.
pub const DEFAULT_LAPTOP_BRAND: &str = "-";

/// A registration record supplying display metadata for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// The registered user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub laptop_brand: Option<String>,
}

/// Fills session display fields from registration records.
///
/// The first registration matching by user id (case-insensitive) or by
/// exact name wins. Sessions with no match, and matches with missing
/// fields, get [`DEFAULT_DEPARTMENT`]/[`DEFAULT_LAPTOP_BRAND`]. Pure
/// function of its inputs, so running it twice changes nothing.
pub fn enrich(sessions: &mut [Session], registers: &[Registration]) {
    for session in sessions {
        let matched = registers.iter().find(|reg| {
            reg.user_id.matches(session.user_id.as_str()) || reg.name == session.name
        });
        session.department = Some(
            matched
                .and_then(|reg| reg.department.clone())
                .unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string()),
        );
        session.laptop_brand = Some(
            matched
                .and_then(|reg| reg.laptop_brand.clone())
                .unwrap_or_else(|| DEFAULT_LAPTOP_BRAND.to_string()),
        );
    }
}
