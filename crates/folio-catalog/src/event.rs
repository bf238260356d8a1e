use serde::Serialize;

/// Change notification sent to catalog subscribers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// A new snapshot replaced the previous one.
    Refreshed { revision: u64, count: usize },
    /// A reload failed; the previous snapshot is still being served.
    RefreshFailed { message: String },
}

/// Load state alongside the snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStatus {
    /// A refresh is in flight.
    pub loading: bool,
    /// Message of the last failed refresh, cleared by the next success.
    pub error: Option<String>,
    /// Incremented on every successful refresh. Zero means never loaded.
    pub revision: u64,
}
