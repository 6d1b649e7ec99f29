/// Identifiers are opaque text keys shared with the guest-management
/// collaborator. Ids minted by this engine are UUIDv7 strings.
pub type EntityId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Mint a new time-ordered identifier.
pub fn new_id() -> EntityId {
    uuid::Uuid::now_v7().to_string()
}
