/// User ids are the identity provider's opaque subject strings.
pub type UserId = String;

/// Character ids are generated UUIDs, used as document keys.
pub type CharacterId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh character document id.
pub fn new_character_id() -> CharacterId {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a fresh visualization entry id.
pub fn new_visualization_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
