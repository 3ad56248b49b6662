use auditrail_application::IdentifierGenerator;
use auditrail_core::RecordId;
use uuid::Uuid;

/// Identifier source backed by random v4 UUIDs rendered as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdentifierGenerator;

impl UuidIdentifierGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdentifierGenerator for UuidIdentifierGenerator {
    fn next_id(&self) -> RecordId {
        RecordId::from_uuid(Uuid::new_v4())
    }
}
