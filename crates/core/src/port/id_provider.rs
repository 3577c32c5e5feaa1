// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic run IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique run ID
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Fixed ID provider (tests)
pub struct FixedIdProvider(pub String);

impl IdProvider for FixedIdProvider {
    fn generate_id(&self) -> String {
        self.0.clone()
    }
}
