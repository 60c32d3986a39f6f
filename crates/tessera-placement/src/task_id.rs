//! Task id generation.

use tessera_core::PathId;

/// Produces a fresh, unique task id for an app.
pub trait TaskIdGenerator {
    fn generate(&self, app_id: &PathId) -> String;
}

/// `<safe_path>.<uuid-v4>`, e.g. `prod_api.5f0c…`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidTaskIds;

impl TaskIdGenerator for UuidTaskIds {
    fn generate(&self, app_id: &PathId) -> String {
        format!("{}.{}", app_id.safe_path(), uuid::Uuid::new_v4())
    }
}

impl<F> TaskIdGenerator for F
where
    F: Fn(&PathId) -> String,
{
    fn generate(&self, app_id: &PathId) -> String {
        self(app_id)
    }
}
