use vows_core::error::CoreError;
use vows_db::stores::StoreError;

/// Failures that abort an engine operation.
///
/// Policy rejections, provider errors and duplicate webhooks are recorded
/// as data and never show up here; only storage faults and caller errors do.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
