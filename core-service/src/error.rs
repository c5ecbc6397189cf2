use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Runtime(#[from] core_runtime::RuntimeError),

    #[error(transparent)]
    Offline(#[from] core_offline::OfflineError),

    #[error(transparent)]
    Update(#[from] core_update::UpdateError),

    #[error(transparent)]
    Worker(#[from] core_worker::WorkerError),

    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
