pub mod handle;
pub mod manager;
pub mod types;

pub use handle::{
    CancelToken,
    TaskHandle,
};
pub use manager::TaskManager;
pub use types::TaskResult;
