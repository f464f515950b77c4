pub mod function;
pub mod store;
pub mod utils;

pub use function::HashFunction;
pub use store::HashStore;
pub use utils::{bulk_hash, sidecar_path, update_hash, update_hash_all};
