mod data;
mod executable;
mod lock;
mod settings;
mod stable;

pub use data::VaultData;
pub use executable::ExecutableVault;
pub use lock::Lock;
pub use settings::VaultSettings;
pub use stable::StableVault;
