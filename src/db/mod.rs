pub mod load;
pub mod migrate;
pub mod save;

pub use load::load_snapshot;
pub use migrate::migrate;
pub use save::save_snapshot;
