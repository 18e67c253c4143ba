mod store_registry;

pub use store_registry::StoreRegistry;
