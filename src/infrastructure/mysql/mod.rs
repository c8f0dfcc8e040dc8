pub mod connector;
pub mod table_loader;
