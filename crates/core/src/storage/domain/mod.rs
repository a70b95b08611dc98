pub mod blob_store;
pub mod output_path;
pub mod uri_resolver;
