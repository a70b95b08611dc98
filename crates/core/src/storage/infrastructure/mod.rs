pub mod gcs_blob_store;
pub mod url_signer;
