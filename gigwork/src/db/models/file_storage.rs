/// Request to store file content
#[derive(Debug, Clone)]
pub struct FileStorageRequest {
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Response from storing file content
#[derive(Debug, Clone)]
pub struct FileStorageResponse {
    /// Storage key to save in database - for the local backend a relative path (e.g. "3f/3fa8...dat")
    pub storage_key: String,
}
