//! Key-encoded file registry.
//!
//! Files are tracked without a database: each file is one object whose key
//! carries its owner, id and name (see [`codec`]). Listing by prefix replaces
//! queries and a linear scan replaces an index (see [`lookup`]).

pub mod codec;
pub mod lookup;
pub mod policy;
mod service;
mod types;

pub use codec::{DecodedKey, decode_key, encode_key, infer_content_type, owner_prefix};
pub use lookup::{FileLookup, LinearScan};
pub use policy::ContentTypePolicy;
pub use service::FileRegistry;
pub use types::{
    DEFAULT_PRESIGN_EXPIRY, FileRecord, FileRecordWithContent, PresignedUpload, RegistryError,
    RegistrySettings, UploadItem,
};
