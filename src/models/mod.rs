pub mod preview;
pub mod url;

pub use self::preview::{LinkPreview, QrDescriptor};
pub use self::url::{
    BulkCreateItem, BulkCreateResult, BulkDeleteResult, CreateUrlRequest, Mapping,
};
