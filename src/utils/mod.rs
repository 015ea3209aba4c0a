pub mod short_id;
pub mod url_validator;

pub use short_id::{SHORT_ID_LENGTH, generate_short_id, is_valid_short_id};
pub use url_validator::normalize_url;
