pub mod error;
pub mod oauth;
pub mod stream;
pub mod types;

pub use error::{Result, TwitterError};
pub use oauth::Credentials;
pub use stream::{FilteredStream, StreamFilter};
pub use types::{Entities, Hashtag, Status, UserMention};
