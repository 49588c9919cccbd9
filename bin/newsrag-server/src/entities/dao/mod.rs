pub mod article;
pub mod message;
pub mod session;

pub use article::{ArticleRecord, NewArticle};
pub use message::{MessageRecord, Role};
pub use session::SessionRecord;
