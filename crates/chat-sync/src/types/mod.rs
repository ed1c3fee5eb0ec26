pub mod models;
pub mod request;
pub mod response;
pub mod session;

pub use models::{Channel, ChannelKind, LoginResponse, Message, MessageAuthor, Server, ServerList};
pub use request::ApiRequest;
pub use response::ApiResponse;
pub use session::{Session, UserProfile};
