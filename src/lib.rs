pub mod config;
pub use config::Config;

pub mod context;
pub use context::{ActionContext, ActionRequest};

pub mod dispatcher;
pub use dispatcher::{router, Dispatcher};

pub mod errors;

pub mod faces;
pub use faces::{MattermostFace, MessagingHost};

pub mod providers;
pub use providers::GifProvider;

pub mod shuffler;
pub use shuffler::{ActionKind, Shuffler};

pub mod triggers;

#[cfg(test)]
mod testing;
