mod chat;
mod explain;
mod generate;
mod health;
mod improve;
mod metrics;
mod models;

pub use chat::chat_handler;
pub use explain::explain_handler;
pub use generate::generate_handler;
pub use health::{health_handler, index_handler};
pub use improve::improve_handler;
pub use metrics::metrics_handler;
pub use models::models_handler;
