//! Telegram adapter: long polling, keyboards and dialog handlers on top of
//! the `etb-core` ports.

pub mod callback_data;
pub mod keyboards;
pub mod render;
pub mod router;

mod handlers;

pub use router::{run_polling, AppState};
