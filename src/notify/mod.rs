pub mod email;

pub use email::{BrevoNotifier, Notifier};
