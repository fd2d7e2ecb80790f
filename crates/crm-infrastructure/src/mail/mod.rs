//! E-mail notifiers (adapters for the `Notifier` port)

pub mod renderer;
pub mod smtp;
pub mod console;

pub use renderer::{MailRenderer, RenderedMail};
pub use smtp::SmtpNotifier;
pub use console::ConsoleNotifier;
