//! Collaborators outside the timer itself
//!
//! Desktop notifications, screen locking and launch-at-login registration.

pub mod lock;
pub mod login_item;
pub mod notify;

// Re-export main types
pub use lock::{LockMethod, ScreenLocker, SessionLocker};
pub use login_item::LoginItem;
pub use notify::{DesktopNotifier, Notice, Notifier};
