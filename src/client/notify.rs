pub const EMPTY_MESSAGE_WARNING: &str =
    "The message cannot be empty. Please enter a message to continue.";
pub const REQUEST_FAILED_ERROR: &str =
    "An error occurred while fetching the response. Please try again later.";

/// User-visible notifications.
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Prints notifications to stderr, keeping stdout for the transcript.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn warn(&self, message: &str) {
        eprintln!("[warn] {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("[error] {}", message);
    }
}
