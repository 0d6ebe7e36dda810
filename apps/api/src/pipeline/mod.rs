/// Processing pipeline: one server-side session per uploaded CV.
///
/// `session` holds the pure state machine, `runner` drives it through the
/// gateway and store, `sessions` is the live registry, `upload` validates input.
pub mod handlers;
pub mod runner;
pub mod session;
pub mod sessions;
pub mod upload;
