// Placement assistant chat engine.
// Resolver and responder are pure; sessions own the only mutable state.
// Nothing in here performs network, database, or resume-parsing I/O.

pub mod conversation;
pub mod handlers;
pub mod intent;
pub mod knowledge;
pub mod resolver;
pub mod responder;
pub mod session;
