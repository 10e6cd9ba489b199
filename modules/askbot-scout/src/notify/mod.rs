pub mod backend;
pub mod email;
pub mod noop;
pub mod router;
pub mod slack;

pub use backend::{Digest, NotifyBackend};
pub use router::NotifyRouter;
