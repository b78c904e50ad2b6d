//! Durable session storage port

use crate::domain::result::Result;
use crate::domain::Session;

/// Where the session survives restarts
///
/// Only `SessionStore` calls this; nothing else may write the session.
pub trait SessionStorage: Send + Sync {
    /// Load the persisted session, `None` when nothing usable is stored
    fn load(&self) -> Result<Option<Session>>;

    fn save(&self, session: &Session) -> Result<()>;

    fn clear(&self) -> Result<()>;
}
