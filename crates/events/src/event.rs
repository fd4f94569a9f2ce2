use chrono::{DateTime, Utc};

/// A fact emitted by an aggregate when a command is accepted.
///
/// Each event type carries a dotted name (`"<crate>.<record>.<verb>"`) and a
/// schema version so serialized events stay readable after their shape changes.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time at which the change took effect.
    fn occurred_at(&self) -> DateTime<Utc>;
}
