/// A record that keeps its identity while its attributes change.
///
/// Donors are entities: re-registering the same person yields a new `DonorId`,
/// and two donors with identical fields are still different donors.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
