/// Marker trait for state-machine snapshots.
///
/// Snapshots are cloned rather than mutated in place, and compared to
/// decide which view elements need updating.
pub trait State: Clone + PartialEq + Default + Send + 'static {}
