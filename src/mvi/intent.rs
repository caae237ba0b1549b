/// Marker trait for intents: user actions and server replies that may
/// change a state machine.
pub trait Intent: Send + 'static {}
