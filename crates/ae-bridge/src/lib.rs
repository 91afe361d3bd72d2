//! The lock-free command/message bridge between the control thread and the
//! audio thread: bounded SPSC queues carrying typed, allocation-free
//! payloads in each direction.

pub mod command;
pub mod message;
pub mod queue;

pub use command::AudioCommand;
pub use message::AudioMessage;
pub use queue::{CommandBridge, CommandReceiver, CommandSender, MessageReceiver, MessageSender};
