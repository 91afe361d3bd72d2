use rtrb::{Consumer, Producer, RingBuffer};

use crate::cue::{Cue, Stinger, Transition};

/// Everything the control thread can add to a [`crate::MusicManager`]'s
/// [`crate::MusicDatabase`]. Authoring is append-only and has no real-time
/// deadline, so it gets its own narrow queue rather than riding the engine's
/// general `AudioCommand` channel — that keeps `ae-bridge` from needing to
/// know about music-authoring types at all.
pub enum MusicAuthoringCommand {
    AddCue(Cue),
    AddTransition(Transition),
    AddStinger(Stinger),
}

pub struct MusicAuthoringSender {
    producer: Producer<MusicAuthoringCommand>,
}

impl MusicAuthoringSender {
    pub fn send(&mut self, command: MusicAuthoringCommand) -> bool {
        match self.producer.push(command) {
            Ok(()) => true,
            Err(rtrb::PushError::Full(_)) => {
                log::warn!("music authoring queue full, dropping command");
                false
            }
        }
    }
}

pub struct MusicAuthoringReceiver {
    consumer: Consumer<MusicAuthoringCommand>,
}

impl MusicAuthoringReceiver {
    pub fn pop(&mut self) -> Option<MusicAuthoringCommand> {
        self.consumer.pop().ok()
    }
}

pub struct MusicAuthoringBridge;

impl MusicAuthoringBridge {
    pub fn build(capacity: usize) -> (MusicAuthoringSender, MusicAuthoringReceiver) {
        let (producer, consumer) = RingBuffer::<MusicAuthoringCommand>::new(capacity);
        (MusicAuthoringSender { producer }, MusicAuthoringReceiver { consumer })
    }
}
