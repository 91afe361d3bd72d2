use rtrb::{Consumer, Producer, RingBuffer};

use crate::command::AudioCommand;
use crate::message::AudioMessage;

/// Control-thread handle onto the command queue. `send` never blocks and
/// never allocates; on overflow the command is dropped and logged, exactly
/// as the audio thread's message side does for messages.
pub struct CommandSender {
    producer: Producer<AudioCommand>,
}

impl CommandSender {
    pub fn send(&mut self, command: AudioCommand) -> bool {
        match self.producer.push(command) {
            Ok(()) => true,
            Err(rtrb::PushError::Full(command)) => {
                log::warn!("command queue full, dropping {command:?}");
                false
            }
        }
    }

    pub fn available_space(&self) -> usize {
        self.producer.slots()
    }
}

/// Audio-thread handle onto the command queue. Drained to empty at the top
/// of every callback.
pub struct CommandReceiver {
    consumer: Consumer<AudioCommand>,
}

impl CommandReceiver {
    pub fn pop(&mut self) -> Option<AudioCommand> {
        self.consumer.pop().ok()
    }

    pub fn drain(&mut self, mut apply: impl FnMut(AudioCommand)) {
        while let Ok(command) = self.consumer.pop() {
            apply(command);
        }
    }
}

/// Audio-thread handle onto the message queue.
pub struct MessageSender {
    producer: Producer<AudioMessage>,
}

impl MessageSender {
    pub fn send(&mut self, message: AudioMessage) -> bool {
        match self.producer.push(message) {
            Ok(()) => true,
            Err(rtrb::PushError::Full(message)) => {
                log::warn!("message queue full, dropping {message:?}");
                false
            }
        }
    }
}

/// Control-thread handle onto the message queue, drained opportunistically.
pub struct MessageReceiver {
    consumer: Consumer<AudioMessage>,
}

impl MessageReceiver {
    pub fn poll(&mut self) -> Option<AudioMessage> {
        self.consumer.pop().ok()
    }

    pub fn drain(&mut self, mut handle: impl FnMut(AudioMessage)) {
        while let Ok(message) = self.consumer.pop() {
            handle(message);
        }
    }
}

/// Constructs both bounded SPSC queues and splits them into their
/// control-side and audio-side halves in one call, handing out
/// producer/consumer pairs at construction rather than exposing the raw
/// ring buffers.
pub struct CommandBridge;

impl CommandBridge {
    pub fn build(
        command_capacity: usize,
        message_capacity: usize,
    ) -> (CommandSender, CommandReceiver, MessageSender, MessageReceiver) {
        let (command_producer, command_consumer) = RingBuffer::<AudioCommand>::new(command_capacity);
        let (message_producer, message_consumer) = RingBuffer::<AudioMessage>::new(message_capacity);
        (
            CommandSender { producer: command_producer },
            CommandReceiver { consumer: command_consumer },
            MessageSender { producer: message_producer },
            MessageReceiver { consumer: message_consumer },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_silently_on_overflow() {
        let (mut tx, mut rx, _msg_tx, _msg_rx) = CommandBridge::build(2, 2);
        assert!(tx.send(AudioCommand::StopAllVoices { stop_time: 0 }));
        assert!(tx.send(AudioCommand::Shutdown));
        assert!(!tx.send(AudioCommand::Shutdown));

        let mut seen = 0;
        rx.drain(|_| seen += 1);
        assert_eq!(seen, 2);
    }

    #[test]
    fn messages_drain_in_emission_order() {
        let (_tx, _rx, mut msg_tx, mut msg_rx) = CommandBridge::build(4, 4);
        msg_tx.send(AudioMessage::MusicFinished);
        msg_tx.send(AudioMessage::ContextNumVoices { num_voices: 3 });
        assert!(matches!(msg_rx.poll(), Some(AudioMessage::MusicFinished)));
        assert!(matches!(msg_rx.poll(), Some(AudioMessage::ContextNumVoices { num_voices: 3 })));
        assert!(msg_rx.poll().is_none());
    }
}
