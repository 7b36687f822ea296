//! Handle to a running game-loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use ballpit_core::commands::InputEvent;
use ballpit_core::state::Stats;

/// Commands sent to the game-loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// A platform event, applied before the next frame.
    Input(InputEvent),
    /// Stop the loop after the current frame.
    Shutdown,
}

/// Owner side of a game-loop thread.
///
/// The engine itself lives inside the thread. Input goes in through the
/// channel; stats of the last frame come back through shared state.
pub struct LoopHandle {
    commands: mpsc::Sender<LoopCommand>,
    latest_stats: Arc<Mutex<Option<Stats>>>,
    thread: Option<JoinHandle<()>>,
}

impl LoopHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<LoopCommand>,
        latest_stats: Arc<Mutex<Option<Stats>>>,
        thread: JoinHandle<()>,
    ) -> Self {
        Self {
            commands,
            latest_stats,
            thread: Some(thread),
        }
    }

    /// Forward an input event. Returns `false` once the loop has stopped.
    pub fn send(&self, event: InputEvent) -> bool {
        self.commands.send(LoopCommand::Input(event)).is_ok()
    }

    /// Stats published after the most recent frame.
    pub fn latest(&self) -> Option<Stats> {
        self.latest_stats.lock().ok().and_then(|stats| stats.clone())
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the loop and wait for the thread. Returns `false` if the thread
    /// panicked.
    pub fn shutdown(mut self) -> bool {
        let _ = self.commands.send(LoopCommand::Shutdown);
        self.thread.take().map_or(true, |t| t.join().is_ok())
    }
}

impl Drop for LoopHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(LoopCommand::Shutdown);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_channel_keeps_order() {
        let (tx, rx) = mpsc::channel::<LoopCommand>();
        tx.send(LoopCommand::Input(InputEvent::key_down("KeyP"))).unwrap();
        tx.send(LoopCommand::Input(InputEvent::MouseDown)).unwrap();
        tx.send(LoopCommand::Shutdown).unwrap();

        let commands: Vec<LoopCommand> = rx.try_iter().collect();
        assert_eq!(commands.len(), 3);
        assert!(matches!(
            &commands[0],
            LoopCommand::Input(InputEvent::KeyDown { code }) if code == "KeyP"
        ));
        assert!(matches!(commands[1], LoopCommand::Input(InputEvent::MouseDown)));
        assert!(matches!(commands[2], LoopCommand::Shutdown));
    }
}
