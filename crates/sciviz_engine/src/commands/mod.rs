//! Scene commands and the queue that serialises them with the render loop

mod command;
mod queue;

pub use command::{CommandOutcome, SceneCommand};
pub use queue::{CommandQueue, CommandReply, CommandSender};
