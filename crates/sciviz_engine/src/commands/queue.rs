//! Cross-thread command channel
//!
//! Any thread may submit commands through a [`CommandSender`]; the render
//! loop drains the [`CommandQueue`] once per frame, so the scene itself is
//! only ever touched from the loop.

use crate::commands::{CommandOutcome, SceneCommand};
use crate::core::error::{SceneError, SceneResult};
use crate::scene::Scene;
use crossbeam::channel::{bounded, unbounded, Receiver, Sender, TryRecvError};

type ReplySender = Sender<SceneResult<CommandOutcome>>;

struct Envelope {
    command: SceneCommand,
    reply: Option<ReplySender>,
}

/// Receiving end, owned by the render loop
#[derive(Debug)]
pub struct CommandQueue {
    sender: Sender<Envelope>,
    receiver: Receiver<Envelope>,
}

/// Submitting end, cheap to clone across threads
#[derive(Debug, Clone)]
pub struct CommandSender {
    sender: Sender<Envelope>,
}

/// Pending result of a submitted command
#[derive(Debug)]
pub struct CommandReply {
    receiver: Receiver<SceneResult<CommandOutcome>>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("command", &self.command.name())
            .field("reply", &self.reply.is_some())
            .finish()
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    /// Empty queue
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// New submitting handle
    pub fn sender(&self) -> CommandSender {
        CommandSender {
            sender: self.sender.clone(),
        }
    }

    /// Commands waiting to be applied
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Apply every waiting command in arrival order, returning how many
    /// were applied. A failing command does not stop the others; its error
    /// goes back to the submitter, or to the log when nobody waits for it.
    pub fn drain(&self, scene: &mut Scene) -> usize {
        let mut applied = 0;
        loop {
            let envelope = match self.receiver.try_recv() {
                Ok(envelope) => envelope,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            };
            let name = envelope.command.name();
            let result = envelope.command.apply(scene);
            applied += 1;
            match envelope.reply {
                Some(reply) => {
                    if let Err(err) = reply.send(result) {
                        log::warn!("Reply to '{}' dropped: {:?}", name, err.into_inner());
                    }
                }
                None => {
                    if let Err(err) = result {
                        log::warn!("Command '{}' failed: {}", name, err);
                    }
                }
            }
        }
        if applied > 0 {
            log::debug!("Applied {} command(s)", applied);
        }
        applied
    }
}

impl CommandSender {
    fn send(&self, command: SceneCommand, reply: Option<ReplySender>) -> SceneResult<()> {
        self.sender
            .send(Envelope { command, reply })
            .map_err(|err| SceneError::Disconnected(format!("command '{}' not delivered", err.0.command.name())))
    }

    /// Queue a command without waiting for its result
    pub fn submit(&self, command: SceneCommand) -> SceneResult<()> {
        self.send(command, None)
    }

    /// Queue a command and get a handle on its result
    pub fn request(&self, command: SceneCommand) -> SceneResult<CommandReply> {
        let (reply, receiver) = bounded(1);
        self.send(command, Some(reply))?;
        Ok(CommandReply { receiver })
    }

    /// Queue a command and block until the render loop applied it.
    ///
    /// Must not be called from the thread that drains the queue.
    pub fn execute(&self, command: SceneCommand) -> SceneResult<CommandOutcome> {
        self.request(command)?.wait()
    }
}

impl CommandReply {
    /// Block until the command was applied
    pub fn wait(self) -> SceneResult<CommandOutcome> {
        self.receiver
            .recv()
            .map_err(|_| SceneError::Disconnected("command queue dropped before reply".to_string()))?
    }

    /// Result, if the command was applied already
    pub fn try_wait(&self) -> Option<SceneResult<CommandOutcome>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SceneError::Disconnected(
                "command queue dropped before reply".to_string(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceRef, HeadlessDevice};
    use crate::core::error::ErrorKind;
    use crate::ecs::components::{Geometry, GeometryComponent, Sphere};
    use crate::ecs::Model;
    use crate::foundation::math::Vec3;
    use std::sync::Arc;

    fn scene() -> Scene {
        let device: DeviceRef = Arc::new(HeadlessDevice::new());
        Scene::new(&device).unwrap()
    }

    fn spheres() -> Model {
        Model::new("spheres").with_component(GeometryComponent::new(Geometry::Spheres(vec![
            Sphere::new(Vec3::zeros(), 1.0),
        ])))
    }

    #[test]
    fn test_drain_in_arrival_order() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        let first = sender.request(SceneCommand::AddModel(spheres())).unwrap();
        sender.submit(SceneCommand::SetVisible { id: 1, visible: false }).unwrap();
        let second = sender.request(SceneCommand::AddModel(spheres())).unwrap();
        assert!(first.try_wait().is_none());
        assert_eq!(queue.len(), 3);

        let mut scene = scene();
        assert_eq!(queue.drain(&mut scene), 3);
        assert!(queue.is_empty());
        assert_eq!(first.wait().unwrap(), CommandOutcome::Id(1));
        assert_eq!(second.wait().unwrap(), CommandOutcome::Id(2));
        assert!(!scene.models().get(1).unwrap().is_visible());
    }

    #[test]
    fn test_failure_reaches_submitter_and_others_still_apply() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        let bad = sender.request(SceneCommand::RemoveModels(vec![7])).unwrap();
        sender.submit(SceneCommand::SetColor { id: 9, color: [1.0; 4] }).unwrap();
        let good = sender.request(SceneCommand::AddModel(spheres())).unwrap();

        let mut scene = scene();
        assert_eq!(queue.drain(&mut scene), 3);
        assert_eq!(bad.wait().unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(good.wait().unwrap(), CommandOutcome::Id(1));
    }

    #[test]
    fn test_execute_from_worker_thread() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        let worker = std::thread::spawn(move || sender.execute(SceneCommand::AddModel(spheres())));

        let mut scene = scene();
        while queue.drain(&mut scene) == 0 {
            std::thread::yield_now();
        }
        assert_eq!(worker.join().unwrap().unwrap(), CommandOutcome::Id(1));
    }

    #[test]
    fn test_disconnected() {
        let queue = CommandQueue::new();
        let sender = queue.sender();
        let reply = sender.request(SceneCommand::Clear).unwrap();
        drop(queue);
        let err = sender.submit(SceneCommand::Clear).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Disconnected);
        drop(sender);
        assert_eq!(reply.wait().unwrap_err().kind(), ErrorKind::Disconnected);
    }
}
