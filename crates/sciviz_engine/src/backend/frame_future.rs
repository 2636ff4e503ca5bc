//! Waitable handle for asynchronous frames

use super::device::{DeviceError, DeviceResult, FrameStats};
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};

/// Pending frame. Dropping it abandons the frame without cancelling it.
#[derive(Debug)]
pub struct FrameFuture {
    receiver: Receiver<DeviceResult<FrameStats>>,
    result: Option<DeviceResult<FrameStats>>,
}

/// Completion side of a [`FrameFuture`], held by the device
#[derive(Debug)]
pub struct FrameCompleter {
    sender: Sender<DeviceResult<FrameStats>>,
}

impl FrameCompleter {
    /// Publish the frame result. Ignored if the future was dropped.
    pub fn complete(self, result: DeviceResult<FrameStats>) {
        if self.sender.send(result).is_err() {
            log::debug!("Frame completed after its future was dropped");
        }
    }
}

impl FrameFuture {
    /// A future and the sender that completes it
    pub fn pending() -> (Self, FrameCompleter) {
        let (sender, receiver) = bounded(1);
        (
            Self {
                receiver,
                result: None,
            },
            FrameCompleter { sender },
        )
    }

    /// A future that is already done
    pub fn ready(result: DeviceResult<FrameStats>) -> Self {
        let (future, completer) = Self::pending();
        completer.complete(result);
        future
    }

    /// Poll without blocking
    pub fn is_ready(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(result) => {
                self.result = Some(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.result = Some(Err(DeviceError::FrameDropped));
                true
            }
        }
    }

    /// Block until the frame is done
    pub fn wait(mut self) -> DeviceResult<FrameStats> {
        if let Some(result) = self.result.take() {
            return result;
        }
        self.receiver.recv().unwrap_or(Err(DeviceError::FrameDropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> FrameStats {
        FrameStats {
            frame: 1,
            accumulation: 1,
            variance: 1.0,
            instance_count: 0,
        }
    }

    #[test]
    fn test_pending_then_complete() {
        let (mut future, completer) = FrameFuture::pending();
        assert!(!future.is_ready());
        completer.complete(Ok(stats()));
        assert!(future.is_ready());
        assert_eq!(future.wait().unwrap(), stats());
    }

    #[test]
    fn test_dropped_completer() {
        let (future, completer) = FrameFuture::pending();
        drop(completer);
        assert_eq!(future.wait(), Err(DeviceError::FrameDropped));
    }

    #[test]
    fn test_wait_across_threads() {
        let (future, completer) = FrameFuture::pending();
        let worker = std::thread::spawn(move || completer.complete(Ok(stats())));
        assert_eq!(future.wait().unwrap().frame, 1);
        worker.join().unwrap();
    }
}
