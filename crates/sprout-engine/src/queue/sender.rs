use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::coords::{Rect, Vec2};
use crate::error::SubmitError;
use crate::object::{ObjectDesc, ObjectId, SpriteIndex, SpriteQuad};

use super::{promise, Job, Pending, Reply};

/// Creates the producer and render-thread ends of a job queue.
///
/// The channel has no buffer: every submission waits for the render thread.
pub fn job_queue() -> (CommandQueue, JobReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(0);
    let queue = CommandQueue {
        tx,
        next_object: Arc::new(AtomicU64::new(1)),
    };
    (queue, JobReceiver { rx })
}

/// Producer end. Cheap to clone; hand one to each worker thread.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    tx: Sender<Job>,
    next_object: Arc<AtomicU64>,
}

impl CommandQueue {
    /// Hands `job` to the render thread, blocking until it is taken.
    pub fn submit(&self, job: Job) -> Result<(), SubmitError> {
        self.tx.send(job).map_err(|_| SubmitError::Disconnected)
    }

    /// Creates a render object on the render thread.
    ///
    /// Returns once the render thread has accepted the job; the handle can be
    /// used right away since later jobs from this thread run after it.
    pub fn create_object(&self, desc: ObjectDesc) -> Result<ObjectHandle, SubmitError> {
        let id = ObjectId(self.next_object.fetch_add(1, Ordering::Relaxed));
        self.submit(Job::CreateObject { id, desc })?;
        Ok(ObjectHandle {
            id,
            queue: self.clone(),
        })
    }

    /// Handle for an object created elsewhere.
    pub fn handle(&self, id: ObjectId) -> ObjectHandle {
        ObjectHandle {
            id,
            queue: self.clone(),
        }
    }
}

/// Render-thread end.
#[derive(Debug)]
pub struct JobReceiver {
    rx: Receiver<Job>,
}

impl JobReceiver {
    /// Takes a job if a producer is currently offering one.
    pub fn try_next(&self) -> Option<Job> {
        match self.rx.try_recv() {
            Ok(job) => Some(job),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

/// Producer-side view of one render object.
///
/// Every method blocks until the render thread has accepted the job.
/// Methods returning [`Pending`] additionally let the caller wait for the
/// result; a failed submission shows up as a disconnected `Pending`.
#[derive(Debug, Clone)]
pub struct ObjectHandle {
    id: ObjectId,
    queue: CommandQueue,
}

impl ObjectHandle {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    fn submit(&self, job: Job) -> Result<(), SubmitError> {
        self.queue.submit(job)
    }

    fn submit_with_reply<T>(&self, job: impl FnOnce(Reply<T>) -> Job) -> Pending<T> {
        let (reply, pending) = promise();
        // On failure the job, and with it the reply, is dropped.
        if self.submit(job(reply)).is_err() {
            log::debug!("object {}: render thread gone, job not submitted", self.id);
        }
        pending
    }

    /// Appends a `size`×`size` sprite at `position` showing the `tex_size`
    /// texture square at `tex_origin`.
    pub fn append_square(
        &self,
        position: Vec2,
        size: f32,
        tex_origin: Vec2,
        tex_size: f32,
    ) -> Pending<SpriteIndex> {
        let object = self.id;
        self.submit_with_reply(|reply| Job::AppendSquare {
            object,
            position,
            size,
            tex_origin,
            tex_size,
            reply,
        })
    }

    pub fn append_rect(&self, dst: Rect, src: Rect) -> Pending<SpriteIndex> {
        let object = self.id;
        self.submit_with_reply(|reply| Job::AppendRect {
            object,
            quad: SpriteQuad::new(dst, src),
            reply,
        })
    }

    pub fn modify_vertex_square(
        &self,
        index: SpriteIndex,
        position: Vec2,
        size: f32,
    ) -> Result<(), SubmitError> {
        self.modify_vertex_rect(index, Rect::square(position.x, position.y, size))
    }

    pub fn modify_vertex_rect(&self, index: SpriteIndex, dst: Rect) -> Result<(), SubmitError> {
        self.submit(Job::ModifyVertex {
            object: self.id,
            index,
            dst,
        })
    }

    pub fn modify_tex_square(
        &self,
        index: SpriteIndex,
        tex_origin: Vec2,
        tex_size: f32,
    ) -> Result<(), SubmitError> {
        self.modify_tex_rect(index, Rect::square(tex_origin.x, tex_origin.y, tex_size))
    }

    pub fn modify_tex_rect(&self, index: SpriteIndex, src: Rect) -> Result<(), SubmitError> {
        self.submit(Job::ModifyTexcoord {
            object: self.id,
            index,
            src,
        })
    }

    pub fn modify_square(
        &self,
        index: SpriteIndex,
        position: Vec2,
        size: f32,
        tex_origin: Vec2,
        tex_size: f32,
    ) -> Result<(), SubmitError> {
        self.submit(Job::ModifyRegion {
            object: self.id,
            index,
            quad: SpriteQuad::square(position, size, tex_origin, tex_size),
        })
    }

    pub fn modify_rect(&self, index: SpriteIndex, dst: Rect, src: Rect) -> Result<(), SubmitError> {
        self.submit(Job::ModifyRegion {
            object: self.id,
            index,
            quad: SpriteQuad::new(dst, src),
        })
    }

    /// Hides a sprite. Its slot is not reused.
    pub fn clear(&self, index: SpriteIndex) -> Result<(), SubmitError> {
        self.submit(Job::ClearSprite {
            object: self.id,
            index,
        })
    }

    /// Rotates the whole object around `pivot` (pixels).
    pub fn rotate(&self, pivot: Vec2, radians: f32) -> Result<(), SubmitError> {
        self.submit(Job::SetRotation {
            object: self.id,
            pivot,
            radians,
        })
    }

    /// Moves the whole object by `offset` (pixels).
    pub fn translate(&self, offset: Vec2) -> Result<(), SubmitError> {
        self.submit(Job::SetTranslation {
            object: self.id,
            offset,
        })
    }

    /// Rotates vertices `start..=end` around `pivot` (pixels) on the next flush.
    pub fn set_group_rotation(
        &self,
        pivot: Vec2,
        radians: f32,
        start: u32,
        end: u32,
    ) -> Result<(), SubmitError> {
        self.submit(Job::SetGroupRotation {
            object: self.id,
            pivot,
            radians,
            start,
            end,
        })
    }

    pub fn set_all_group_rotation(&self, pivot: Vec2, radians: f32) -> Result<(), SubmitError> {
        self.submit(Job::SetAllGroupRotation {
            object: self.id,
            pivot,
            radians,
        })
    }

    pub fn reset_group_rotation(&self) -> Result<(), SubmitError> {
        self.submit(Job::ResetGroupRotation { object: self.id })
    }

    /// Uploads everything, including pending group rotations.
    pub fn flush(&self) -> Pending<()> {
        let object = self.id;
        self.submit_with_reply(|reply| Job::Flush { object, reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn nothing_to_take_without_a_waiting_producer() {
        let (_queue, jobs) = job_queue();
        assert!(jobs.try_next().is_none());
    }

    #[test]
    fn submit_blocks_until_taken() {
        let (queue, jobs) = job_queue();
        let producer = thread::spawn(move || {
            let handle = queue.handle(ObjectId(4));
            handle.translate(Vec2::new(1.0, 2.0))
        });

        let job = loop {
            if let Some(job) = jobs.try_next() {
                break job;
            }
            thread::yield_now();
        };
        assert_eq!(job.object(), ObjectId(4));
        assert_eq!(job.name(), "set-translation");
        assert_eq!(producer.join().unwrap(), Ok(()));
    }

    #[test]
    fn object_ids_are_unique_across_clones() {
        let (queue, jobs) = job_queue();
        let other = queue.clone();
        let producer = thread::spawn(move || {
            let a = queue.create_object(ObjectDesc::new(6, "a.png")).unwrap();
            let b = other.create_object(ObjectDesc::new(6, "b.png")).unwrap();
            (a.id(), b.id())
        });

        let mut seen = Vec::new();
        while seen.len() < 2 {
            if let Some(job) = jobs.try_next() {
                seen.push(job.object());
            }
        }
        let (a, b) = producer.join().unwrap();
        assert_ne!(a, b);
        assert_eq!(seen, [a, b]);
    }

    #[test]
    fn submitting_after_shutdown_disconnects() {
        let (queue, jobs) = job_queue();
        drop(jobs);
        let handle = queue.handle(ObjectId(1));

        assert_eq!(handle.reset_group_rotation(), Err(SubmitError::Disconnected));
        let pending = handle.append_square(Vec2::zero(), 10.0, Vec2::zero(), 16.0);
        assert_eq!(pending.wait(), Err(SubmitError::Disconnected));
        assert!(matches!(
            queue.create_object(ObjectDesc::new(6, "a.png")),
            Err(SubmitError::Disconnected)
        ));
    }

    #[test]
    fn dropped_producers_leave_nothing_to_take() {
        let (queue, jobs) = job_queue();
        drop(queue);
        assert!(jobs.try_next().is_none());
    }
}
