use std::time::Instant;

use crate::backend::{GraphicsDevice, Surface};
use crate::coords::ColorRgba;
use crate::error::RenderError;
use crate::object::World;
use crate::queue::{Job, JobReceiver};
use crate::time::FramePacer;

use super::{IdleStrategy, SchedulerConfig};

/// Counters reported when the driver stops.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DriverStats {
    pub jobs_executed: u64,
    pub frames_presented: u64,
    /// Presentations triggered by the job-count threshold.
    pub forced_presents: u64,
}

/// What a single [`FrameDriver::step`] did.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Step {
    /// Ran one job (and possibly a forced presentation after it).
    Executed,
    /// Nothing queued and the budget had elapsed.
    Presented,
    Idle,
}

/// Single consumer of the job queue and sole owner of the graphics context.
///
/// Jobs, buffer writes and presentation never overlap: they all happen on
/// the thread calling [`run`](Self::run).
pub struct FrameDriver<C: GraphicsDevice + Surface> {
    context: C,
    world: World<C>,
    jobs: JobReceiver,
    config: SchedulerConfig,
    pacer: FramePacer,
    jobs_since_present: u32,
    stats: DriverStats,
}

impl<C: GraphicsDevice + Surface> FrameDriver<C> {
    pub fn new(context: C, jobs: JobReceiver, config: SchedulerConfig) -> Self {
        let pacer = FramePacer::new(config.frame_budget);
        Self {
            context,
            world: World::new(),
            jobs,
            config,
            pacer,
            jobs_since_present: 0,
            stats: DriverStats::default(),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn world(&self) -> &World<C> {
        &self.world
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Runs until the surface asks to close or a job fails, then tears down.
    ///
    /// A job error is fatal: nothing queued after it runs, and it is returned
    /// once the world and the context are gone.
    pub fn run(mut self) -> Result<DriverStats, RenderError> {
        log::info!(
            "frame driver running: budget {:?}, forced present after {} jobs",
            self.config.frame_budget,
            self.config.forced_present_after
        );

        let result = loop {
            if self.context.should_close() {
                log::info!("close requested");
                break Ok(());
            }
            if let Err(err) = self.step() {
                log::error!("render thread stopping: {err}");
                break Err(err);
            }
        };

        self.teardown();
        result.map(|()| self.stats)
    }

    /// One iteration of the consumption loop.
    pub fn step(&mut self) -> Result<Step, RenderError> {
        if let Some(job) = self.jobs.try_next() {
            self.execute(job)?;
            self.stats.jobs_executed += 1;
            self.jobs_since_present += 1;

            if self.jobs_since_present >= self.config.forced_present_after {
                log::trace!("forcing presentation after {} jobs", self.jobs_since_present);
                self.present()?;
                self.stats.forced_presents += 1;
            }
            return Ok(Step::Executed);
        }

        if self.pacer.is_due(Instant::now()) {
            self.present()?;
            return Ok(Step::Presented);
        }

        self.idle();
        Ok(Step::Idle)
    }

    fn idle(&self) {
        match self.config.idle {
            IdleStrategy::Spin => std::thread::yield_now(),
            IdleStrategy::Sleep => std::thread::sleep(self.config.sampling_interval),
        }
    }

    /// Clears, draws every object in creation order, presents.
    pub fn present(&mut self) -> Result<(), RenderError> {
        self.context.clear(ColorRgba::black());
        self.world.draw_all(&mut self.context)?;
        self.context.present()?;
        if let Some(viewport) = self.context.take_resize() {
            log::debug!("viewport now {}x{}", viewport.width, viewport.height);
            self.world.resize(viewport)?;
        }

        let ft = self.pacer.mark(Instant::now());
        log::trace!("frame {} presented (dt {:.4}s)", ft.frame_index, ft.dt);
        self.stats.frames_presented += 1;
        self.jobs_since_present = 0;
        Ok(())
    }

    fn execute(&mut self, job: Job) -> Result<(), RenderError> {
        log::trace!("job {} on object {}", job.name(), job.object());
        let device = &mut self.context;

        match job {
            Job::CreateObject { id, desc } => {
                self.world.create_object(device, id, &desc)?;
            }
            Job::AppendSquare {
                object,
                position,
                size,
                tex_origin,
                tex_size,
                reply,
            } => {
                let index = self
                    .world
                    .get_mut(object)?
                    .append_square(device, position, size, tex_origin, tex_size)?;
                reply.send(index);
            }
            Job::AppendRect { object, quad, reply } => {
                let index = self.world.get_mut(object)?.append(device, quad)?;
                reply.send(index);
            }
            Job::ModifyVertex { object, index, dst } => {
                self.world.get_mut(object)?.modify_vertex_region(device, index, dst)?;
            }
            Job::ModifyTexcoord { object, index, src } => {
                self.world.get_mut(object)?.modify_tex_region(device, index, src)?;
            }
            Job::ModifyRegion { object, index, quad } => {
                self.world.get_mut(object)?.modify_region(device, index, quad)?;
            }
            Job::ClearSprite { object, index } => {
                self.world.get_mut(object)?.clear(device, index)?;
            }
            Job::SetTranslation { object, offset } => {
                self.world.get_mut(object)?.translate(offset)?;
            }
            Job::SetRotation {
                object,
                pivot,
                radians,
            } => {
                self.world.get_mut(object)?.rotate_around(pivot, radians)?;
            }
            Job::SetGroupRotation {
                object,
                pivot,
                radians,
                start,
                end,
            } => {
                self.world
                    .get_mut(object)?
                    .set_group_rotation(pivot, radians, start, end)?;
            }
            Job::SetAllGroupRotation {
                object,
                pivot,
                radians,
            } => {
                self.world.get_mut(object)?.set_all_group_rotation(pivot, radians);
            }
            Job::ResetGroupRotation { object } => {
                self.world.get_mut(object)?.reset_group_rotation();
            }
            Job::Flush { object, reply } => {
                self.world.get_mut(object)?.flush(device)?;
                reply.send(());
            }
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.world.teardown(&mut self.context);
        self.context.destroy();
        log::info!(
            "frame driver stopped: {} jobs, {} frames ({} forced)",
            self.stats.jobs_executed,
            self.stats.frames_presented,
            self.stats.forced_presents
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    use crate::backend::headless::{HeadlessCall, HeadlessContext, HeadlessProbe};
    use crate::backend::UniformValue;
    use crate::coords::{Vec2, Viewport};
    use crate::error::SubmitError;
    use crate::object::{ObjectDesc, ObjectId, SpriteIndex};
    use crate::queue::{job_queue, CommandQueue};

    fn slow_frames() -> SchedulerConfig {
        SchedulerConfig {
            frame_budget: Duration::from_secs(3600),
            ..SchedulerConfig::default()
        }
    }

    fn headless_driver(
        config: SchedulerConfig,
    ) -> (FrameDriver<HeadlessContext>, HeadlessProbe, CommandQueue) {
        let ctx = HeadlessContext::default();
        let probe = ctx.probe();
        let (queue, jobs) = job_queue();
        (FrameDriver::new(ctx, jobs, config), probe, queue)
    }

    fn step_until_jobs(driver: &mut FrameDriver<HeadlessContext>, jobs: u64) {
        while driver.stats().jobs_executed < jobs {
            driver.step().unwrap();
        }
    }

    #[test]
    fn jobs_from_one_producer_run_in_order() {
        let (mut driver, probe, queue) = headless_driver(slow_frames());
        let producer = thread::spawn(move || {
            let obj = queue.create_object(ObjectDesc::new(6, "test.png")).unwrap();
            for x in [400.0, 800.0, 1200.0] {
                obj.translate(Vec2::new(x, 0.0)).unwrap();
            }
        });

        step_until_jobs(&mut driver, 4);
        producer.join().unwrap();

        let offsets: Vec<[f32; 2]> = probe
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                HeadlessCall::SetUniform {
                    name,
                    value: UniformValue::Vec2(v),
                    ..
                } if name == "trans" => Some(v),
                _ => None,
            })
            .collect();
        // first one is the initial zero pushed at creation
        assert_eq!(offsets, [[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
    }

    #[test]
    fn presentation_is_forced_after_threshold() {
        let config = slow_frames().with_forced_present_after(3);
        let (mut driver, probe, queue) = headless_driver(config);
        let producer = thread::spawn(move || {
            let obj = queue.create_object(ObjectDesc::new(6, "test.png")).unwrap();
            obj.reset_group_rotation().unwrap();
            obj.reset_group_rotation().unwrap();
        });

        step_until_jobs(&mut driver, 3);
        producer.join().unwrap();

        assert_eq!(probe.presents(), 1);
        assert_eq!(driver.stats().forced_presents, 1);
        assert_eq!(driver.stats().frames_presented, 1);
    }

    #[test]
    fn forced_counter_restarts_after_presenting() {
        let config = slow_frames().with_forced_present_after(2);
        let (mut driver, probe, queue) = headless_driver(config);
        let producer = thread::spawn(move || {
            let obj = queue.create_object(ObjectDesc::new(6, "test.png")).unwrap();
            for _ in 0..4 {
                obj.reset_group_rotation().unwrap();
            }
        });

        step_until_jobs(&mut driver, 5);
        producer.join().unwrap();
        assert_eq!(probe.presents(), 2);
    }

    #[test]
    fn idle_driver_presents_on_budget() {
        let config = SchedulerConfig {
            frame_budget: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        let (mut driver, probe, _queue) = headless_driver(config);
        thread::sleep(Duration::from_millis(1));

        assert_eq!(driver.step().unwrap(), Step::Presented);
        assert_eq!(probe.presents(), 1);
        assert_eq!(probe.calls(), [HeadlessCall::Clear, HeadlessCall::Present]);
    }

    #[test]
    fn sleep_idle_waits_one_sampling_interval() {
        let config = slow_frames().with_idle(IdleStrategy::Sleep);
        let interval = config.sampling_interval;
        let (mut driver, probe, _queue) = headless_driver(config);

        let started = Instant::now();
        assert_eq!(driver.step().unwrap(), Step::Idle);
        assert!(started.elapsed() >= interval);
        assert_eq!(probe.presents(), 0);
    }

    #[test]
    fn concurrent_producers_each_keep_their_order() {
        let (mut driver, _probe, queue) = headless_driver(slow_frames());
        let producers = thread::spawn(move || {
            let obj = queue.create_object(ObjectDesc::new(480, "test.png")).unwrap();
            let workers: Vec<_> = (0..8)
                .map(|_| {
                    let obj = obj.clone();
                    thread::spawn(move || {
                        (0..10)
                            .map(|_| {
                                obj.append_square(Vec2::zero(), 1.0, Vec2::zero(), 1.0)
                                    .wait()
                                    .unwrap()
                                    .first_vertex()
                            })
                            .collect::<Vec<u32>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .map(|w| w.join().unwrap())
                .collect::<Vec<_>>()
        });

        step_until_jobs(&mut driver, 81);
        let per_producer = producers.join().unwrap();

        for indices in &per_producer {
            assert!(indices.windows(2).all(|w| w[0] < w[1]));
        }
        let mut all: Vec<u32> = per_producer.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..80).map(|i| i * 6).collect::<Vec<u32>>());
    }

    #[test]
    fn resize_reaches_objects_on_present() {
        let config = slow_frames().with_forced_present_after(1);
        let (mut driver, probe, queue) = headless_driver(config);
        let producer = thread::spawn(move || {
            queue.create_object(ObjectDesc::new(6, "test.png")).unwrap().id()
        });
        probe.request_resize(Viewport::new(1024.0, 768.0));

        step_until_jobs(&mut driver, 1);
        let id: ObjectId = producer.join().unwrap();

        let obj = driver.world().get(id).unwrap();
        assert_eq!(obj.program().uniform("dim"), Some(UniformValue::Vec2([1024.0, 768.0])));
        assert_eq!(driver.context().viewport(), Viewport::new(1024.0, 768.0));
    }

    #[test]
    fn capacity_overflow_stops_the_driver() {
        let (driver, probe, queue) = headless_driver(slow_frames());
        let producer = thread::spawn(move || {
            let obj = queue.create_object(ObjectDesc::new(12, "sprites/test.png")).unwrap();
            let a = obj.append_square(Vec2::new(400.0, 400.0), 100.0, Vec2::zero(), 16.0).wait();
            let b = obj.append_square(Vec2::new(600.0, 400.0), 100.0, Vec2::zero(), 16.0).wait();
            let c = obj.append_square(Vec2::new(800.0, 400.0), 100.0, Vec2::zero(), 16.0).wait();
            (a, b, c)
        });

        let err = driver.run().unwrap_err();
        let (a, b, c) = producer.join().unwrap();

        assert_eq!(a, Ok(SpriteIndex::from_first_vertex(0)));
        assert_eq!(b, Ok(SpriteIndex::from_first_vertex(6)));
        assert_eq!(c, Err(SubmitError::Disconnected));
        assert!(matches!(
            err,
            RenderError::CapacityExceeded { used: 12, requested: 6, capacity: 12, .. }
        ));
        // torn down even on failure
        assert_eq!(probe.count(|c| matches!(c, HeadlessCall::ReleaseBuffers { .. })), 1);
        assert_eq!(probe.calls().last(), Some(&HeadlessCall::Destroy));
    }

    #[test]
    fn jobs_after_a_failure_are_never_run() {
        let (driver, probe, queue) = headless_driver(slow_frames());
        let producer = thread::spawn(move || {
            let ghost = queue.handle(crate::object::ObjectId(99));
            let first = ghost.translate(Vec2::new(1.0, 1.0));
            let second = ghost.translate(Vec2::new(2.0, 2.0));
            (first, second)
        });

        let err = driver.run().unwrap_err();
        let (first, second) = producer.join().unwrap();
        assert!(matches!(err, RenderError::UnknownObject(_)));
        assert_eq!(first, Ok(()));
        assert_eq!(second, Err(SubmitError::Disconnected));
        assert_eq!(probe.count(|c| matches!(c, HeadlessCall::SetUniform { .. })), 0);
    }

    #[test]
    fn close_request_tears_down_once() {
        let (mut driver, probe, queue) = headless_driver(slow_frames());
        let producer = thread::spawn(move || {
            let obj = queue.create_object(ObjectDesc::new(6, "test.png")).unwrap();
            obj.flush().wait()
        });

        step_until_jobs(&mut driver, 2);
        assert_eq!(producer.join().unwrap(), Ok(()));

        probe.request_close();
        let stats = driver.run().unwrap();
        assert_eq!(stats.jobs_executed, 2);

        let calls = probe.calls();
        let tail = &calls[calls.len() - 2..];
        assert!(matches!(tail[0], HeadlessCall::ReleaseBuffers { .. }));
        assert_eq!(tail[1], HeadlessCall::Destroy);
        assert_eq!(probe.count(|c| *c == HeadlessCall::Destroy), 1);
    }
}
