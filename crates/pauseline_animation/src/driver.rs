//! Realtime driver
//!
//! Runs a [`TimelineScheduler`] on a tokio task. The task sleeps until the
//! scheduler's next deadline, fires it, and otherwise waits for commands from
//! a [`TimelineController`]. Everything the scheduler does (publishing,
//! segment updates, re-arming) happens on that one task, so wake-up cycles
//! never interleave.
//!
//! ```ignore
//! let clock: SharedClock = Arc::new(TokioClock);
//! let scheduler = TimelineScheduler::with_clock(3.5, clock)?;
//! let (driver, controller) = TimelineDriver::spawn(scheduler);
//!
//! controller.toggle_playing()?;
//! let mut time = controller.current_time();
//! time.changed().await?;
//!
//! controller.shutdown()?;
//! let scheduler = driver.join().await?;
//! ```

use crate::scheduler::TimelineScheduler;
use pauseline_core::{Clock, Result, TimelineError};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Clock backed by tokio's time source
///
/// Deadlines computed against it line up with `tokio::time::sleep_until`,
/// including under a paused test runtime.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Closure run against the scheduler on the driver task
pub type ConfigureFn = Box<dyn FnOnce(&mut TimelineScheduler) + Send>;

/// Commands accepted by the driver task
pub enum TimelineCommand {
    TogglePlaying,
    SetPlaying(bool),
    Configure(ConfigureFn),
    Shutdown,
}

impl std::fmt::Debug for TimelineCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TogglePlaying => write!(f, "TogglePlaying"),
            Self::SetPlaying(playing) => write!(f, "SetPlaying({playing})"),
            Self::Configure(_) => write!(f, "Configure(..)"),
            Self::Shutdown => write!(f, "Shutdown"),
        }
    }
}

/// Owner of the driver task
pub struct TimelineDriver {
    handle: JoinHandle<TimelineScheduler>,
}

impl TimelineDriver {
    /// Move `scheduler` onto a new tokio task
    ///
    /// Must be called from within a tokio runtime. The scheduler should use
    /// [`TokioClock`] (or another clock that agrees with tokio's).
    pub fn spawn(mut scheduler: TimelineScheduler) -> (Self, TimelineController) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (playing_tx, playing_rx) = watch::channel(scheduler.is_playing());
        let (time_tx, time_rx) = watch::channel(scheduler.current_time());

        scheduler.subscribe(move |update| {
            playing_tx.send_if_modified(|playing| {
                let changed = *playing != update.playing;
                *playing = update.playing;
                changed
            });
            time_tx.send_if_modified(|time| {
                let changed = *time != update.current_time;
                *time = update.current_time;
                changed
            });
        });

        let handle = tokio::spawn(run(scheduler, commands_rx));
        let controller = TimelineController {
            commands: commands_tx,
            playing: playing_rx,
            current_time: time_rx,
        };
        (Self { handle }, controller)
    }

    /// Wait for the task to stop and take the scheduler back
    pub async fn join(self) -> Result<TimelineScheduler> {
        self.handle.await.map_err(|err| {
            tracing::error!(%err, "timeline driver task failed");
            TimelineError::DriverStopped
        })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn run(
    mut scheduler: TimelineScheduler,
    mut commands: mpsc::UnboundedReceiver<TimelineCommand>,
) -> TimelineScheduler {
    tracing::debug!("timeline driver started");
    loop {
        let deadline = scheduler.next_deadline();
        tokio::select! {
            // A due wake-up runs before any command queued alongside it
            biased;

            _ = sleep_until(deadline) => {
                scheduler.poll();
            }
            command = commands.recv() => match command {
                Some(TimelineCommand::TogglePlaying) => scheduler.toggle_playing(),
                Some(TimelineCommand::SetPlaying(playing)) => scheduler.set_playing(playing),
                Some(TimelineCommand::Configure(f)) => f(&mut scheduler),
                Some(TimelineCommand::Shutdown) | None => break,
            },
        }
    }
    tracing::debug!(current_time = scheduler.current_time(), "timeline driver stopped");
    scheduler
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// The controller surface of a running timeline
///
/// Cheap to clone. Every method fails with
/// [`TimelineError::DriverStopped`] once the driver task has ended.
#[derive(Clone, Debug)]
pub struct TimelineController {
    commands: mpsc::UnboundedSender<TimelineCommand>,
    playing: watch::Receiver<bool>,
    current_time: watch::Receiver<f64>,
}

impl TimelineController {
    pub fn toggle_playing(&self) -> Result<()> {
        self.send(TimelineCommand::TogglePlaying)
    }

    pub fn set_playing(&self, playing: bool) -> Result<()> {
        self.send(TimelineCommand::SetPlaying(playing))
    }

    /// Ask the driver task to stop
    pub fn shutdown(&self) -> Result<()> {
        self.send(TimelineCommand::Shutdown)
    }

    /// Run `f` against the scheduler on the driver task and return its result
    pub async fn configure<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut TimelineScheduler) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(TimelineCommand::Configure(Box::new(move |scheduler| {
            let _ = reply_tx.send(f(scheduler));
        })))?;
        reply_rx.await.map_err(|_| TimelineError::DriverStopped)
    }

    pub async fn register_wake_time(&self, time: f64) -> Result<()> {
        self.configure(move |scheduler| scheduler.register_wake_time(time))
            .await?
    }

    /// Observable play/pause state, for a play/pause indicator
    pub fn playing(&self) -> watch::Receiver<bool> {
        self.playing.clone()
    }

    pub fn is_playing(&self) -> bool {
        *self.playing.borrow()
    }

    /// Observable clock position
    pub fn current_time(&self) -> watch::Receiver<f64> {
        self.current_time.clone()
    }

    fn send(&self, command: TimelineCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| TimelineError::DriverStopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn scheduler(max_time: f64) -> TimelineScheduler {
        TimelineScheduler::with_clock(max_time, Arc::new(TokioClock)).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle_updates_playing_watch() {
        let (driver, controller) = TimelineDriver::spawn(scheduler(3.5));
        let mut playing = controller.playing();
        assert!(!controller.is_playing());

        controller.toggle_playing().unwrap();
        playing.changed().await.unwrap();
        assert!(*playing.borrow());

        controller.shutdown().unwrap();
        let scheduler = driver.join().await.unwrap();
        assert!(scheduler.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wake_ups_fire_in_real_time() {
        let mut s = scheduler(3.5);
        s.register_wake_time(1.0).unwrap();
        let (driver, controller) = TimelineDriver::spawn(s);
        let mut time = controller.current_time();

        controller.set_playing(true).unwrap();
        time.changed().await.unwrap();
        let first = *time.borrow_and_update();
        assert!((first - 1.0).abs() < 1e-3, "first wake at {first}");

        controller.shutdown().unwrap();
        driver.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_wake_runs_before_queued_command() {
        use crate::scheduler::{TimelineSignal, TimelineUpdate};
        use std::sync::Mutex;

        let mut s = scheduler(3.5);
        s.register_wake_time(1.0).unwrap();
        let log: Arc<Mutex<Vec<TimelineUpdate>>> = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        s.subscribe(move |u| log_clone.lock().unwrap().push(*u));
        log.lock().unwrap().clear();

        let (driver, controller) = TimelineDriver::spawn(s);
        let mut playing = controller.playing();
        controller.set_playing(true).unwrap();
        playing.changed().await.unwrap();

        tokio::time::advance(Duration::from_millis(1300)).await;
        controller.toggle_playing().unwrap();
        controller.shutdown().unwrap();
        driver.join().await.unwrap();

        let log = log.lock().unwrap();
        let paused_at = log
            .iter()
            .position(|u| u.signal == TimelineSignal::Playing && !u.playing)
            .unwrap();
        let woke_at = log
            .iter()
            .position(|u| u.signal == TimelineSignal::CurrentTime && u.playing)
            .unwrap();
        assert!(woke_at < paused_at, "{log:?}");
        assert!(log[woke_at].current_time >= 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loops_back_to_zero() {
        let (driver, controller) = TimelineDriver::spawn(scheduler(2.0));
        controller.set_playing(true).unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let elapsed = controller
            .configure(|scheduler| scheduler.elapsed_time())
            .await
            .unwrap();
        assert!((elapsed - 0.5).abs() < 1e-3, "elapsed {elapsed}");

        controller.shutdown().unwrap();
        driver.join().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_register_wake_time_through_controller() {
        let (driver, controller) = TimelineDriver::spawn(scheduler(3.5));
        controller.register_wake_time(1.5).await.unwrap();
        assert!(controller.register_wake_time(f64::NAN).await.is_err());

        controller.shutdown().unwrap();
        let scheduler = driver.join().await.unwrap();
        assert_eq!(scheduler.wake_times(), &[1.5, 3.5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controller_fails_after_shutdown() {
        let (driver, controller) = TimelineDriver::spawn(scheduler(3.5));
        controller.shutdown().unwrap();
        driver.join().await.unwrap();

        assert_eq!(
            controller.toggle_playing(),
            Err(TimelineError::DriverStopped)
        );
        assert!(controller.configure(|_| ()).await.is_err());
    }
}
