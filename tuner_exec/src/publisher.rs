//! # Publisher
//!
//! Publishes the current pose as a transform on a fixed period, from a background thread which
//! runs independently of the keyboard loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    io,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use chrono::Utc;
use log::{debug, info, warn};

use crate::{
    pose::{lock_pose, FrameLink, SharedPose},
    tf_server::TfSink,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Handle to the publishing thread.
///
/// The thread is stopped and joined when the handle is dropped.
pub struct Publisher {
    stop: Arc<AtomicBool>,

    num_sent: Arc<AtomicU64>,

    join_handle: Option<thread::JoinHandle<()>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Publisher {
    /// Start publishing `pose` to `sink` every `period`.
    ///
    /// The first transform is sent immediately.
    pub fn start(
        pose: SharedPose,
        frames: FrameLink,
        period: Duration,
        sink: Box<dyn TfSink>,
    ) -> io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let num_sent = Arc::new(AtomicU64::new(0));

        let stop_clone = stop.clone();
        let num_sent_clone = num_sent.clone();

        let join_handle = thread::Builder::new()
            .name("tf_publisher".into())
            .spawn(move || {
                publish_thread(stop_clone, num_sent_clone, pose, frames, period, sink)
            })?;

        info!("Publishing transforms every {:?}", period);

        Ok(Self {
            stop,
            num_sent,
            join_handle: Some(join_handle),
        })
    }

    /// Number of transforms delivered to the sink so far.
    pub fn num_sent(&self) -> u64 {
        self.num_sent.load(Ordering::Relaxed)
    }

    /// Stop publishing and wait for the thread to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(jh) = self.join_handle.take() {
            if jh.join().is_err() {
                warn!("Publisher thread panicked");
            }
            debug!("Publisher stopped after {} transforms", self.num_sent());
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.stop();
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn publish_thread(
    stop: Arc<AtomicBool>,
    num_sent: Arc<AtomicU64>,
    pose: SharedPose,
    frames: FrameLink,
    period: Duration,
    mut sink: Box<dyn TfSink>,
) {
    let mut next_tick = Instant::now();
    let mut failing = false;

    while !stop.load(Ordering::Relaxed) {
        // Copy out so the lock isn't held while sending
        let current = *lock_pose(&pose);
        let tf = current.to_transform(&frames, Utc::now());

        match sink.send(&tf) {
            Ok(()) => {
                if failing {
                    info!("Transform publishing recovered");
                    failing = false;
                }
                num_sent.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // Only report the first failure of a streak
                if !failing {
                    warn!("Could not publish transform: {}", e);
                    failing = true;
                }
            }
        }

        next_tick += period;
        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        else {
            // Overran, publish now and restart the schedule from here
            next_tick = now;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        pose::{Pose, StepSizes},
        tf_server::TfServerError,
        tuner::{Flow, Operator, Tuner},
    };
    use comms_if::{net::zmq, tf::TransformMessage};
    use std::sync::Mutex;

    /// Sink which keeps every transform it is given.
    struct MemorySink(Arc<Mutex<Vec<TransformMessage>>>);

    impl TfSink for MemorySink {
        fn send(&mut self, tf: &TransformMessage) -> Result<(), TfServerError> {
            self.0.lock().unwrap().push(tf.clone());
            Ok(())
        }
    }

    /// Sink which always fails but counts attempts.
    struct BrokenSink(Arc<AtomicU64>);

    impl TfSink for BrokenSink {
        fn send(&mut self, _tf: &TransformMessage) -> Result<(), TfServerError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Err(TfServerError::SendError(zmq::Error::EAGAIN))
        }
    }

    /// Operator who takes a while to type each answer.
    struct SlowOperator {
        delay: Duration,
        answers: Vec<&'static str>,
    }

    impl Operator for SlowOperator {
        fn say(&mut self, _line: &str) {}

        fn ask(&mut self, _prompt: &str) -> io::Result<String> {
            thread::sleep(self.delay);
            Ok(self.answers.remove(0).into())
        }
    }

    fn frames() -> FrameLink {
        FrameLink {
            parent: "world".into(),
            child: "tool".into(),
        }
    }

    #[test]
    fn test_publish_rate() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let pose = Pose::default().into_shared();

        let mut publisher = Publisher::start(
            pose,
            frames(),
            Duration::from_millis(100),
            Box::new(MemorySink(sent.clone())),
        )
        .unwrap();

        thread::sleep(Duration::from_secs(1));
        publisher.stop();

        let sent = sent.lock().unwrap();
        assert!(sent.len() >= 9, "only {} transforms sent", sent.len());
        assert_eq!(publisher.num_sent(), sent.len() as u64);

        // Stamps are taken at each tick
        assert!(sent.windows(2).all(|w| w[0].stamp <= w[1].stamp));
        assert!(sent.iter().all(|tf| tf.parent_frame == "world" && tf.child_frame == "tool"));
    }

    #[test]
    fn test_publishes_latest_pose() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let pose = Pose::default().into_shared();

        let publisher = Publisher::start(
            pose.clone(),
            frames(),
            Duration::from_millis(10),
            Box::new(MemorySink(sent.clone())),
        )
        .unwrap();

        lock_pose(&pose).x = 2.5;
        thread::sleep(Duration::from_millis(100));
        drop(publisher);

        let n = {
            let sent = sent.lock().unwrap();
            assert_eq!(sent.last().unwrap().translation, [2.5, 0.0, 0.0]);
            sent.len()
        };

        // Nothing published after the publisher is dropped
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sent.lock().unwrap().len(), n);
    }

    #[test]
    fn test_keeps_running_on_errors() {
        let attempts = Arc::new(AtomicU64::new(0));

        let publisher = Publisher::start(
            Pose::default().into_shared(),
            frames(),
            Duration::from_millis(10),
            Box::new(BrokenSink(attempts.clone())),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(200));
        assert_eq!(publisher.num_sent(), 0);
        drop(publisher);

        assert!(attempts.load(Ordering::Relaxed) >= 5);
    }

    #[test]
    fn test_publishes_during_reconfigure() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut tuner = Tuner::new(Pose::default(), frames(), StepSizes::default());

        let publisher = Publisher::start(
            tuner.shared_pose(),
            frames(),
            Duration::from_millis(50),
            Box::new(MemorySink(sent.clone())),
        )
        .unwrap();

        let mut op = SlowOperator {
            delay: Duration::from_millis(250),
            answers: vec!["0.1", "0.2"],
        };

        let before = sent.lock().unwrap().len();
        assert_eq!(tuner.handle_key('m', &mut op).unwrap(), Flow::Continue);
        let during = sent.lock().unwrap().len() - before;
        drop(publisher);

        assert!(during >= 4, "only {} transforms sent while blocked", during);
        assert_eq!(
            tuner.steps(),
            StepSizes {
                position_step: 0.1,
                rotation_step: 0.2
            }
        );
    }
}
