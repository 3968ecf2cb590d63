//! Camera-side view change notifications.
//!
//! The camera controller calls [`ViewChangeNotifier::observe`] every frame.
//! Pose changes are throttled: at most one notification per interval, and a
//! change that arrives during the quiet period is delivered once the interval
//! has elapsed (trailing edge), provided `observe` or `flush` keeps being
//! called.

use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TrySendError};
use glam::{Quat, Vec3};

use crate::Camera;

/// Throttled, payload-free "the view changed" signal.
#[derive(Debug)]
pub struct ViewChangeNotifier {
    sender: Sender<()>,
    min_interval: Duration,
    epsilon: f32,
    last_pose: Option<(Vec3, Quat)>,
    last_sent: Option<Instant>,
    pending: bool,
}

impl ViewChangeNotifier {
    pub fn new(sender: Sender<()>, min_interval: Duration) -> Self {
        Self {
            sender,
            min_interval,
            epsilon: 1e-4,
            last_pose: None,
            last_sent: None,
            pending: false,
        }
    }

    /// Minimum position/rotation change that counts as a new pose.
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Record the camera pose at `now`. Returns `true` if a notification was
    /// sent.
    pub fn observe(&mut self, camera: &Camera, now: Instant) -> bool {
        let pose = (camera.position, camera.rotation);
        let changed = match self.last_pose {
            None => true,
            Some((position, rotation)) => {
                position.distance(pose.0) > self.epsilon
                    || !rotation.abs_diff_eq(pose.1, self.epsilon)
            }
        };
        if changed {
            self.last_pose = Some(pose);
            self.pending = true;
        }
        self.flush(now)
    }

    /// Deliver a pending change if the throttle interval has elapsed.
    pub fn flush(&mut self, now: Instant) -> bool {
        if !self.pending {
            return false;
        }
        let due = self
            .last_sent
            .is_none_or(|sent| now.saturating_duration_since(sent) >= self.min_interval);
        if !due {
            return false;
        }
        self.pending = false;
        self.last_sent = Some(now);
        match self.sender.try_send(()) {
            // A full channel already holds an undelivered change.
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Disconnected(())) => {
                tracing::debug!("view change receiver dropped");
                false
            }
        }
    }

    /// Returns `true` if a change is waiting for the throttle interval.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    fn camera_at(x: f32) -> Camera {
        Camera {
            position: Vec3::new(x, 0.0, 0.0),
            ..Camera::default()
        }
    }

    #[test]
    fn test_first_observation_notifies() {
        let (tx, rx) = bounded(1);
        let mut notifier = ViewChangeNotifier::new(tx, Duration::from_millis(1000));
        assert!(notifier.observe(&camera_at(0.0), Instant::now()));
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_changes_inside_interval_are_coalesced() {
        let (tx, rx) = bounded(1);
        let mut notifier = ViewChangeNotifier::new(tx, Duration::from_millis(1000));
        let t0 = Instant::now();
        assert!(notifier.observe(&camera_at(0.0), t0));
        let _ = rx.try_recv();

        assert!(!notifier.observe(&camera_at(1.0), t0 + Duration::from_millis(100)));
        assert!(!notifier.observe(&camera_at(2.0), t0 + Duration::from_millis(200)));
        assert!(notifier.is_pending());
        assert!(rx.try_recv().is_err());

        // Trailing edge: the camera stopped, the last change is still delivered.
        assert!(notifier.flush(t0 + Duration::from_millis(1000)));
        assert!(rx.try_recv().is_ok());
        assert!(!notifier.is_pending());
    }

    #[test]
    fn test_unchanged_pose_is_silent() {
        let (tx, rx) = bounded(1);
        let mut notifier = ViewChangeNotifier::new(tx, Duration::ZERO);
        let t0 = Instant::now();
        notifier.observe(&camera_at(3.0), t0);
        let _ = rx.try_recv();
        assert!(!notifier.observe(&camera_at(3.0), t0 + Duration::from_secs(5)));
        assert!(!notifier.observe(&camera_at(3.00001), t0 + Duration::from_secs(6)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_channel_collapses_notifications() {
        let (tx, rx) = bounded(1);
        let mut notifier = ViewChangeNotifier::new(tx, Duration::ZERO);
        let t0 = Instant::now();
        assert!(notifier.observe(&camera_at(0.0), t0));
        assert!(notifier.observe(&camera_at(1.0), t0));
        assert_eq!(rx.try_iter().count(), 1);
    }
}
