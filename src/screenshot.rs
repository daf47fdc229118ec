//! Screenshot capture handshake with the system capture service.
//!
//! A request binds to the service, sends one capture command once the
//! service is connected and releases the binding when the capture completes
//! or the timeout fires, whichever comes first. At most one session is live
//! at a time. Every callback carries the token of the session it belongs to
//! and is ignored once that session is gone.

use crate::platform::ScreenshotService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;
use std::time::Duration;

/// How long a capture may take before the binding is released anyway.
pub const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity of one capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);

struct Session {
    token: SessionToken,
    // Dropping the sender wakes the timeout thread without firing it.
    _cancel_timeout: Sender<()>,
}

struct Shared {
    service: Arc<dyn ScreenshotService>,
    session: Mutex<Option<Session>>,
    next_token: AtomicU64,
    timeout: Duration,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Tear down the session if it is still the one identified by `token`.
    fn finish(&self, token: SessionToken) -> bool {
        let mut session = self.lock();
        match session.as_ref() {
            Some(current) if current.token == token => {
                self.service.unbind(token);
                *session = None;
                true
            }
            _ => {
                log::debug!("Ignoring stale screenshot callback for {:?}", token);
                false
            }
        }
    }
}

/// Handle passed to [`ScreenshotService::bind`].
#[derive(Clone)]
pub struct ScreenshotConnection {
    token: SessionToken,
    shared: Weak<Shared>,
}

impl ScreenshotConnection {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Called by the service once the binding is established.
    pub fn connected(&self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let session = shared.lock();
        if session.as_ref().map(|s| s.token) != Some(self.token) {
            log::debug!("Screenshot service connected for stale {:?}", self.token);
            return;
        }

        let reply = CaptureReply {
            token: self.token,
            shared: Weak::clone(&self.shared),
        };
        if let Err(e) = shared.service.capture(self.token, reply) {
            // The timeout releases the binding.
            log::warn!("Failed to send screenshot command: {:#}", e);
        }
    }
}

/// Reply channel handed to the service along with the capture command.
pub struct CaptureReply {
    token: SessionToken,
    shared: Weak<Shared>,
}

impl CaptureReply {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Called by the service when the capture is done.
    pub fn complete(self) {
        if let Some(shared) = self.shared.upgrade() {
            if shared.finish(self.token) {
                log::debug!("Screenshot {:?} completed", self.token);
            }
        }
    }
}

/// Owner of the single in-flight screenshot session.
pub struct ScreenshotCapture {
    shared: Arc<Shared>,
}

impl ScreenshotCapture {
    /// Create a capture handler with the default timeout.
    pub fn new(service: Arc<dyn ScreenshotService>) -> Self {
        Self::with_timeout(service, SCREENSHOT_TIMEOUT)
    }

    pub fn with_timeout(service: Arc<dyn ScreenshotService>, timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                session: Mutex::new(None),
                next_token: AtomicU64::new(1),
                timeout,
            }),
        }
    }

    /// Start a capture unless one is already in flight.
    ///
    /// Returns true if a new session was started.
    pub fn request(&self) -> bool {
        let mut session = self.shared.lock();
        if session.is_some() {
            log::debug!("Screenshot already in progress");
            return false;
        }

        let token = SessionToken(self.shared.next_token.fetch_add(1, Ordering::Relaxed));
        let connection = ScreenshotConnection {
            token,
            shared: Arc::downgrade(&self.shared),
        };
        if !self.shared.service.bind(connection) {
            log::warn!("Could not bind to the screenshot service");
            return false;
        }

        let cancel = arm_timeout(Arc::downgrade(&self.shared), token, self.shared.timeout);
        *session = Some(Session {
            token,
            _cancel_timeout: cancel,
        });
        true
    }

    /// True while a session is live.
    pub fn is_active(&self) -> bool {
        self.shared.lock().is_some()
    }
}

impl Drop for ScreenshotCapture {
    fn drop(&mut self) {
        if let Some(session) = self.shared.lock().take() {
            log::debug!("Releasing screenshot {:?} on shutdown", session.token);
            self.shared.service.unbind(session.token);
        }
    }
}

fn arm_timeout(shared: Weak<Shared>, token: SessionToken, timeout: Duration) -> Sender<()> {
    let (tx, rx) = mpsc::channel::<()>();
    thread::spawn(move || {
        if let Err(RecvTimeoutError::Timeout) = rx.recv_timeout(timeout) {
            if let Some(shared) = shared.upgrade() {
                if shared.finish(token) {
                    log::warn!("Screenshot {:?} timed out", token);
                }
            }
        }
    });
    tx
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::time::Instant;

    #[derive(Default)]
    pub(crate) struct FakeScreenshotService {
        pub refuse_bind: Mutex<bool>,
        pub fail_capture: Mutex<bool>,
        pub connections: Mutex<Vec<ScreenshotConnection>>,
        pub replies: Mutex<Vec<CaptureReply>>,
        pub unbinds: Mutex<Vec<SessionToken>>,
    }

    impl FakeScreenshotService {
        pub(crate) fn bind_count(&self) -> usize {
            self.connections.lock().unwrap().len()
        }

        pub(crate) fn unbind_count(&self) -> usize {
            self.unbinds.lock().unwrap().len()
        }

        fn last_connection(&self) -> ScreenshotConnection {
            self.connections.lock().unwrap().last().unwrap().clone()
        }

        fn take_reply(&self) -> CaptureReply {
            self.replies.lock().unwrap().pop().unwrap()
        }
    }

    impl ScreenshotService for FakeScreenshotService {
        fn bind(&self, connection: ScreenshotConnection) -> bool {
            if *self.refuse_bind.lock().unwrap() {
                return false;
            }
            self.connections.lock().unwrap().push(connection);
            true
        }

        fn capture(&self, _token: SessionToken, reply: CaptureReply) -> Result<()> {
            if *self.fail_capture.lock().unwrap() {
                return Err(anyhow!("service died"));
            }
            self.replies.lock().unwrap().push(reply);
            Ok(())
        }

        fn unbind(&self, token: SessionToken) {
            self.unbinds.lock().unwrap().push(token);
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    fn capture_with(service: &Arc<FakeScreenshotService>, timeout: Duration) -> ScreenshotCapture {
        ScreenshotCapture::with_timeout(Arc::clone(service) as Arc<dyn ScreenshotService>, timeout)
    }

    #[test]
    fn test_full_handshake() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(capture.request());
        assert!(capture.is_active());

        service.last_connection().connected();
        let reply = service.take_reply();
        let token = reply.token();
        reply.complete();

        assert!(!capture.is_active());
        assert_eq!(*service.unbinds.lock().unwrap(), vec![token]);
    }

    #[test]
    fn test_second_request_while_in_flight_is_ignored() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(capture.request());
        assert!(!capture.request());
        assert_eq!(service.bind_count(), 1);
    }

    #[test]
    fn test_new_request_accepted_after_completion() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(capture.request());
        service.last_connection().connected();
        service.take_reply().complete();

        assert!(capture.request());
        assert_eq!(service.bind_count(), 2);
    }

    #[test]
    fn test_timeout_releases_binding() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, Duration::from_millis(20));

        assert!(capture.request());
        assert!(wait_until(|| !capture.is_active()));
        assert_eq!(service.unbind_count(), 1);

        assert!(capture.request());
        assert_eq!(service.bind_count(), 2);
    }

    #[test]
    fn test_late_completion_after_timeout_is_ignored() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, Duration::from_millis(20));

        assert!(capture.request());
        service.last_connection().connected();
        let late = service.take_reply();
        assert!(wait_until(|| !capture.is_active()));

        // A newer session must survive the stale reply.
        assert!(capture.request());
        late.complete();
        assert!(capture.is_active());
        assert_eq!(service.unbind_count(), 1);
    }

    #[test]
    fn test_stale_connect_does_not_capture() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(capture.request());
        let first = service.last_connection();
        service.last_connection().connected();
        service.take_reply().complete();

        first.connected();
        assert!(service.replies.lock().unwrap().is_empty());
    }

    #[test]
    fn test_completion_cancels_timeout() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, Duration::from_millis(50));

        assert!(capture.request());
        service.last_connection().connected();
        service.take_reply().complete();

        thread::sleep(Duration::from_millis(150));
        assert_eq!(service.unbind_count(), 1);
    }

    #[test]
    fn test_drop_releases_live_session() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(capture.request());
        let token = service.last_connection().token();
        drop(capture);

        assert_eq!(*service.unbinds.lock().unwrap(), vec![token]);
    }

    #[test]
    fn test_drop_when_idle_does_not_unbind() {
        let service = Arc::new(FakeScreenshotService::default());
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(capture.request());
        service.last_connection().connected();
        service.take_reply().complete();
        drop(capture);

        assert_eq!(service.unbind_count(), 1);
    }

    #[test]
    fn test_refused_bind_stays_idle() {
        let service = Arc::new(FakeScreenshotService::default());
        *service.refuse_bind.lock().unwrap() = true;
        let capture = capture_with(&service, SCREENSHOT_TIMEOUT);

        assert!(!capture.request());
        assert!(!capture.is_active());
    }

    #[test]
    fn test_failed_capture_waits_for_timeout() {
        let service = Arc::new(FakeScreenshotService::default());
        *service.fail_capture.lock().unwrap() = true;
        let capture = capture_with(&service, Duration::from_millis(20));

        assert!(capture.request());
        service.last_connection().connected();
        assert!(wait_until(|| !capture.is_active()));
        assert_eq!(service.unbind_count(), 1);
    }
}
