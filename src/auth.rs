//! Local access gate: a fixed PIN or a face match against a stored reference.
//!
//! This is a convenience lock, not a security boundary. The PIN is a constant,
//! the reference image lives in local storage and the decision is a boolean
//! computed on the client.

use log::{info, warn};
use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{Result, StatementError};
use crate::schema::ImagePayload;
use crate::storage::{KeyValueStore, FACE_REFERENCE_KEY};

pub const DEFAULT_PIN: &str = "1234";
pub const PIN_LENGTH: usize = 4;
pub const PIN_ERROR_CLEAR_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Locked,
    /// Face unlock requested but no reference image is stored yet.
    FaceSetupPending,
    /// A reference image exists; a live capture can be verified.
    FaceRegistered,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinOutcome {
    /// Digit accepted, buffer not full yet.
    Pending,
    Unlocked,
    /// Four digits entered and they did not match.
    Rejected,
    /// Key press had no effect.
    Ignored,
}

/// An exclusively held capture device.
pub trait Camera {
    fn start(&mut self) -> Result<()>;
    fn capture_frame(&mut self) -> Result<ImagePayload>;
    fn stop(&mut self);
}

/// A started camera. Stopping happens on drop, so every successful start is
/// paired with exactly one stop on every exit path.
pub struct CameraSession<'a, C: Camera> {
    camera: &'a mut C,
}

impl<'a, C: Camera> CameraSession<'a, C> {
    pub fn acquire(camera: &'a mut C) -> Result<Self> {
        camera.start()?;
        Ok(Self { camera })
    }

    pub fn capture(&mut self) -> Result<ImagePayload> {
        self.camera.capture_frame()
    }
}

impl<C: Camera> Drop for CameraSession<'_, C> {
    fn drop(&mut self) {
        self.camera.stop();
    }
}

/// Compares a stored reference face with a live frame.
pub trait FaceVerifier {
    fn compare(
        &self,
        reference: &ImagePayload,
        live: &ImagePayload,
    ) -> impl Future<Output = Result<bool>> + Send;
}

#[derive(Debug, Clone)]
pub struct IdentityGate {
    state: GateState,
    expected_pin: String,
    pin: String,
    pin_error_at: Option<Instant>,
}

impl Default for IdentityGate {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityGate {
    pub fn new() -> Self {
        Self::with_pin(DEFAULT_PIN)
    }

    pub fn with_pin(expected_pin: impl Into<String>) -> Self {
        Self {
            state: GateState::Locked,
            expected_pin: expected_pin.into(),
            pin: String::new(),
            pin_error_at: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == GateState::Unlocked
    }

    pub fn pin_len(&self) -> usize {
        self.pin.len()
    }

    pub fn has_pin_error(&self) -> bool {
        self.pin_error_at.is_some()
    }

    pub fn press_digit(&mut self, digit: u8) -> PinOutcome {
        if self.is_unlocked() || digit > 9 {
            return PinOutcome::Ignored;
        }
        if self.pin_error_at.is_some() {
            self.clear_pin_error();
        }
        if self.pin.len() >= PIN_LENGTH {
            return PinOutcome::Ignored;
        }

        self.pin.push(char::from(b'0' + digit));
        if self.pin.len() < PIN_LENGTH {
            return PinOutcome::Pending;
        }

        if self.pin == self.expected_pin {
            info!("Unlocked with PIN");
            self.pin.clear();
            self.state = GateState::Unlocked;
            PinOutcome::Unlocked
        } else {
            warn!("Incorrect PIN entered");
            self.pin_error_at = Some(Instant::now());
            PinOutcome::Rejected
        }
    }

    pub fn backspace(&mut self) {
        if self.is_unlocked() {
            return;
        }
        self.pin.pop();
        self.pin_error_at = None;
    }

    /// Clears a rejected PIN once the error has been visible long enough.
    /// Returns true when the buffer was cleared.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pin_error_at {
            Some(at) if now.saturating_duration_since(at) >= PIN_ERROR_CLEAR_DELAY => {
                self.clear_pin_error();
                true
            }
            _ => false,
        }
    }

    fn clear_pin_error(&mut self) {
        self.pin.clear();
        self.pin_error_at = None;
    }

    /// Starts the face path: verification if a reference exists, setup otherwise.
    pub fn begin_face_auth<S: KeyValueStore>(&mut self, store: &S) -> Result<GateState> {
        if self.is_unlocked() {
            return Ok(self.state);
        }
        self.state = if store.get(FACE_REFERENCE_KEY)?.is_some() {
            GateState::FaceRegistered
        } else {
            GateState::FaceSetupPending
        };
        Ok(self.state)
    }

    /// Stores an uploaded or captured image as the face reference, keeping
    /// its MIME type.
    pub fn register_face<S: KeyValueStore>(
        &mut self,
        store: &mut S,
        image: &ImagePayload,
    ) -> Result<()> {
        if image.data.trim().is_empty() {
            return Err(StatementError::InvalidEntry(
                "Face reference image is empty".to_string(),
            ));
        }
        store.set(FACE_REFERENCE_KEY, &image.to_data_url())?;
        info!("Face reference registered");
        if !self.is_unlocked() {
            self.state = GateState::FaceRegistered;
        }
        Ok(())
    }

    /// Captures one frame and stores it as the face reference.
    pub fn register_face_from_camera<S: KeyValueStore, C: Camera>(
        &mut self,
        store: &mut S,
        camera: &mut C,
    ) -> Result<()> {
        let frame = {
            let mut session = CameraSession::acquire(camera)?;
            session.capture()?
        };
        self.register_face(store, &frame)
    }

    pub fn forget_face<S: KeyValueStore>(&mut self, store: &mut S) -> Result<()> {
        store.remove(FACE_REFERENCE_KEY)?;
        if !self.is_unlocked() {
            self.state = GateState::Locked;
        }
        Ok(())
    }

    /// Captures a live frame and asks the verifier to compare it with the
    /// stored reference. The camera is released before the comparison call.
    /// Any failure or a non-match leaves the gate `Locked` for a retry.
    pub async fn verify_face<S, C, V>(
        &mut self,
        store: &S,
        camera: &mut C,
        verifier: &V,
    ) -> Result<GateState>
    where
        S: KeyValueStore,
        C: Camera,
        V: FaceVerifier,
    {
        if self.is_unlocked() {
            return Ok(self.state);
        }

        let Some(reference) = store.get(FACE_REFERENCE_KEY)? else {
            self.state = GateState::FaceSetupPending;
            return Err(StatementError::FaceVerification(
                "No face reference registered".to_string(),
            ));
        };

        let live = {
            let session = CameraSession::acquire(camera);
            match session {
                Ok(mut session) => session.capture(),
                Err(e) => Err(e),
            }
        };
        let live = match live {
            Ok(frame) => frame,
            Err(e) => {
                self.state = GateState::Locked;
                return Err(StatementError::FaceVerification(format!(
                    "Camera access required: {}",
                    e
                )));
            }
        };

        let outcome = verifier
            .compare(&ImagePayload::from_data_url(&reference), &live)
            .await;

        match outcome {
            Ok(true) => {
                info!("Unlocked with face match");
                self.pin.clear();
                self.pin_error_at = None;
                self.state = GateState::Unlocked;
                Ok(self.state)
            }
            Ok(false) => {
                warn!("Face did not match the stored reference");
                self.state = GateState::Locked;
                Err(StatementError::FaceVerification(
                    "Face did not match".to_string(),
                ))
            }
            Err(e) => {
                self.state = GateState::Locked;
                Err(match e {
                    StatementError::FaceVerification(_) => e,
                    other => StatementError::FaceVerification(other.to_string()),
                })
            }
        }
    }

    /// Returns to the locked screen (logout).
    pub fn lock(&mut self) {
        self.state = GateState::Locked;
        self.pin.clear();
        self.pin_error_at = None;
    }
}
