//! Frame scheduling
//!
//! The game loop asks a scheduler for "one more frame" at the end of every
//! frame and cancels the outstanding request on stop. In the browser that is
//! `requestAnimationFrame`; headless hosts and tests drive frames by hand.

/// Handle for an outstanding frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Something that can schedule the next frame callback
pub trait FrameScheduler {
    /// Request one more frame
    fn request(&mut self) -> Option<FrameHandle>;

    /// Cancel a request made with `request`
    fn cancel(&mut self, handle: FrameHandle);
}

/// Records requests; the host calls `Game::frame` itself
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    next: i32,
    pending: Option<FrameHandle>,
    pub requested: u64,
    pub cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outstanding request, if any
    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Consume the outstanding request (the host is about to run the frame)
    pub fn take(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request(&mut self) -> Option<FrameHandle> {
        self.next = self.next.wrapping_add(1);
        let handle = FrameHandle(self.next);
        self.pending = Some(handle);
        self.requested += 1;
        Some(handle)
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AnimationFrameScheduler;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;

    use super::{FrameHandle, FrameScheduler};

    type FrameCallback = Rc<RefCell<Option<Box<dyn FnMut(f64)>>>>;

    /// `requestAnimationFrame` scheduler
    ///
    /// The frame callback is installed after construction because it usually
    /// needs a handle to the game that owns this scheduler.
    pub struct AnimationFrameScheduler {
        window: web_sys::Window,
        callback: FrameCallback,
    }

    impl AnimationFrameScheduler {
        pub fn new(window: web_sys::Window) -> Self {
            Self {
                window,
                callback: Rc::new(RefCell::new(None)),
            }
        }

        /// Shared slot the host fills with its per-frame closure
        pub fn callback_slot(&self) -> FrameCallback {
            self.callback.clone()
        }
    }

    impl FrameScheduler for AnimationFrameScheduler {
        fn request(&mut self) -> Option<FrameHandle> {
            let slot = self.callback.clone();
            let closure = Closure::once(move |time: f64| {
                // Take the callback out so it can re-borrow the game freely
                let callback = slot.borrow_mut().take();
                if let Some(mut callback) = callback {
                    callback(time);
                    let mut current = slot.borrow_mut();
                    if current.is_none() {
                        *current = Some(callback);
                    }
                }
            });
            let result = self
                .window
                .request_animation_frame(closure.as_ref().unchecked_ref());
            closure.forget();
            match result {
                Ok(id) => Some(FrameHandle(id)),
                Err(err) => {
                    log::error!("requestAnimationFrame failed: {err:?}");
                    None
                }
            }
        }

        fn cancel(&mut self, handle: FrameHandle) {
            let _ = self.window.cancel_animation_frame(handle.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_cancel_only_matches_pending() {
        let mut scheduler = ManualScheduler::new();
        let first = scheduler.request().unwrap();
        let second = scheduler.request().unwrap();
        assert_ne!(first, second);

        scheduler.cancel(first);
        assert_eq!(scheduler.pending(), Some(second));
        assert_eq!(scheduler.cancelled, 0);

        scheduler.cancel(second);
        assert_eq!(scheduler.pending(), None);
        assert_eq!(scheduler.cancelled, 1);
    }
}
