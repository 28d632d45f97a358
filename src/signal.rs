use std::io;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static CHILD_HAS_CONTROL: AtomicBool = AtomicBool::new(false);
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Set by the console handler once the child is running. The supervisor
/// polls the flag or, on Windows, waits on the event.
#[derive(Debug)]
pub struct Interrupt {
    raised: AtomicBool,
    #[cfg(windows)]
    event: std::os::windows::io::OwnedHandle,
}

impl Interrupt {
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            raised: AtomicBool::new(false),
            #[cfg(windows)]
            event: crate::process::sys::create_event()?,
        })
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        #[cfg(windows)]
        crate::process::sys::set_event(&self.event);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    #[cfg(windows)]
    pub fn event(&self) -> &std::os::windows::io::OwnedHandle {
        &self.event
    }
}

/// From now on interrupts are relayed to the child instead of ending us.
pub fn pass_control_to_child() {
    CHILD_HAS_CONTROL.store(true, Ordering::SeqCst);
}

pub fn setup_signal_handler(interrupt: Arc<Interrupt>) {
    let result = ctrlc::set_handler(move || {
        if !CHILD_HAS_CONTROL.load(Ordering::SeqCst) {
            exit(INTERRUPTED_EXIT_CODE);
        }
        interrupt.raise();
    });

    if result.is_err() {
        log::warn!("Unable to set Ctrl+C handler, interrupts will not be relayed to PROGRAM");
    }
}
