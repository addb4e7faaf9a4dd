//! Emergency silence on SIGINT and SIGTERM.
//!
//! The handler may run while the playback thread is anywhere, holding any lock.
//! It only reaches the device through an atomically published pointer, never logs,
//! and terminates the process with `_exit` once every note has been switched off.

use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::Arc;
use std::time::Instant;

use failure::Fail;

use libc::c_int;

use log::debug;

use crate::midi::{NoteSpace, OutputDevice};

pub const HANDLED_SIGNALS: [c_int; 2] = [libc::SIGINT, libc::SIGTERM];

const INTERRUPTED: &[u8] = b"\nInterrupted: all notes off\n";
const ELAPSED_PREFIX: &[u8] = b"Elapsed time ";
const ELAPSED_BUFFER_SIZE: usize = 48;

static INSTANCE: AtomicPtr<EmergencyStop> = AtomicPtr::new(ptr::null_mut());
static HANDLING: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Fail, PartialEq, Eq)]
pub enum SignalError {
  #[fail(display = "A signal handler is already installed")]
  AlreadyInstalled,

  #[fail(display = "Failed to register the handler for signal {}: errno {}", signal, errno)]
  Register { signal: c_int, errno: i32 },
}

struct EmergencyStop {
  device: Arc<dyn OutputDevice>,
  space: NoteSpace,
  started: Instant,
  fired: AtomicBool,
}

impl EmergencyStop {
  /// Switches every note off, the first time only.
  fn silence(&self) -> bool {
    if self.fired.swap(true, Ordering::SeqCst) {
      return false;
    }
    // Nothing more can be done if the device is gone.
    let _ = self.device.all_notes_off(&self.space);
    true
  }
}

/// Keeps the emergency path armed while alive. Only one can exist at a time.
pub struct SignalHandler {
  previous: Vec<(c_int, libc::sigaction)>,
}

impl SignalHandler {
  pub fn install(device: Arc<dyn OutputDevice>, space: NoteSpace) -> Result<SignalHandler, SignalError> {
    let stop = Box::into_raw(Box::new(EmergencyStop {
      device,
      space,
      started: Instant::now(),
      fired: AtomicBool::new(false),
    }));

    if INSTANCE
      .compare_exchange(ptr::null_mut(), stop, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      drop(unsafe { Box::from_raw(stop) });
      return Err(SignalError::AlreadyInstalled);
    }

    let mut handler = SignalHandler {
      previous: Vec::with_capacity(HANDLED_SIGNALS.len()),
    };
    for &signal in HANDLED_SIGNALS.iter() {
      // Dropping the partially installed handler restores what was registered so far.
      let previous = unsafe { register(signal) }.map_err(|errno| SignalError::Register { signal, errno })?;
      handler.previous.push((signal, previous));
    }

    debug!("Signal handler installed for {:?}", HANDLED_SIGNALS);
    Ok(handler)
  }

  /// Runs the emergency note-off without terminating.
  /// Returns false when it had already run.
  pub fn trigger(&self) -> bool {
    let stop = INSTANCE.load(Ordering::SeqCst);
    if stop.is_null() {
      return false;
    }
    unsafe { &*stop }.silence()
  }
}

impl Drop for SignalHandler {
  fn drop(&mut self) {
    for (signal, previous) in self.previous.drain(..) {
      unsafe {
        libc::sigaction(signal, &previous, ptr::null_mut());
      }
    }

    let stop = INSTANCE.swap(ptr::null_mut(), Ordering::SeqCst);
    if !stop.is_null() && !HANDLING.load(Ordering::SeqCst) {
      drop(unsafe { Box::from_raw(stop) });
    }
    debug!("Signal handler removed");
  }
}

unsafe fn register(signal: c_int) -> Result<libc::sigaction, i32> {
  let mut action: libc::sigaction = mem::zeroed();
  action.sa_sigaction = handle_signal as extern "C" fn(c_int) as libc::sighandler_t;
  action.sa_flags = 0;
  libc::sigemptyset(&mut action.sa_mask);

  let mut previous: libc::sigaction = mem::zeroed();
  if libc::sigaction(signal, &action, &mut previous) != 0 {
    return Err(io::Error::last_os_error().raw_os_error().unwrap_or(0));
  }
  Ok(previous)
}

extern "C" fn handle_signal(signal: c_int) {
  HANDLING.store(true, Ordering::SeqCst);

  let stop = INSTANCE.load(Ordering::SeqCst);
  if !stop.is_null() {
    let stop = unsafe { &*stop };
    stop.silence();
    write_stderr(INTERRUPTED);

    let mut buffer = [0u8; ELAPSED_BUFFER_SIZE];
    let len = format_elapsed(stop.started.elapsed().as_secs(), &mut buffer);
    write_stderr(&buffer[..len]);
  }

  unsafe { libc::_exit(128 + signal) }
}

fn write_stderr(bytes: &[u8]) {
  unsafe {
    libc::write(libc::STDERR_FILENO, bytes.as_ptr() as *const libc::c_void, bytes.len());
  }
}

/// Writes `Elapsed time M:SS` and a new line without allocating.
fn format_elapsed(seconds: u64, out: &mut [u8; ELAPSED_BUFFER_SIZE]) -> usize {
  let mut len = ELAPSED_PREFIX.len();
  out[..len].copy_from_slice(ELAPSED_PREFIX);

  let minutes = seconds / 60;
  let mut digits = [0u8; 20];
  let mut count = 0;
  let mut value = minutes;
  loop {
    digits[count] = b'0' + (value % 10) as u8;
    count += 1;
    value /= 10;
    if value == 0 {
      break;
    }
  }
  for digit in digits[..count].iter().rev() {
    out[len] = *digit;
    len += 1;
  }

  let rest = seconds % 60;
  out[len] = b':';
  out[len + 1] = b'0' + (rest / 10) as u8;
  out[len + 2] = b'0' + (rest % 10) as u8;
  out[len + 3] = b'\n';
  len + 4
}
