//! Serial console and log backend.
//!
//! One COM1 writer behind a spinlock; `print!`/`println!` go through it
//! directly, and the `log` facade is wired to the same writer so every
//! module can use `info!`/`warn!` without caring where the bytes go.
//! Until `init` runs (tests never run it) output is simply dropped.

use core::fmt::Write;
use log::{LevelFilter, Metadata, Record};
use spin::Mutex;
use uart_16550::SerialPort;

static COM1: Mutex<Option<SerialPort>> = Mutex::new(None);

/// Bring up COM1 and install the logger. Called once, from the bare-metal
/// entry path, before anything that may want to print.
///
/// # Safety
/// Performs raw port I/O; the caller must be the only owner of the UART.
pub unsafe fn init() {
    let mut port = unsafe { SerialPort::new(0x3F8) };
    port.init();
    *COM1.lock() = Some(port);
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Info);
}

fn _write_str(s: &str) {
    if let Some(ref mut port) = *COM1.lock() {
        for &b in s.as_bytes() {
            let _ = port.send(b);
        }
    }
}

pub struct Console;

impl Write for Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        _write_str(s);
        Ok(())
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {{
        use core::fmt::Write;
        let _ = write!(&mut $crate::console::Console, $($arg)*);
    }};
}

#[macro_export]
macro_rules! println {
    () => { $crate::print!("\n") };
    ($fmt:literal $(, $($arg:tt)+)?) => {{
        $crate::print!(concat!($fmt, "\n") $(, $($arg)+)?);
    }};
}

struct SerialLog;

static LOGGER: SerialLog = SerialLog;

impl log::Log for SerialLog {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        crate::println!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}
