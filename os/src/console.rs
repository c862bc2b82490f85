use core::fmt;
#[cfg(not(test))]
use core::fmt::Write;
#[cfg(not(test))]
use spin::Mutex;

#[cfg(not(test))]
struct Stdout;

#[cfg(not(test))]
static STDOUT: Mutex<Stdout> = Mutex::new(Stdout);

#[cfg(not(test))]
impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.bytes() {
            crate::arch::console_putchar(c);
        }
        Ok(())
    }
}

#[cfg(not(test))]
pub fn print(args: fmt::Arguments) {
    STDOUT.lock().write_fmt(args).unwrap();
}

#[cfg(test)]
pub fn print(args: fmt::Arguments) {
    std::print!("{}", args);
}

/// Prints to the kernel console.
#[macro_export]
macro_rules! print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!($fmt $(, $($arg)+)?))
    };
}

/// Prints to the kernel console, with a newline.
#[macro_export]
macro_rules! println {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!(concat!($fmt, "\n") $(, $($arg)+)?))
    }
}
