//! Destinations for `PRINT_INT` output.

/// Receives every value popped by `PRINT_INT`, in execution order.
pub trait PrintSink {
    fn print(&mut self, value: i16);
}

/// Writes each value to stdout on its own line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl PrintSink for StdoutSink {
    fn print(&mut self, value: i16) {
        println!("{value}");
    }
}

/// Collects values in memory.
impl PrintSink for Vec<i16> {
    fn print(&mut self, value: i16) {
        self.push(value);
    }
}

impl<S: PrintSink + ?Sized> PrintSink for &mut S {
    fn print(&mut self, value: i16) {
        (**self).print(value);
    }
}
