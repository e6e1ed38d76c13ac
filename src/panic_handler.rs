use log::error;
use std::io::{self, Write};
use std::panic;

/// Install `better_panic` output and make sure the panic also reaches the log
/// file before the process exits.
pub fn initialize_panic_handler() {
    better_panic::install();

    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        error!("Engine panicked: {panic_info}");
        log::logger().flush();
        flush_output();

        default_hook(panic_info);

        std::process::exit(1);
    }));
}

/// Push notifications already written to stdout out to the host
pub fn flush_output() {
    let _ = io::stdout().flush();
}
