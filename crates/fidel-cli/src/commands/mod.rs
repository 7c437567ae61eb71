/// Unwrap a result or print the error with `fmt` and exit with status 1.
#[macro_export]
macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            std::process::exit(1);
        })
    };
}

pub mod config_ops;
pub mod mapping_ops;
pub mod replay_ops;
