//! Internal error handling macros.
//!
//! Provides two categories of error handling:
//!
//! - [`fatal!`]: For unrecoverable naming-layer bugs (invariant violations)
//! - [`raise!`]: For recoverable system errors (accounting limits)

/// Displays a system error message and aborts the program.
///
/// Use this for unrecoverable errors that indicate bugs in the naming layer
/// itself, such as credit accounting going negative on the owning locality.
/// The program prints a diagnostic message and immediately aborts without
/// unwinding.
///
/// # Examples
///
/// ```ignore
/// if credits > outstanding {
///   fatal!("settled more credit than was ever issued");
/// }
/// ```
macro_rules! fatal {
  ($($error:tt)*) => {{
    ::std::eprintln!(
      "{}:{}: (SysInv) a naming invariant has been broken: {}",
      ::std::file!(),
      ::std::line!(),
      ::std::format_args!($($error)*),
    );

    ::std::process::abort();
  }};
}

/// Panics with a recoverable system error.
///
/// Use this for resource exhaustion that may be recoverable at a higher
/// level. The program panics with a diagnostic message indicating which
/// limit was exceeded.
///
/// # Examples
///
/// ```ignore
/// if outstanding.checked_add(credits).is_none() {
///   raise!(Capacity, "credit issue counter overflow");
/// }
/// ```
macro_rules! raise {
  (Capacity, $($error:tt)*) => {
    ::std::panic!(
      "{}:{}: (SysCap) a naming limit has been reached: {}",
      ::std::file!(),
      ::std::line!(),
      ::std::format_args!($($error)*),
    )
  };
}

pub(crate) use fatal;
pub(crate) use raise;
