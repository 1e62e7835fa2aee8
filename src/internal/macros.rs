// ========================================================================= //

macro_rules! io_bail {
    ($kind:ident, $($arg:tt)+) => {
        return Err(::std::io::Error::new(
            ::std::io::ErrorKind::$kind,
            format!($($arg)+),
        ))
    };
}

/// Returns early with an `InvalidData` I/O error, for malformed input.
macro_rules! invalid_data {
    ($($arg:tt)+) => { io_bail!(InvalidData, $($arg)+) };
}

/// Returns early with an `InvalidInput` I/O error, for bad arguments.
macro_rules! invalid_input {
    ($($arg:tt)+) => { io_bail!(InvalidInput, $($arg)+) };
}

/// Returns early with a `NotFound` I/O error.
macro_rules! not_found {
    ($($arg:tt)+) => { io_bail!(NotFound, $($arg)+) };
}

// ========================================================================= //
