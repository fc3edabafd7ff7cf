//! Logging macros.
//!
//! Unlike the plain functions, the macros also record the enclosing
//! function's path, and they skip formatting entirely when the level would
//! be dropped. Each accepts an optional leading `in <facade>,` to log
//! through an explicit [`LogFacade`](crate::LogFacade) instead of the
//! process-wide one.

/// Path of the function the macro is expanded in
#[doc(hidden)]
#[macro_export]
macro_rules! __function_path {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let mut name = __type_name_of(__here);
        name = name.strip_suffix("::__here").unwrap_or(name);
        while let Some(outer) = name.strip_suffix("::{{closure}}") {
            name = outer;
        }
        name
    }};
}

/// The [`Caller`](crate::Caller) of the invocation site, function included
#[macro_export]
macro_rules! caller {
    () => {
        $crate::Caller::new(
            ::std::file!(),
            ::std::line!(),
            ::std::column!(),
            ::std::option::Option::Some($crate::__function_path!()),
        )
    };
}

/// Variadic form: the arguments' `Display` output joined by single spaces.
///
/// Every operand is separated by a space, strings included, so this also
/// serves as the `println`-style shape; the message never ends in a newline.
///
/// ```ignore
/// mnemosyne::log!(Level::Info, "listening on", addr, "with", workers, "workers");
/// ```
#[macro_export]
macro_rules! log {
    (in $facade:expr, $level:expr, $($arg:expr),+ $(,)?) => {{
        let facade = &$facade;
        let level: $crate::Level = $level;
        if facade.will_handle(level) {
            let parts: ::std::vec::Vec<::std::string::String> =
                ::std::vec![$(::std::string::ToString::to_string(&$arg)),+];
            facade.log_at(level, $crate::caller!(), parts.join(" "), &[]);
        }
    }};
    ($level:expr, $($arg:expr),+ $(,)?) => {
        $crate::log!(in $crate::global(), $level, $($arg),+)
    };
}

/// Formatted form with `format!` semantics
#[macro_export]
macro_rules! logf {
    (in $facade:expr, $level:expr, $($arg:tt)+) => {{
        let facade = &$facade;
        let level: $crate::Level = $level;
        if facade.will_handle(level) {
            facade.log_at(level, $crate::caller!(), ::std::format!($($arg)+), &[]);
        }
    }};
    ($level:expr, $($arg:tt)+) => {
        $crate::logf!(in $crate::global(), $level, $($arg)+)
    };
}

/// Structured form: a message followed by `key => value` pairs.
///
/// Values may be anything `Serialize`.
#[macro_export]
macro_rules! logw {
    (in $facade:expr, $level:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {{
        let facade = &$facade;
        let level: $crate::Level = $level;
        if facade.will_handle(level) {
            let fields: ::std::vec::Vec<$crate::Field> =
                ::std::vec![$($crate::Field::serialized($key, &$value)),*];
            facade.log_at(
                level,
                $crate::caller!(),
                ::std::string::ToString::to_string(&$msg),
                &fields,
            );
        }
    }};
    ($level:expr, $msg:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::logw!(in $crate::global(), $level, $msg $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! debug {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::Debug, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::Debug, $($arg)+) };
}

#[macro_export]
macro_rules! info {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::Info, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::Info, $($arg)+) };
}

#[macro_export]
macro_rules! warn {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::Warn, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::Warn, $($arg)+) };
}

#[macro_export]
macro_rules! error {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::Error, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::Error, $($arg)+) };
}

#[macro_export]
macro_rules! dpanic {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::DPanic, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::DPanic, $($arg)+) };
}

/// Log at Panic level, then panic with the message
#[macro_export]
macro_rules! panic {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::Panic, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::Panic, $($arg)+) };
}

/// Log at Fatal level, then run the fatal hook (exit code 1 by default)
#[macro_export]
macro_rules! fatal {
    (in $facade:expr, $($arg:tt)+) => { $crate::logf!(in $facade, $crate::Level::Fatal, $($arg)+) };
    ($($arg:tt)+) => { $crate::logf!($crate::Level::Fatal, $($arg)+) };
}
