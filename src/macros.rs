// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand!

    // Zero-arg → String::new()
    () => {
        ::std::string::String::new()
    };
    // Any single expression: works for literals, consts, or vars
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

/// First candidate that is `Some` and not blank, trimmed into an owned `String`.
/// Candidates are `Option<&str>` / `Option<String>` and are evaluated lazily, left to right.
#[macro_export]
macro_rules! first_filled {
    ($($cand:expr),+ $(,)?) => {{
        let mut out: ::std::option::Option<::std::string::String> = None;
        $(
            if out.is_none() {
                if let Some(v) = $cand {
                    let v: &str = ::std::convert::AsRef::<str>::as_ref(&v);
                    let t = v.trim();
                    if !t.is_empty() {
                        out = Some(::std::string::String::from(t));
                    }
                }
            }
        )+
        out
    }};
}
