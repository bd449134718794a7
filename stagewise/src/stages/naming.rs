//! Display names derived from Rust type names.

/// Placeholder segment the compiler uses for closures.
const CLOSURE_SEGMENT: &str = "{{closure}}";

/// Derives a short, deterministic display name for a type.
///
/// Module paths and generic arguments are dropped, so a fn item
/// `my_app::stages::reserve_stock` becomes `reserve_stock`. Closures keep
/// their enclosing function, e.g. `build::{{closure}}`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let path = full.split('<').next().unwrap_or(full);
    let segments: Vec<&str> = path.split("::").filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        [] => full.to_string(),
        [.., parent, last] if *last == CLOSURE_SEGMENT => format!("{parent}::{last}"),
        [.., last] => (*last).to_string(),
    }
}

/// Short display name of `T`.
#[must_use]
pub fn type_display_name<T: ?Sized>() -> String {
    short_type_name(std::any::type_name::<T>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reserve_stock() {}

    struct AuditStage;

    #[test]
    fn test_fn_item_name() {
        fn name_of<F>(_: &F) -> String {
            type_display_name::<F>()
        }

        assert_eq!(name_of(&reserve_stock), "reserve_stock");
    }

    #[test]
    fn test_struct_name() {
        assert_eq!(type_display_name::<AuditStage>(), "AuditStage");
    }

    #[test]
    fn test_generics_are_dropped() {
        assert_eq!(
            short_type_name("my_app::stages::Wrapper<alloc::string::String>"),
            "Wrapper"
        );
    }

    #[test]
    fn test_closure_keeps_enclosing_fn() {
        assert_eq!(
            short_type_name("my_app::pipeline::build::{{closure}}"),
            "build::{{closure}}"
        );
    }

    #[test]
    fn test_name_is_deterministic() {
        let closure = |x: i32| x + 1;
        let first = type_display_name_of(&closure);
        let second = type_display_name_of(&closure);

        assert_eq!(first, second);
        assert!(first.ends_with(CLOSURE_SEGMENT));
    }

    fn type_display_name_of<T>(_: &T) -> String {
        type_display_name::<T>()
    }
}
