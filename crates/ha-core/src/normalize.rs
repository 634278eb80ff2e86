//! Identifier normalization

/// Normalize a free-form string into a lowercase, underscore separated slug
///
/// Non-alphanumeric runs collapse into a single `_` and leading/trailing
/// separators are dropped, so `"Living Room #2"` becomes `"living_room_2"`.
pub fn slugify(value: &str) -> String {
    ::slug::slugify(value).replace('-', "_")
}
