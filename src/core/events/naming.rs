//=========================================================================
// Handler Naming
//=========================================================================
//
// Derives handler names from event type names:
//
//   KeyPressed        → on_key_pressed
//   HTTPResponseCode  → on_http_response_code
//
//=========================================================================

/// Converts a CamelCase identifier to snake_case.
///
/// An underscore is inserted between a lowercase letter or digit and a
/// following uppercase letter, and before the last capital of an
/// uppercase run that is followed by a lowercase letter, so acronyms stay
/// together.
pub fn camel_to_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();

            let after_lower = prev.is_lowercase() || prev.is_ascii_digit();
            let ends_acronym =
                prev.is_uppercase() && next.is_some_and(|n| n.is_lowercase());

            if after_lower || ends_acronym {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// Handler name for an event type name: `on_` + snake_case.
pub fn handler_name(event_name: &str) -> String {
    format!("on_{}", camel_to_snake(event_name))
}

/// Strips the module path and generic arguments from a type name.
///
/// `my_game::events::Scored<u32>` → `Scored`
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_to_snake_table() {
        let table = [
            ("CamelCase", "camel_case"),
            ("CamelCamelCase", "camel_camel_case"),
            ("Camel2Camel2Case", "camel2_camel2_case"),
            ("getHTTPResponseCode", "get_http_response_code"),
            ("get2HTTPResponseCode", "get2_http_response_code"),
            ("HTTPResponseCode", "http_response_code"),
            ("HTTPResponseCodeXYZ", "http_response_code_xyz"),
            ("Idle", "idle"),
            ("PreRender", "pre_render"),
            ("AssetLoaded", "asset_loaded"),
            ("lowercase", "lowercase"),
        ];

        for (input, expected) in table {
            assert_eq!(camel_to_snake(input), expected, "converting {input}");
        }
    }

    #[test]
    fn handler_names_are_prefixed() {
        assert_eq!(handler_name("KeyPressed"), "on_key_pressed");
        assert_eq!(handler_name("SceneStarted"), "on_scene_started");
    }

    #[test]
    fn short_type_name_strips_path_and_generics() {
        assert_eq!(short_type_name("a::b::Update"), "Update");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
