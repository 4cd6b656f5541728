// src/utils/html.rs

use std::collections::HashSet;

/// Removes every HTML tag from free text typed by participants.
///
/// Team names, colleges and feedback end up in the admin panel, so no markup
/// is kept at all. `<script>` and `<style>` bodies are dropped with their tags;
/// other tags are unwrapped and their text kept. Special characters come back
/// entity-escaped.
///
/// Quiz prompts are not passed through here: they routinely contain code
/// such as `#include <vector>`.
pub fn strip_markup(input: &str) -> String {
    ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_tags_and_drops_scripts() {
        assert_eq!(strip_markup("<b>Byte</b> Busters"), "Byte Busters");
        assert_eq!(strip_markup("MIT<script>alert(1)</script>"), "MIT");
        assert_eq!(strip_markup("Plain team"), "Plain team");
    }
}
