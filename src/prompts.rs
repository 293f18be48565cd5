use crate::models::AspectRatio;

pub const STRUCTURE: &str = include_str!("../data/prompts/structure.txt");
pub const IMAGE: &str = include_str!("../data/prompts/image.txt");
pub const CHARACTER_REFERENCE: &str = include_str!("../data/prompts/character_reference.txt");
pub const ORIENTATION_LANDSCAPE: &str = include_str!("../data/prompts/orientation_landscape.txt");
pub const ORIENTATION_PORTRAIT: &str = include_str!("../data/prompts/orientation_portrait.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// The template is scanned once; substituted values are copied verbatim and
/// never searched for further placeholders. Unknown keys are left in place.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };

        let key = &after_open[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => {
                result.push_str("{{");
                result.push_str(key);
                result.push_str("}}");
            }
        }
        rest = &after_open[end + 2..];
    }

    result.push_str(rest);
    result
}

/// Composition guidance for the requested frame shape.
pub fn orientation(aspect_ratio: AspectRatio) -> &'static str {
    match aspect_ratio {
        AspectRatio::Landscape => ORIENTATION_LANDSCAPE.trim(),
        AspectRatio::Portrait => ORIENTATION_PORTRAIT.trim(),
    }
}
