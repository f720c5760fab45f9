//! Prompt assembly for sticker requests.

/// Theme substituted when the user leaves it blank.
pub const DEFAULT_PROMPT_THEME: &str = "Friendly Character";

/// Family-friendly die-cut sticker prompt.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"Task: Create a professional 2D cartoon messaging sticker.

SUBJECT CATEGORY: A family-friendly cartoon version of "{theme}"
REQUIRED EMOTION: {expression}

ART STYLE SPECS:
- High-quality digital vector art style.
- Thick, continuous white die-cut contour border (sticker style).
- Pure white background (no shadows or gradients on background).
- Clear, friendly facial features maintaining the subject's identity from the photo.
- Vibrant, saturated colors with clean cel-shading.
- Playful, expressive, and simplified character design.
- Safety: Ensure the result is wholesome, non-violent, and suitable for all ages.
- NO TEXT, NO REALISTIC TEXTURES, NO BACKGROUND SCENERY."#;

/// Renders the text part sent alongside the source photo.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    /// Use a custom template with `{theme}` and `{expression}` placeholders.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Build from an optional configured template.
    pub fn from_config(template: Option<&str>) -> Self {
        match template {
            Some(template) if !template.trim().is_empty() => Self::with_template(template),
            _ => Self::default(),
        }
    }

    pub fn render(&self, theme: &str, expression: &str) -> String {
        let theme = theme.trim();
        let theme = if theme.is_empty() {
            DEFAULT_PROMPT_THEME
        } else {
            theme
        };
        let mut rendered = String::with_capacity(self.template.len() + theme.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            rendered.push_str(&rest[..start]);
            let tail = &rest[start..];
            if let Some(after) = tail.strip_prefix("{theme}") {
                rendered.push_str(theme);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{expression}") {
                rendered.push_str(expression);
                rest = after;
            } else {
                rendered.push('{');
                rest = &tail[1..];
            }
        }
        rendered.push_str(rest);
        rendered
    }
}
