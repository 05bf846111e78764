use include_dir::{include_dir, Dir};
use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Embedded into the final binary; holds the analysis instruction templates.
static PROMPTS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/prompts");

static GLOBAL_ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);

    for file in PROMPTS_DIR.files() {
        let name = file.path().to_string_lossy().to_string();
        let source = String::from_utf8_lossy(file.contents()).to_string();

        // The 'static Environment needs 'static template strings; leaking
        // once at initialization is fine for an embedded, fixed set.
        let static_name: &'static str = Box::leak(name.into_boxed_str());
        let static_source: &'static str = Box::leak(source.into_boxed_str());

        if let Err(e) = env.add_template(static_name, static_source) {
            tracing::error!("Failed to add template {}: {}", static_name, e);
        }
    }

    env
});

/// Render an embedded template with the given context.
pub(crate) fn render_file<S: Serialize>(
    template_name: &str,
    context: &S,
) -> Result<String, minijinja::Error> {
    let template = GLOBAL_ENV.get_template(template_name)?;
    template.render(context)
}
