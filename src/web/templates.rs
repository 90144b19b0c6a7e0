use minijinja::Environment;
use tracing::error;

pub fn init_templates() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();

    // Register built-in templates
    env.add_template("index.html", include_str!("../../templates/index.html"))?;

    Ok(env)
}

pub fn render_template(
    env: &Environment,
    template_name: &str,
    context: minijinja::value::Value,
) -> String {
    match env.get_template(template_name) {
        Ok(tmpl) => match tmpl.render(context) {
            Ok(result) => result,
            Err(e) => {
                error!("Template render error: {}", e);
                format!("<h1>Template Error</h1><p>{}</p>", e)
            }
        },
        Err(e) => {
            error!("Template not found: {} ({})", template_name, e);
            format!("<h1>Template Not Found</h1><p>{}: {}</p>", template_name, e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_index_renders_form_without_answer() {
        let env = init_templates().unwrap();
        let html = render_template(&env, "index.html", context! { question => "" });

        assert!(html.contains("<textarea"));
        assert!(html.contains("name=\"question\""));
        assert!(html.contains("Generate SQL"));
        assert!(!html.contains("<table"));
    }

    #[test]
    fn test_missing_template_renders_error_page() {
        let env = init_templates().unwrap();
        let html = render_template(&env, "nope.html", context! {});

        assert!(html.contains("Template Not Found"));
    }
}
