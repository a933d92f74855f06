use askama::{Error as AskamaError, Template};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("template `{template}` failed to render")]
pub struct TemplateRenderError {
    template: &'static str,
    #[source]
    error: AskamaError,
}

pub fn render_template<T: Template>(template: &T) -> Result<String, TemplateRenderError> {
    template.render().map_err(|error| TemplateRenderError {
        template: std::any::type_name::<T>(),
        error,
    })
}

/// The iframe content: player markup plus the generated popcorn script.
#[derive(Template)]
#[template(path = "embed.html")]
pub struct EmbedTemplate<'a> {
    pub id: i64,
    pub author: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub media_src: &'a str,
    pub embed_shell_src: &'a str,
    pub project_url: &'a str,
    pub app_hostname: &'a str,
    pub popcorn: &'a str,
    pub thumbnail: Option<&'a str>,
}

/// The public landing page that frames the embed with edit/remix links.
#[derive(Template)]
#[template(path = "embed_shell.html")]
pub struct EmbedShellTemplate<'a> {
    pub author: &'a str,
    pub project_name: &'a str,
    pub description: &'a str,
    pub embed_shell_src: &'a str,
    pub embed_src: &'a str,
    pub project_url: &'a str,
    pub app_hostname: &'a str,
    pub thumbnail: Option<&'a str>,
    pub make_id: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "redirect.html")]
pub struct RedirectTemplate<'a> {
    pub target: &'a str,
}
