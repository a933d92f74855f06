//! Rendering of the six HTML artifacts a publish writes.

use std::fmt;

use bytes::Bytes;
use thiserror::Error;
use url::Url;

use crate::{
    application::popcorn,
    domain::{
        entities::ProjectRecord,
        error::DomainError,
        ids::{ArtifactLayout, ProjectId, Username},
        scene::ProjectData,
    },
    presentation::views::{
        EmbedShellTemplate, EmbedTemplate, RedirectTemplate, TemplateRenderError, render_template,
    },
    util::html::compress_html_entities,
};

pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";
pub const DEFAULT_DESCRIPTION: &str =
    "Created with Popcorn Maker - part of the Mozilla Webmaker initiative";

/// Inputs of one publish call. Lives only for the duration of that call.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub project: ProjectRecord,
    pub actor_username: String,
    pub app_hostname: String,
}

/// The six artifacts, in the order their uploads are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Embed,
    EmbedShell,
    EmbedEdit,
    EmbedRemix,
    ShellEdit,
    ShellRemix,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::Embed,
        ArtifactKind::EmbedShell,
        ArtifactKind::EmbedEdit,
        ArtifactKind::EmbedRemix,
        ArtifactKind::ShellEdit,
        ArtifactKind::ShellRemix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Embed => "embed",
            ArtifactKind::EmbedShell => "embed_shell",
            ArtifactKind::EmbedEdit => "embed_edit",
            ArtifactKind::EmbedRemix => "embed_remix",
            ArtifactKind::ShellEdit => "shell_edit",
            ArtifactKind::ShellRemix => "shell_remix",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ArtifactKind::Embed => "embed fragment",
            ArtifactKind::EmbedShell => "embed shell page",
            ArtifactKind::EmbedEdit => "embed edit redirect",
            ArtifactKind::EmbedRemix => "embed remix redirect",
            ArtifactKind::ShellEdit => "embed shell edit redirect",
            ArtifactKind::ShellRemix => "embed shell remix redirect",
        }
    }

    fn redirect_action(self) -> Option<&'static str> {
        match self {
            ArtifactKind::EmbedEdit | ArtifactKind::ShellEdit => Some("edit"),
            ArtifactKind::EmbedRemix | ArtifactKind::ShellRemix => Some("remix"),
            ArtifactKind::Embed | ArtifactKind::EmbedShell => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rendered document, ready for a single upload.
#[derive(Debug, Clone)]
pub struct ArtifactSpec {
    pub kind: ArtifactKind,
    pub key: String,
    pub content_type: &'static str,
    pub payload: Bytes,
    pub description: &'static str,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to render {kind}: {source}")]
    Template {
        kind: ArtifactKind,
        #[source]
        source: TemplateRenderError,
    },
}

/// Everything the renderer needs, validated before any upload is issued.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    project_id: ProjectId,
    id_base36: String,
    author: String,
    name: String,
    description: String,
    thumbnail: Option<String>,
    make_id: Option<String>,
    scene: ProjectData,
    attribution_url: String,
    embed_key: String,
    shell_key: String,
    embed_url: Url,
    shell_url: Url,
    project_url: String,
    app_hostname: String,
}

impl PublishPlan {
    pub fn prepare(request: &PublishRequest, layout: &ArtifactLayout) -> Result<Self, DomainError> {
        let project = &request.project;
        let project_id = ProjectId::new(project.id)?;
        let username = Username::parse(&request.actor_username)?;
        let scene = ProjectData::parse(&project.data)?;
        let attribution_url = scene.attribution_url()?.to_string();

        let id_base36 = project_id.base36();
        let description = project
            .description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION)
            .to_string();

        Ok(Self {
            embed_key: layout.embed_path(&username, &id_base36),
            shell_key: layout.embed_shell_path(&username, &id_base36),
            embed_url: layout.embed_url(&username, &id_base36),
            shell_url: layout.embed_shell_url(&username, &id_base36),
            project_url: format!("/editor/{project_id}"),
            app_hostname: request.app_hostname.trim_end_matches('/').to_string(),
            author: project.author.clone(),
            name: project.name.clone(),
            thumbnail: project.thumbnail.clone(),
            make_id: project.make_id.clone(),
            project_id,
            id_base36,
            description,
            scene,
            attribution_url,
        })
    }

    pub fn id_base36(&self) -> &str {
        &self.id_base36
    }

    pub fn embed_url(&self) -> &Url {
        &self.embed_url
    }

    pub fn shell_url(&self) -> &Url {
        &self.shell_url
    }

    pub fn key(&self, kind: ArtifactKind) -> String {
        match kind {
            ArtifactKind::Embed => self.embed_key.clone(),
            ArtifactKind::EmbedShell => self.shell_key.clone(),
            ArtifactKind::EmbedEdit => format!("{}/edit", self.embed_key),
            ArtifactKind::EmbedRemix => format!("{}/remix", self.embed_key),
            ArtifactKind::ShellEdit => format!("{}/edit", self.shell_key),
            ArtifactKind::ShellRemix => format!("{}/remix", self.shell_key),
        }
    }

    /// All six keys in issue order.
    pub fn keys(&self) -> Vec<String> {
        ArtifactKind::ALL.iter().map(|kind| self.key(*kind)).collect()
    }

    /// Where the edit/remix stubs send visitors.
    pub fn redirect_target(&self, action: &str) -> String {
        format!("{}{}/{action}", self.app_hostname, self.project_url)
    }

    pub fn render(&self, kind: ArtifactKind) -> Result<ArtifactSpec, RenderError> {
        let html = match kind.redirect_action() {
            Some(action) => {
                let target = self.redirect_target(action);
                render_template(&RedirectTemplate { target: &target })
            }
            None if kind == ArtifactKind::Embed => self.render_embed(),
            None => self.render_shell(),
        }
        .map_err(|source| RenderError::Template { kind, source })?;

        Ok(ArtifactSpec {
            kind,
            key: self.key(kind),
            content_type: HTML_CONTENT_TYPE,
            payload: Bytes::from(compress_html_entities(&html)),
            description: kind.description(),
        })
    }

    fn render_embed(&self) -> Result<String, TemplateRenderError> {
        let popcorn = popcorn::serialize(&self.scene);
        let shell_url = self.shell_url.as_str();
        render_template(&EmbedTemplate {
            id: self.project_id.get(),
            author: &self.author,
            title: &self.name,
            description: &self.description,
            media_src: &self.attribution_url,
            embed_shell_src: shell_url,
            project_url: &self.project_url,
            app_hostname: &self.app_hostname,
            popcorn: &popcorn,
            thumbnail: self.thumbnail.as_deref(),
        })
    }

    fn render_shell(&self) -> Result<String, TemplateRenderError> {
        render_template(&EmbedShellTemplate {
            author: &self.author,
            project_name: &self.name,
            description: &self.description,
            embed_shell_src: self.shell_url.as_str(),
            embed_src: self.embed_url.as_str(),
            project_url: &self.project_url,
            app_hostname: &self.app_hostname,
            thumbnail: self.thumbnail.as_deref(),
            make_id: self.make_id.as_deref(),
        })
    }
}
