use axum::response::IntoResponse;
use crawl_admin_domain::JobTemplate;
use serde::Serialize;

use crate::response::success;

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub code: char,
    pub name: &'static str,
    pub description: &'static str,
    pub requires_seeds: bool,
}

impl From<JobTemplate> for TemplateInfo {
    fn from(template: JobTemplate) -> Self {
        Self {
            code: template.code(),
            name: template.name(),
            description: template.description(),
            requires_seeds: template.requires_seeds(),
        }
    }
}

/// 内置的任务模板
pub async fn list_templates() -> impl IntoResponse {
    let templates: Vec<TemplateInfo> = JobTemplate::all().into_iter().map(Into::into).collect();
    success(templates)
}
