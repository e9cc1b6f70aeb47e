use serde::{Deserialize, Serialize};

/// 任务模板来源，未配置目录时使用内置模板
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    pub directory: Option<String>,
}

impl TemplateConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(dir) = &self.directory {
            if dir.trim().is_empty() {
                return Err(anyhow::anyhow!("模板目录不能为空字符串"));
            }
        }
        Ok(())
    }
}
