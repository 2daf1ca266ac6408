use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;

use crate::models::resume::Resume;

const RULE_WIDTH: usize = 51;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("S3 upload failed: {0}")]
    S3(String),
}

/// A rendered document ready to be downloaded or uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub body: Bytes,
}

impl ExportArtifact {
    pub fn json(file_name: String, resume: &Resume) -> Result<Self, ExportError> {
        let body = serde_json::to_vec_pretty(resume)?;
        Ok(Self {
            file_name,
            content_type: "application/json",
            body: Bytes::from(body),
        })
    }
}

pub fn export_json(resume: &Resume) -> Result<ExportArtifact, ExportError> {
    ExportArtifact::json("resume-data.json".to_string(), resume)
}

pub fn export_text(resume: &Resume) -> ExportArtifact {
    ExportArtifact {
        file_name: "resume.txt".to_string(),
        content_type: "text/plain; charset=utf-8",
        body: Bytes::from(render_resume_to_text(resume)),
    }
}

/// `"Senior  Backend v2"` → `"senior-backend-v2.json"`.
pub fn version_file_name(name: &str) -> String {
    let slug = name.split_whitespace().collect::<Vec<_>>().join("-");
    format!("{}.json", slug.to_lowercase())
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

fn heading(out: &mut String, title: &str) {
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(RULE_WIDTH - 1));
    out.push('\n');
}

/// Plain-text rendering used by the "export as text" download.
pub fn render_resume_to_text(resume: &Resume) -> String {
    let info = &resume.personal_info;
    let mut out = String::from("RESUME\n");
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push_str("\n\n");

    heading(&mut out, "PERSONAL INFORMATION");
    out.push_str(&format!("Name: {}\n", or_na(&info.full_name)));
    out.push_str(&format!("Email: {}\n", or_na(&info.email)));
    out.push_str(&format!("Phone: {}\n", or_na(&info.phone)));
    out.push_str(&format!("Location: {}\n\n", or_na(&info.location)));

    if !info.summary.is_empty() {
        heading(&mut out, "PROFESSIONAL SUMMARY");
        out.push_str(&info.summary);
        out.push_str("\n\n");
    }

    if !resume.skills.is_empty() {
        heading(&mut out, "SKILLS");
        out.push_str(&resume.skills.join(", "));
        out.push_str("\n\n");
    }

    if !resume.experience.is_empty() {
        heading(&mut out, "WORK EXPERIENCE");
        for (index, exp) in resume.experience.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} at {}\n",
                index + 1,
                or_na(&exp.role),
                or_na(&exp.company)
            ));
            if !exp.description.is_empty() {
                out.push_str(&format!("   {}\n", exp.description.replace('\n', "\n   ")));
            }
            out.push('\n');
        }
    }

    if !resume.education.is_empty() {
        heading(&mut out, "EDUCATION");
        for edu in &resume.education {
            out.push_str(&format!("{} - {}", or_na(&edu.degree), or_na(&edu.institute)));
            if !edu.year.is_empty() {
                out.push_str(&format!(" ({})", edu.year));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    if !resume.projects.is_empty() {
        heading(&mut out, "PROJECTS");
        for project in &resume.projects {
            out.push_str(or_na(&project.title));
            out.push('\n');
            if !project.description.is_empty() {
                out.push_str(&project.description);
                out.push('\n');
            }
            out.push('\n');
        }
    }

    out
}

/// Somewhere exported artifacts can be published to. Returns the storage key.
#[async_trait]
pub trait ExportSink: Send + Sync {
    async fn publish(&self, artifact: &ExportArtifact) -> Result<String, ExportError>;
}

pub struct S3ExportSink {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ExportSink {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl ExportSink for S3ExportSink {
    async fn publish(&self, artifact: &ExportArtifact) -> Result<String, ExportError> {
        let key = format!("exports/{}", artifact.file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(artifact.body.clone()))
            .content_type(artifact.content_type)
            .send()
            .await
            .map_err(|e| ExportError::S3(e.to_string()))?;

        info!("Uploaded export to s3://{}/{}", self.bucket, key);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{EducationEntry, ExperienceEntry};

    #[test]
    fn test_version_file_name() {
        assert_eq!(version_file_name("Version 1"), "version-1.json");
        assert_eq!(
            version_file_name("  Senior   Backend\tRole "),
            "senior-backend-role.json"
        );
    }

    #[test]
    fn test_text_export_of_empty_resume() {
        let text = render_resume_to_text(&Resume::default());
        assert!(text.starts_with("RESUME\n===="));
        assert!(text.contains("Name: N/A\n"));
        assert!(!text.contains("SKILLS"));
        assert!(!text.contains("WORK EXPERIENCE"));
    }

    #[test]
    fn test_text_export_sections() {
        let mut resume = Resume::default();
        resume.personal_info.full_name = "Ada Lovelace".to_string();
        resume.personal_info.summary = "Analyst.".to_string();
        resume.skills = vec!["Math".to_string(), "Engines".to_string()];
        resume.experience.push(ExperienceEntry {
            role: "Analyst".to_string(),
            company: "Babbage & Co".to_string(),
            description: "Wrote notes\nFound bugs".to_string(),
            ..ExperienceEntry::default()
        });
        resume.education.push(EducationEntry {
            degree: "Private tutoring".to_string(),
            year: "1833".to_string(),
            ..EducationEntry::default()
        });

        let text = render_resume_to_text(&resume);
        assert!(text.contains("Name: Ada Lovelace\n"));
        assert!(text.contains("PROFESSIONAL SUMMARY\n"));
        assert!(text.contains("Math, Engines\n"));
        assert!(text.contains("1. Analyst at Babbage & Co\n   Wrote notes\n   Found bugs\n"));
        assert!(text.contains("Private tutoring - N/A (1833)\n"));
    }

    #[test]
    fn test_json_export_is_pretty() {
        let artifact = export_json(&Resume::default()).unwrap();
        assert_eq!(artifact.file_name, "resume-data.json");
        assert_eq!(artifact.content_type, "application/json");
        let body = std::str::from_utf8(&artifact.body).unwrap();
        assert!(body.contains("\n  \"personalInfo\""));
    }
}
