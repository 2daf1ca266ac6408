use serde::{Deserialize, Serialize};

use crate::models::resume::Resume;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionLevel {
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub level: SuggestionLevel,
    pub section: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeStats {
    pub word_count: usize,
    pub skills_count: usize,
    pub experience_count: usize,
    pub education_count: usize,
    pub projects_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// 0 – 100
    pub progress: u32,
    pub stats: ResumeStats,
    pub suggestions: Vec<Suggestion>,
}

const PERSONAL_FIELDS: &[&str] = &["fullName", "email", "phone", "location", "summary"];
const MIN_SKILLS_FOR_PROGRESS: usize = 3;
const MIN_SKILLS_SUGGESTED: usize = 5;
const MIN_SUMMARY_CHARS: usize = 50;

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Share of the core checklist that is filled in: the five contact/summary
/// fields, at least three skills, and a complete first experience,
/// education and project entry.
pub fn compute_progress(resume: &Resume) -> u32 {
    let info = &resume.personal_info;
    let mut checks: Vec<bool> = PERSONAL_FIELDS
        .iter()
        .map(|field| {
            info.get(field)
                .and_then(|v| v.as_str().map(filled))
                .unwrap_or(false)
        })
        .collect();

    checks.push(resume.skills.len() >= MIN_SKILLS_FOR_PROGRESS);
    checks.push(
        resume
            .experience
            .first()
            .is_some_and(|e| filled(&e.company) && filled(&e.role) && filled(&e.description)),
    );
    checks.push(
        resume
            .education
            .first()
            .is_some_and(|e| filled(&e.degree) && filled(&e.institute) && filled(&e.year)),
    );
    checks.push(
        resume
            .projects
            .first()
            .is_some_and(|p| filled(&p.title) && filled(&p.description)),
    );

    let done = checks.iter().filter(|c| **c).count();
    ((done as f64 / checks.len() as f64) * 100.0).round() as u32
}

pub fn compute_stats(resume: &Resume) -> ResumeStats {
    let word_count = std::iter::once(resume.personal_info.summary.as_str())
        .chain(resume.experience.iter().map(|e| e.description.as_str()))
        .chain(resume.projects.iter().map(|p| p.description.as_str()))
        .map(|text| text.split_whitespace().count())
        .sum();

    ResumeStats {
        word_count,
        skills_count: resume.skills.len(),
        experience_count: resume.experience.len(),
        education_count: resume.education.len(),
        projects_count: resume.projects.len(),
    }
}

pub fn compute_suggestions(resume: &Resume) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if resume.personal_info.summary.chars().count() < MIN_SUMMARY_CHARS {
        suggestions.push(Suggestion {
            level: SuggestionLevel::Warning,
            section: "summary".to_string(),
            message: format!(
                "Add a professional summary (at least {MIN_SUMMARY_CHARS} characters)"
            ),
        });
    }
    if resume.skills.len() < MIN_SKILLS_SUGGESTED {
        suggestions.push(Suggestion {
            level: SuggestionLevel::Info,
            section: "skills".to_string(),
            message: format!("Add at least {MIN_SKILLS_SUGGESTED} skills for better ATS optimization"),
        });
    }
    if resume.experience.is_empty() {
        suggestions.push(Suggestion {
            level: SuggestionLevel::Warning,
            section: "experience".to_string(),
            message: "Add your work experience".to_string(),
        });
    }
    if resume.education.is_empty() {
        suggestions.push(Suggestion {
            level: SuggestionLevel::Warning,
            section: "education".to_string(),
            message: "Add your education details".to_string(),
        });
    }

    let incomplete = resume
        .experience
        .iter()
        .filter(|e| !filled(&e.company) || !filled(&e.role) || !filled(&e.description))
        .count();
    if incomplete > 0 {
        let noun = if incomplete > 1 { "entries" } else { "entry" };
        suggestions.push(Suggestion {
            level: SuggestionLevel::Warning,
            section: "experience".to_string(),
            message: format!("Complete {incomplete} incomplete experience {noun}"),
        });
    }

    suggestions
}

pub fn compute_completeness_report(resume: &Resume) -> CompletenessReport {
    CompletenessReport {
        progress: compute_progress(resume),
        stats: compute_stats(resume),
        suggestions: compute_suggestions(resume),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{EducationEntry, ExperienceEntry, ProjectEntry};

    fn complete_resume() -> Resume {
        let mut resume = Resume::default();
        resume.personal_info.full_name = "Ada Lovelace".to_string();
        resume.personal_info.email = "ada@example.com".to_string();
        resume.personal_info.phone = "555-0100".to_string();
        resume.personal_info.location = "London".to_string();
        resume.personal_info.summary =
            "Mathematician who wrote the first published algorithm for a machine.".to_string();
        resume.skills = ["Math", "Poetry", "Engines", "Notes", "Logic"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        resume.experience.push(ExperienceEntry {
            company: "Analytical Engine".to_string(),
            role: "Programmer".to_string(),
            description: "Wrote Note G".to_string(),
            ..ExperienceEntry::default()
        });
        resume.education.push(EducationEntry {
            degree: "Tutoring".to_string(),
            institute: "Home".to_string(),
            year: "1833".to_string(),
            ..EducationEntry::default()
        });
        resume.projects.push(ProjectEntry {
            title: "Bernoulli numbers".to_string(),
            description: "Algorithm".to_string(),
            ..ProjectEntry::default()
        });
        resume
    }

    #[test]
    fn test_empty_resume_has_no_progress() {
        let report = compute_completeness_report(&Resume::default());
        assert_eq!(report.progress, 0);
        assert_eq!(report.stats.word_count, 0);
        assert_eq!(report.suggestions.len(), 4);
    }

    #[test]
    fn test_complete_resume() {
        let report = compute_completeness_report(&complete_resume());
        assert_eq!(report.progress, 100);
        assert!(report.suggestions.is_empty());
        assert_eq!(report.stats.word_count, 10 + 3 + 1);
    }

    #[test]
    fn test_partial_progress_rounds() {
        let mut resume = Resume::default();
        resume.personal_info.full_name = "Ada".to_string();
        resume.personal_info.email = "   ".to_string();
        // 1 of 9 checks
        assert_eq!(compute_progress(&resume), 11);
    }

    #[test]
    fn test_incomplete_experience_is_counted() {
        let mut resume = complete_resume();
        resume.experience.push(ExperienceEntry::default());
        resume.experience.push(ExperienceEntry::default());

        let suggestions = compute_suggestions(&resume);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(
            suggestions[0].message,
            "Complete 2 incomplete experience entries"
        );
    }
}
