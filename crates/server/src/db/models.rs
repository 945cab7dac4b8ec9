use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum KaryaType {
    Image,
    Pdf,
    Youtube,
}

impl KaryaType {
    pub fn is_stored_file(self) -> bool {
        matches!(self, KaryaType::Image | KaryaType::Pdf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    Pending,
    Approved,
    Rejected,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Pending => "PENDING",
            ProjectStatus::Approved => "APPROVED",
            ProjectStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ProjectStatus::Pending),
            "APPROVED" => Ok(ProjectStatus::Approved),
            "REJECTED" => Ok(ProjectStatus::Rejected),
            other => Err(format!("Invalid status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub major: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,
    pub nama_ketua: String,
    pub nim_ketua: String,
    pub prodi: String,
    pub karya_type: KaryaType,
    pub karya_url: String,
    pub status: ProjectStatus,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Project {
    pub fn stored_file(&self) -> Option<&str> {
        (self.karya_type.is_stored_file() && !self.karya_url.is_empty())
            .then_some(self.karya_url.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectWithAuthor {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub project: Project,
    pub author_name: String,
    pub author_major: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub project_id: String,
    pub user_name: String,
    pub comment: String,
    pub rating: i64,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_known_values() {
        assert_eq!("APPROVED".parse::<ProjectStatus>(), Ok(ProjectStatus::Approved));
        assert_eq!("PENDING".parse::<ProjectStatus>(), Ok(ProjectStatus::Pending));
        assert!("approved".parse::<ProjectStatus>().is_err());
        assert!("DELETED".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn youtube_projects_have_no_stored_file() {
        let mut project = Project {
            id: "p".into(),
            title: "t".into(),
            description: String::new(),
            nama_ketua: String::new(),
            nim_ketua: String::new(),
            prodi: String::new(),
            karya_type: KaryaType::Youtube,
            karya_url: "https://youtu.be/x".into(),
            status: ProjectStatus::Pending,
            user_id: "u".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert_eq!(project.stored_file(), None);

        project.karya_type = KaryaType::Pdf;
        project.karya_url = "uploads/a.pdf".into();
        assert_eq!(project.stored_file(), Some("uploads/a.pdf"));
    }

    #[test]
    fn user_serialization_skips_password_hash() {
        let user = User {
            id: "1".into(),
            name: "A".into(),
            email: "a@example.com".into(),
            password_hash: "secret-hash".into(),
            role: Role::User,
            major: None,
            created_at: String::new(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"user\""));
    }
}
