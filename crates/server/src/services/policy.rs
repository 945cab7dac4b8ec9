// Authorization rules for project operations

use crate::{
    db::models::{Project, ProjectStatus},
    error::{AppError, Result},
    middleware::auth::AuthUser,
};

pub fn authorize_create(user: &AuthUser) -> Result<()> {
    if user.is_admin() {
        return Err(AppError::Forbidden(
            "Admins cannot submit projects".to_string(),
        ));
    }
    Ok(())
}

pub fn authorize_list_mine(user: &AuthUser) -> Result<()> {
    if user.is_admin() {
        return Err(AppError::Forbidden(
            "Admins have no personal projects".to_string(),
        ));
    }
    Ok(())
}

pub fn authorize_edit(user: &AuthUser, project: &Project) -> Result<()> {
    if user.is_admin() {
        return Err(AppError::Forbidden(
            "Admins cannot edit project content".to_string(),
        ));
    }
    if project.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the owner can edit this project".to_string(),
        ));
    }
    if project.status != ProjectStatus::Pending {
        return Err(AppError::InvalidState(
            "Only PENDING projects can be edited".to_string(),
        ));
    }
    Ok(())
}

pub fn authorize_status_change(user: &AuthUser) -> Result<()> {
    if !user.is_admin() {
        return Err(AppError::Forbidden(
            "Only admins can change project status".to_string(),
        ));
    }
    Ok(())
}

pub fn authorize_delete(user: &AuthUser, project: &Project) -> Result<()> {
    if user.is_admin() || project.user_id == user.id {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "Only the owner or an admin can delete this project".to_string(),
    ))
}
