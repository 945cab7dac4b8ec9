pub mod comments;
pub mod policy;
pub mod projects;
pub mod storage;
pub mod token;
pub mod users;
