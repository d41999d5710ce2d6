//! User identity use-cases.

use crate::model::record::{User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoResult;
use log::info;

/// Passwordless identity: a user is identified by email alone.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the user for `email`, creating it on first login.
    ///
    /// An existing user keeps its stored first name.
    pub fn login(&self, email: &str, first_name: Option<&str>) -> RepoResult<User> {
        let user = self.repo.get_or_create_user(email, first_name)?;
        info!(
            "event=user_login module=service status=ok user_id={}",
            user.id
        );
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.repo.find_user_by_email(email)
    }
}

#[cfg(test)]
mod tests {
    use super::UserService;
    use crate::db::open_db_in_memory;
    use crate::repo::user_repo::SqliteUserRepository;
    use crate::repo::RepoError;

    #[test]
    fn login_is_idempotent_per_email() {
        let conn = open_db_in_memory().unwrap();
        let service = UserService::new(SqliteUserRepository::new(&conn));

        let first = service.login("Parent@Example.com", Some("Sam")).unwrap();
        let second = service.login(" parent@example.com ", Some("Other")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "parent@example.com");
        assert_eq!(second.first_name.as_deref(), Some("Sam"));
        assert_eq!(service.get_user(first.id).unwrap(), Some(first));
    }

    #[test]
    fn login_rejects_malformed_email() {
        let conn = open_db_in_memory().unwrap();
        let service = UserService::new(SqliteUserRepository::new(&conn));
        assert!(matches!(
            service.login("nobody", None),
            Err(RepoError::Validation(_))
        ));
    }
}
