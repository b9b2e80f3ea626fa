//! Per-object permission rule shared by the pages and the API.
//!
//! Any authenticated user may read. Mutation and deletion are reserved to the
//! row's owner and to administrators.

use uuid::Uuid;

use crate::{
    auth::repo_types::User,
    error::AppError,
    recipe::repo_types::{Ingredient, Recipe, Tag},
};

pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Tag {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Ingredient {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

impl Owned for Recipe {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

pub fn can_modify(user: &User, target: &impl Owned) -> bool {
    user.is_admin() || user.id == target.owner_id()
}

pub fn ensure_can_modify(user: &User, target: &impl Owned) -> Result<(), AppError> {
    if can_modify(user, target) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, owner_id = %target.owner_id(), "modification denied");
        Err(AppError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn user(is_staff: bool, is_superuser: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "test@domain.com".into(),
            password_hash: String::new(),
            is_active: true,
            is_staff,
            is_superuser,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn tag_of(owner: &User) -> Tag {
        Tag {
            id: 1,
            user_id: owner.id,
            name: "First Tag".into(),
            created_on: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn owner_may_modify() {
        let owner = user(false, false);
        assert!(ensure_can_modify(&owner, &tag_of(&owner)).is_ok());
    }

    #[test]
    fn other_user_is_forbidden() {
        let owner = user(false, false);
        let other = user(false, false);
        let err = ensure_can_modify(&other, &tag_of(&owner)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn superuser_bypasses_ownership() {
        let owner = user(false, false);
        assert!(can_modify(&user(true, true), &tag_of(&owner)));
    }

    #[test]
    fn staff_alone_is_not_admin() {
        let owner = user(false, false);
        assert!(!can_modify(&user(true, false), &tag_of(&owner)));
    }
}
