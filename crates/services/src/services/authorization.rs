//! Role-scoped permission checks for task and user operations.
//!
//! Everything here is a pure function of the caller's role, the requested
//! action and the caller's relationship to the target task. Callers must run
//! the check before touching the store so that a denial never leaves partial
//! state behind.

use db::models::role::{Permission, Role};
use strum_macros::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskAction {
    Create,
    List,
    View,
    /// Title, description, priority, dates and status.
    UpdateCore,
    /// Dependencies, worker set and objectives text.
    UpdatePlan,
    /// The worker-facing status change.
    UpdateStatus,
    Delete,
    Comment,
}

/// How the principal relates to the task being acted on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Membership {
    /// Principal is the task's `assigned_to`.
    pub is_owner: bool,
    /// Principal is one of the task's `assigned_users`.
    pub is_worker: bool,
}

impl Membership {
    pub fn is_member(&self) -> bool {
        self.is_owner || self.is_worker
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct AccessDenied(pub &'static str);

pub fn authorize_task(
    role: Role,
    action: TaskAction,
    membership: Membership,
) -> Result<(), AccessDenied> {
    use Role::{Admin, Manager, User};
    use TaskAction::*;

    match (action, role) {
        (Create, role) if role.has_permission(Permission::AssignTasks) => Ok(()),
        (Create, _) => Err(AccessDenied("Users cannot create or assign tasks")),

        (List, _) => Ok(()),

        (View, User) if !membership.is_member() => {
            Err(AccessDenied("This task is not assigned to you"))
        }
        (View, _) => Ok(()),

        (UpdateCore, User) => Err(AccessDenied("Users cannot edit tasks")),
        (UpdateCore | UpdatePlan, Manager) if !membership.is_owner => Err(AccessDenied(
            "Only the manager assigned to this task can change it",
        )),
        (UpdateCore, Manager | Admin) => Ok(()),

        (UpdatePlan, User) => Err(AccessDenied("Users cannot change task plans")),
        (UpdatePlan, Manager) => Ok(()),
        (UpdatePlan, Admin) => Err(AccessDenied(
            "Dependencies and workers are managed by the task's manager",
        )),

        (UpdateStatus, User) if membership.is_member() => Ok(()),
        (UpdateStatus, _) => Err(AccessDenied(
            "Only users assigned to this task can update its status",
        )),

        (Delete, Admin) => Ok(()),
        (Delete, _) => Err(AccessDenied("Only admins can delete tasks")),

        (Comment, User | Manager) if membership.is_member() => Ok(()),
        (Comment, Admin) => Err(AccessDenied("Admins cannot comment on tasks")),
        (Comment, _) => Err(AccessDenied("This task is not assigned to you")),
    }
}

/// Creating, listing, promoting and deleting accounts.
pub fn authorize_user_admin(role: Role) -> Result<(), AccessDenied> {
    if role.has_permission(Permission::ManageUsers) {
        Ok(())
    } else {
        Err(AccessDenied("Only admins can manage users"))
    }
}

/// The role a task owner must have when the task is assigned by `assigner`.
pub fn required_owner_role(assigner: Role) -> Option<Role> {
    match assigner {
        Role::Admin => Some(Role::Manager),
        Role::Manager => Some(Role::User),
        Role::User => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTSIDER: Membership = Membership {
        is_owner: false,
        is_worker: false,
    };
    const OWNER: Membership = Membership {
        is_owner: true,
        is_worker: false,
    };
    const WORKER: Membership = Membership {
        is_owner: false,
        is_worker: true,
    };

    fn allowed(role: Role, action: TaskAction, membership: Membership) -> bool {
        authorize_task(role, action, membership).is_ok()
    }

    #[test]
    fn only_admins_and_managers_create() {
        assert!(!allowed(Role::User, TaskAction::Create, OUTSIDER));
        assert!(allowed(Role::Manager, TaskAction::Create, OUTSIDER));
        assert!(allowed(Role::Admin, TaskAction::Create, OUTSIDER));
    }

    #[test]
    fn users_only_see_their_own_tasks() {
        assert!(!allowed(Role::User, TaskAction::View, OUTSIDER));
        assert!(allowed(Role::User, TaskAction::View, WORKER));
        assert!(allowed(Role::User, TaskAction::View, OWNER));
        assert!(allowed(Role::Manager, TaskAction::View, OUTSIDER));
        assert!(allowed(Role::Admin, TaskAction::View, OUTSIDER));
    }

    #[test]
    fn core_updates_need_ownership_for_managers() {
        assert!(!allowed(Role::User, TaskAction::UpdateCore, OWNER));
        assert!(!allowed(Role::Manager, TaskAction::UpdateCore, OUTSIDER));
        assert!(!allowed(Role::Manager, TaskAction::UpdateCore, WORKER));
        assert!(allowed(Role::Manager, TaskAction::UpdateCore, OWNER));
        assert!(allowed(Role::Admin, TaskAction::UpdateCore, OUTSIDER));
    }

    #[test]
    fn plans_belong_to_the_owning_manager() {
        assert!(allowed(Role::Manager, TaskAction::UpdatePlan, OWNER));
        assert!(!allowed(Role::Manager, TaskAction::UpdatePlan, OUTSIDER));
        assert!(!allowed(Role::User, TaskAction::UpdatePlan, OWNER));
        assert!(!allowed(Role::Admin, TaskAction::UpdatePlan, OWNER));
    }

    #[test]
    fn status_path_is_for_assigned_users() {
        assert!(allowed(Role::User, TaskAction::UpdateStatus, WORKER));
        assert!(allowed(Role::User, TaskAction::UpdateStatus, OWNER));
        assert!(!allowed(Role::User, TaskAction::UpdateStatus, OUTSIDER));
        assert!(!allowed(Role::Manager, TaskAction::UpdateStatus, OWNER));
        assert!(!allowed(Role::Admin, TaskAction::UpdateStatus, OWNER));
    }

    #[test]
    fn delete_is_admin_only() {
        assert!(allowed(Role::Admin, TaskAction::Delete, OUTSIDER));
        assert!(!allowed(Role::Manager, TaskAction::Delete, OWNER));
        assert!(!allowed(Role::User, TaskAction::Delete, OWNER));
    }

    #[test]
    fn comments_require_membership() {
        assert!(allowed(Role::User, TaskAction::Comment, WORKER));
        assert!(!allowed(Role::User, TaskAction::Comment, OUTSIDER));
        assert!(allowed(Role::Manager, TaskAction::Comment, OWNER));
        assert!(!allowed(Role::Manager, TaskAction::Comment, OUTSIDER));
        assert!(!allowed(Role::Admin, TaskAction::Comment, OWNER));
    }

    #[test]
    fn listing_is_open_to_everyone() {
        for role in [Role::User, Role::Manager, Role::Admin] {
            assert!(allowed(role, TaskAction::List, OUTSIDER));
        }
    }

    #[test]
    fn owner_role_follows_the_assigner() {
        assert_eq!(required_owner_role(Role::Admin), Some(Role::Manager));
        assert_eq!(required_owner_role(Role::Manager), Some(Role::User));
        assert_eq!(required_owner_role(Role::User), None);
        assert!(authorize_user_admin(Role::Admin).is_ok());
        assert!(authorize_user_admin(Role::Manager).is_err());
    }
}
