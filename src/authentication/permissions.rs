use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSubscriptions,
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageAllRecipes,
            ActionType::ManageTags,
            ActionType::ManageIngredients,
            ActionType::ManageUsers,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnFavorites,
    ManageOwnCart,
    ManageOwnSubscriptions,
    ManageOwnRecipes,

    ManageUsers,
    ManageAllRecipes,
    ManageTags,
    ManageIngredients,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let user_role = &session.user_role;

        ACTION_TABLE
            .iter()
            .find_map(|(role, actions)| {
                if user_role != role {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionData {
        SessionData {
            user_id: 1,
            username: String::from("cook"),
            is_admin: role == UserRole::Admin,
            user_role: role,
        }
    }

    #[test]
    fn plain_users_cannot_manage_tags() {
        assert!(!ActionType::ManageTags.authenticate(&session(UserRole::User)));
        assert!(ActionType::ManageTags.authenticate(&session(UserRole::Admin)));
    }

    #[test]
    fn every_role_manages_its_own_relations() {
        for role in [UserRole::User, UserRole::Admin] {
            assert!(ActionType::ManageOwnFavorites.authenticate(&session(role.clone())));
            assert!(ActionType::ManageOwnCart.authenticate(&session(role.clone())));
            assert!(ActionType::ManageOwnSubscriptions.authenticate(&session(role)));
        }
    }

    #[test]
    fn only_admins_manage_foreign_recipes() {
        assert!(!ActionType::ManageAllRecipes.authenticate(&session(UserRole::User)));
        assert!(ActionType::ManageAllRecipes.authenticate(&session(UserRole::Admin)));
    }
}
