//! Tests for the order state machine and authorization rules

use shared::{
    authorize, validate_submission, Actor, Capability, Location, OrderStatus, Person,
};
use uuid::Uuid;

fn actor(is_manager: bool, is_admin: bool) -> Actor {
    Actor {
        user_id: Uuid::new_v4(),
        is_manager,
        is_admin,
    }
}

mod transitions {
    use super::*;

    #[test]
    fn happy_path_moves_forward() {
        assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Submitted));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Finished));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Rejected));
    }

    #[test]
    fn draft_and_submitted_are_deletable() {
        assert!(OrderStatus::Draft.can_transition_to(OrderStatus::Deleted));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Deleted));
    }

    #[test]
    fn terminal_states_never_move() {
        let terminals = [
            OrderStatus::Finished,
            OrderStatus::Rejected,
            OrderStatus::Deleted,
        ];
        let all = [
            OrderStatus::Draft,
            OrderStatus::Submitted,
            OrderStatus::Finished,
            OrderStatus::Rejected,
            OrderStatus::Deleted,
        ];
        for from in terminals {
            assert!(from.is_terminal());
            for to in all {
                assert!(!from.can_transition_to(to), "{from} must not move to {to}");
            }
        }
    }

    #[test]
    fn no_skipping_moderation() {
        assert!(!OrderStatus::Draft.can_transition_to(OrderStatus::Finished));
        assert!(!OrderStatus::Draft.can_transition_to(OrderStatus::Rejected));
    }

    #[test]
    fn no_moving_backwards() {
        assert!(!OrderStatus::Submitted.can_transition_to(OrderStatus::Draft));
        assert!(!OrderStatus::Finished.can_transition_to(OrderStatus::Submitted));
    }

    #[test]
    fn rejected_transition_names_both_states() {
        let err = OrderStatus::Finished
            .transition_to(OrderStatus::Submitted)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("finished"));
        assert!(message.contains("submitted"));
    }

    #[test]
    fn item_edits_only_before_moderation_completes() {
        assert!(OrderStatus::Draft.allows_item_edits());
        assert!(OrderStatus::Submitted.allows_item_edits());
        assert!(!OrderStatus::Finished.allows_item_edits());
        assert!(!OrderStatus::Rejected.allows_item_edits());
        assert!(!OrderStatus::Deleted.allows_item_edits());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Submitted,
            OrderStatus::Finished,
            OrderStatus::Rejected,
            OrderStatus::Deleted,
        ] {
            assert_eq!(OrderStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_str("archived"), None);
    }
}

mod submission {
    use super::*;

    #[test]
    fn complete_order_submits() {
        assert!(
            validate_submission(2, Some(Location::Valley), Some(Person::Agronomist)).is_ok()
        );
    }

    #[test]
    fn empty_cart_blocks_submission() {
        assert!(validate_submission(0, Some(Location::Valley), Some(Person::Agronomist)).is_err());
    }

    #[test]
    fn missing_location_blocks_submission() {
        assert!(validate_submission(2, None, Some(Person::Agronomist)).is_err());
    }

    #[test]
    fn missing_person_blocks_submission() {
        assert!(validate_submission(2, Some(Location::Valley), None).is_err());
    }
}

mod authorization {
    use super::*;

    #[test]
    fn plain_users_cannot_moderate() {
        let user = actor(false, false);
        assert!(!authorize(&user, Capability::ModerateOrders));
        assert!(!authorize(&user, Capability::ManageCatalog));
        assert!(!authorize(&user, Capability::ManageUsers));
    }

    #[test]
    fn either_privilege_flag_permits_moderation() {
        assert!(authorize(&actor(true, false), Capability::ModerateOrders));
        assert!(authorize(&actor(false, true), Capability::ModerateOrders));
        assert!(authorize(&actor(true, false), Capability::ManageCatalog));
    }

    #[test]
    fn user_management_is_admin_only() {
        assert!(!authorize(&actor(true, false), Capability::ManageUsers));
        assert!(authorize(&actor(false, true), Capability::ManageUsers));
    }

    #[test]
    fn owners_and_moderators_access_orders() {
        let owner = actor(false, false);
        let other = actor(false, false);
        let moderator = actor(true, false);

        assert!(owner.can_access_order(owner.user_id));
        assert!(!other.can_access_order(owner.user_id));
        assert!(moderator.can_access_order(owner.user_id));
    }
}
