//! # Authorization Policies
//!
//! A static rule table decides whether an [`Actor`] may perform an action on a
//! resource collection, and then on a specific instance.
//!
//! Anonymous actors that fail a rule are asked to authenticate (401); known
//! actors that fail a rule are refused (403).

use thiserror::Error;

use crate::auth::{Actor, Principal};
use crate::error::{ApiError, forbidden, unauthorized};
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Employee,
    Restaurant,
    Menu,
    Vote,
    Winner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Anyone,
    Authenticated,
    AdminOnly,
    RoleOrAdmin(Role),
    /// The actor owns the instance, or is an admin.
    OwnerOrAdmin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("You do not have permission to perform this action.")]
    PermissionDenied,
}

impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => unauthorized(Some(&denial.to_string())),
            Denial::PermissionDenied => forbidden(Some(&denial.to_string())),
        }
    }
}

struct Rule {
    resource: Resource,
    action: Action,
    collection: Requirement,
    instance: Requirement,
}

const fn rule(
    resource: Resource,
    action: Action,
    collection: Requirement,
    instance: Requirement,
) -> Rule {
    Rule {
        resource,
        action,
        collection,
        instance,
    }
}

use Action::*;
use Requirement::*;

const EMPLOYEE_ROLE: Requirement = RoleOrAdmin(Role::Employee);
const OWNER_ROLE: Requirement = RoleOrAdmin(Role::RestaurantOwner);

static RULES: &[Rule] = &[
    rule(Resource::Employee, Create, Anyone, Anyone),
    rule(Resource::Employee, List, AdminOnly, AdminOnly),
    rule(Resource::Employee, Retrieve, EMPLOYEE_ROLE, OwnerOrAdmin),
    rule(Resource::Employee, Update, EMPLOYEE_ROLE, OwnerOrAdmin),
    rule(Resource::Employee, Delete, AdminOnly, AdminOnly),
    rule(Resource::Restaurant, Create, Anyone, Anyone),
    rule(Resource::Restaurant, List, Authenticated, Authenticated),
    rule(Resource::Restaurant, Retrieve, Authenticated, Authenticated),
    rule(Resource::Restaurant, Update, OWNER_ROLE, OwnerOrAdmin),
    rule(Resource::Restaurant, Delete, OWNER_ROLE, OwnerOrAdmin),
    rule(Resource::Menu, Create, OWNER_ROLE, OwnerOrAdmin),
    rule(Resource::Menu, List, EMPLOYEE_ROLE, EMPLOYEE_ROLE),
    rule(Resource::Menu, Retrieve, Authenticated, Authenticated),
    rule(Resource::Menu, Update, AdminOnly, AdminOnly),
    rule(Resource::Menu, Delete, AdminOnly, AdminOnly),
    rule(Resource::Vote, Create, EMPLOYEE_ROLE, EMPLOYEE_ROLE),
    rule(Resource::Vote, List, EMPLOYEE_ROLE, EMPLOYEE_ROLE),
    rule(Resource::Vote, Retrieve, EMPLOYEE_ROLE, OwnerOrAdmin),
    rule(Resource::Winner, List, EMPLOYEE_ROLE, EMPLOYEE_ROLE),
];

fn lookup(resource: Resource, action: Action) -> Option<&'static Rule> {
    RULES
        .iter()
        .find(|rule| rule.resource == resource && rule.action == action)
}

fn check(actor: &Actor, requirement: Requirement, owner: Option<&str>) -> Result<(), Denial> {
    if requirement == Anyone {
        return Ok(());
    }

    let Some(principal) = actor.principal() else {
        return Err(Denial::Unauthenticated);
    };

    if satisfies(principal, requirement, owner) {
        Ok(())
    } else {
        Err(Denial::PermissionDenied)
    }
}

fn satisfies(principal: &Principal, requirement: Requirement, owner: Option<&str>) -> bool {
    match requirement {
        Anyone | Authenticated => true,
        AdminOnly => principal.is_admin,
        RoleOrAdmin(role) => principal.is_admin || principal.role == role,
        OwnerOrAdmin => principal.is_admin || owner == Some(principal.username.as_str()),
    }
}

/// Checks the collection-level rule. Actions with no rule are refused.
pub fn permit_collection_action(
    actor: &Actor,
    resource: Resource,
    action: Action,
) -> Result<(), Denial> {
    match lookup(resource, action) {
        Some(rule) => check(actor, rule.collection, None),
        None => check(actor, AdminOnly, None).and(Err(Denial::PermissionDenied)),
    }
}

/// Checks both rules for one instance whose owning account is `owner`.
pub fn permit_instance_action(
    actor: &Actor,
    resource: Resource,
    action: Action,
    owner: &str,
) -> Result<(), Denial> {
    permit_collection_action(actor, resource, action)?;
    let rule = lookup(resource, action).ok_or(Denial::PermissionDenied)?;
    check(actor, rule.instance, Some(owner))
}
