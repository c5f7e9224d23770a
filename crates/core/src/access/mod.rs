//! Role-scoped visibility.
//!
//! Every aggregate downstream is computed only from sales that pass this
//! resolver, so the predicate runs before any summation or windowing.

pub mod names;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::directory::DirectoryLookup;
use crate::domain::employee::{DepartmentId, Employee, EmployeeDirectory, EmployeeRole};
use crate::domain::sale::ClientCode;
use self::names::same_person;

/// What the session is allowed to see, derived once from role + admin flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessScope {
    /// Admins and users with the global view-all permission.
    All,
    /// Department heads: clients owned by any manager of the department.
    Department(DepartmentId),
    /// Managers: only clients they own themselves.
    Own,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    pub user_id: String,
    pub employee: Option<Employee>,
    pub scope: AccessScope,
}

impl AccessContext {
    /// Derive the session scope. `is_admin` comes from the auth layer and
    /// wins over the employee role.
    pub fn derive(user_id: impl Into<String>, employee: Option<Employee>, is_admin: bool) -> Self {
        let scope = if is_admin {
            AccessScope::All
        } else {
            match &employee {
                Some(emp) => match (emp.role, emp.department.clone()) {
                    (EmployeeRole::Admin, _) => AccessScope::All,
                    (EmployeeRole::Head, Some(department)) => AccessScope::Department(department),
                    _ => AccessScope::Own,
                },
                None => AccessScope::Own,
            }
        };

        Self { user_id: user_id.into(), employee, scope }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), employee: None, scope: AccessScope::All }
    }

    fn employee_name(&self) -> Option<&str> {
        self.employee.as_ref().map(|employee| employee.name.as_str())
    }
}

/// Policy for clients the directory does not know about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Match against the sale's own `manager_name`. Availability over
    /// strictness: the legacy behavior, and the default.
    #[default]
    LegacyManagerName,
    /// A missing directory entry hides the client.
    Closed,
}

/// Visibility predicate for one analysis pass.
///
/// Pure with respect to its inputs; results are memoized per
/// `(client_code, manager_name)` because the same client appears once per
/// sale in the ledger. The memo lives in a `RefCell` — a pass is
/// single-threaded by contract.
pub struct AccessResolver<'a, D: DirectoryLookup> {
    context: &'a AccessContext,
    directory: &'a D,
    employees: &'a EmployeeDirectory,
    fallback: FallbackPolicy,
    memo: RefCell<HashMap<(ClientCode, String), bool>>,
    fallback_hits: Cell<u64>,
}

impl<'a, D: DirectoryLookup> AccessResolver<'a, D> {
    pub fn new(
        context: &'a AccessContext,
        directory: &'a D,
        employees: &'a EmployeeDirectory,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            context,
            directory,
            employees,
            fallback,
            memo: RefCell::new(HashMap::new()),
            fallback_hits: Cell::new(0),
        }
    }

    /// How many visibility decisions were made through the legacy
    /// name-based fallback in this pass. Surfaced so operators can see the
    /// directory-present and directory-absent paths disagreeing.
    pub fn fallback_resolutions(&self) -> u64 {
        self.fallback_hits.get()
    }

    pub fn is_visible(&self, client_code: &ClientCode, sale_manager_name: &str) -> bool {
        if matches!(self.context.scope, AccessScope::All) {
            return true;
        }

        let key = (client_code.clone(), sale_manager_name.to_string());
        if let Some(cached) = self.memo.borrow().get(&key) {
            return *cached;
        }

        let visible = self.resolve(client_code, sale_manager_name);
        self.memo.borrow_mut().insert(key, visible);
        visible
    }

    fn resolve(&self, client_code: &ClientCode, sale_manager_name: &str) -> bool {
        match self.directory.entry(client_code) {
            Some(entry) => self.owner_matches_scope(&entry.current_manager),
            None => match self.fallback {
                FallbackPolicy::Closed => false,
                FallbackPolicy::LegacyManagerName => {
                    self.fallback_hits.set(self.fallback_hits.get() + 1);
                    self.owner_matches_scope(sale_manager_name)
                }
            },
        }
    }

    fn owner_matches_scope(&self, owner_name: &str) -> bool {
        match &self.context.scope {
            AccessScope::All => true,
            AccessScope::Department(department) => {
                self.employees.department_of_manager(owner_name) == Some(department)
            }
            AccessScope::Own => self
                .context
                .employee_name()
                .is_some_and(|own_name| same_person(owner_name, own_name)),
        }
    }
}
