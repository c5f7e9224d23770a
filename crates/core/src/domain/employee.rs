use serde::{Deserialize, Serialize};

use crate::access::names::same_person;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DepartmentId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Manager,
    Head,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    #[serde(default)]
    pub department: Option<DepartmentId>,
    pub role: EmployeeRole,
}

/// Read-only roster of managers, heads, and admins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeDirectory {
    employees: Vec<Employee>,
}

impl EmployeeDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.employees.iter()
    }

    pub fn find_by_id(&self, id: &EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|employee| &employee.id == id)
    }

    /// Token-set name match: ledger and directory sources disagree on word
    /// order and casing, so "Petrova Anna" finds "Anna Petrova".
    pub fn find_by_name(&self, name: &str) -> Option<&Employee> {
        self.employees.iter().find(|employee| same_person(&employee.name, name))
    }

    pub fn department_of_manager(&self, manager_name: &str) -> Option<&DepartmentId> {
        self.find_by_name(manager_name).and_then(|employee| employee.department.as_ref())
    }
}
