#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    /// Batch jobs and device sync services
    System = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            _ => None,
        }
    }

    /// May evaluate or recalculate attendance for anyone.
    pub fn can_evaluate(self) -> bool {
        matches!(self, Role::Admin | Role::Hr | Role::System)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_map_to_roles() {
        assert_eq!(Role::from_id(2), Some(Role::Hr));
        assert_eq!(Role::from_id(5), None);
        assert!(Role::System.can_evaluate());
        assert!(!Role::Employee.can_evaluate());
    }
}
