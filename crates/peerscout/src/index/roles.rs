use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::domain::PersonId;
use crate::snapshot::normalizer::email_key;
use crate::snapshot::{PersonRoleRow, PersonRow};

/// Role grants per person, resolvable by person id or e-mail address.
#[derive(Debug, Clone, Default)]
pub struct RoleIndex {
    roles_by_person_id: BTreeMap<PersonId, BTreeSet<String>>,
    person_ids_by_email: HashMap<String, BTreeSet<PersonId>>,
}

impl RoleIndex {
    pub fn from_rows(persons: &[PersonRow], roles: &[PersonRoleRow]) -> Self {
        let mut index = Self::default();

        for person in persons {
            if let Some(email) = person.email.as_deref() {
                let key = email_key(email);
                if !key.is_empty() {
                    index
                        .person_ids_by_email
                        .entry(key)
                        .or_default()
                        .insert(person.person_id.clone());
                }
            }
        }

        for row in roles {
            let role = row.role.trim();
            if role.is_empty() {
                continue;
            }
            index
                .roles_by_person_id
                .entry(row.person_id.clone())
                .or_default()
                .insert(role.to_string());
        }

        index
    }

    fn has_role(&self, person_id: &PersonId, role: &str) -> bool {
        self.roles_by_person_id
            .get(person_id)
            .map(|roles| roles.iter().any(|granted| granted.eq_ignore_ascii_case(role)))
            .unwrap_or(false)
    }

    pub fn user_has_role_by_email(&self, email: &str, role: &str) -> bool {
        self.person_ids_by_email
            .get(&email_key(email))
            .map(|person_ids| {
                person_ids
                    .iter()
                    .any(|person_id| self.has_role(person_id, role.trim()))
            })
            .unwrap_or(false)
    }

    pub fn get_user_roles_by_email(&self, email: &str) -> BTreeSet<String> {
        self.person_ids_by_email
            .get(&email_key(email))
            .into_iter()
            .flatten()
            .filter_map(|person_id| self.roles_by_person_id.get(person_id))
            .flat_map(|roles| roles.iter().cloned())
            .collect()
    }

    /// Keep only persons holding `role`; an absent or blank role filters nothing.
    pub fn filter_person_ids_by_role(
        &self,
        person_ids: BTreeSet<PersonId>,
        role: Option<&str>,
    ) -> BTreeSet<PersonId> {
        let role = match role.map(str::trim) {
            Some(role) if !role.is_empty() => role,
            _ => return person_ids,
        };

        person_ids
            .into_iter()
            .filter(|person_id| self.has_role(person_id, role))
            .collect()
    }
}
